use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use damage_core::{
    AbilityHandle, AbilityRuntime, AbilityStatus, ActorHandle, CollaboratorError, EffectContext,
    EventId, Tag, TagSet,
};

use super::InMemoryWorld;

/// How the sandbox answers activations of one effect tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityScript {
    /// Completes on the first status poll.
    Succeed,
    /// Reports `Running` for this many polls, then completes.
    SucceedAfter(u32),
    /// Activation is refused.
    Reject(String),
    /// Reports `Running` for this many polls, then fails.
    FailAfter(u32, String),
    /// Every activation fails with `Unavailable`.
    Unreachable,
    /// The first `n` activations fail with `Unavailable`, later ones succeed.
    UnreachableFor(u32),
}

/// One accepted activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRecord {
    pub handle: AbilityHandle,
    pub target: ActorHandle,
    pub effect: Tag,
    pub event_id: EventId,
    pub amount: f32,
}

#[derive(Debug)]
struct Activation {
    target: ActorHandle,
    effect: Tag,
    polls_left: u32,
    failure: Option<String>,
}

#[derive(Debug, Default)]
struct AbilityState {
    scripts: BTreeMap<Tag, AbilityScript>,
    grants: BTreeMap<Tag, TagSet>,
    refusals: BTreeMap<Tag, u32>,
    running: BTreeMap<AbilityHandle, Activation>,
    log: Vec<ActivationRecord>,
}

/// Ability runtime driven by per-effect scripts.
///
/// Unscripted effects succeed immediately. When an activation completes,
/// any tags granted for its effect are added to the target in the world.
/// An activation is forgotten once its final status has been reported.
#[derive(Debug)]
pub struct ScriptedAbilityRuntime {
    world: Arc<InMemoryWorld>,
    next_handle: AtomicU64,
    state: Mutex<AbilityState>,
}

impl ScriptedAbilityRuntime {
    pub fn new(world: Arc<InMemoryWorld>) -> Self {
        Self {
            world,
            next_handle: AtomicU64::new(1),
            state: Mutex::new(AbilityState::default()),
        }
    }

    pub fn script(&self, effect: Tag, script: AbilityScript) {
        self.with_state(|state| {
            state.refusals.remove(&effect);
            state.scripts.insert(effect, script);
        });
    }

    /// Tags added to the target once an activation of `effect` completes.
    pub fn grant_on_complete(&self, effect: Tag, tags: TagSet) {
        self.with_state(|state| {
            state.grants.insert(effect, tags);
        });
    }

    pub fn activations(&self) -> Vec<ActivationRecord> {
        self.with_state(|state| state.log.clone())
    }

    /// Activations that have not reported a final status yet.
    pub fn in_flight(&self) -> usize {
        self.with_state(|state| state.running.len())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut AbilityState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl AbilityRuntime for ScriptedAbilityRuntime {
    fn activate(
        &self,
        target: ActorHandle,
        effect: &Tag,
        context: &EffectContext,
    ) -> Result<AbilityHandle, CollaboratorError> {
        let (polls_left, failure) = self.with_state(|state| {
            let script = state
                .scripts
                .get(effect)
                .cloned()
                .unwrap_or(AbilityScript::Succeed);
            match script {
                AbilityScript::Succeed => Ok((0, None)),
                AbilityScript::SucceedAfter(polls) => Ok((polls, None)),
                AbilityScript::FailAfter(polls, reason) => Ok((polls, Some(reason))),
                AbilityScript::Reject(reason) => Err(CollaboratorError::Rejected(reason)),
                AbilityScript::Unreachable => Err(CollaboratorError::Unavailable),
                AbilityScript::UnreachableFor(attempts) => {
                    let refused = state.refusals.entry(effect.clone()).or_insert(0);
                    if *refused < attempts {
                        *refused += 1;
                        Err(CollaboratorError::Unavailable)
                    } else {
                        Ok((0, None))
                    }
                }
            }
        })?;

        let handle = AbilityHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.with_state(|state| {
            state.running.insert(
                handle,
                Activation {
                    target,
                    effect: effect.clone(),
                    polls_left,
                    failure,
                },
            );
            state.log.push(ActivationRecord {
                handle,
                target,
                effect: effect.clone(),
                event_id: context.event_id,
                amount: context.amount,
            });
        });
        Ok(handle)
    }

    fn status(&self, handle: AbilityHandle) -> Result<AbilityStatus, CollaboratorError> {
        let (status, grant) = self.with_state(|state| -> Result<_, CollaboratorError> {
            let activation = state
                .running
                .get_mut(&handle)
                .ok_or_else(|| CollaboratorError::Rejected(format!("unknown {handle}")))?;
            if activation.polls_left > 0 {
                activation.polls_left -= 1;
                return Ok((AbilityStatus::Running, None));
            }
            let Some(activation) = state.running.remove(&handle) else {
                return Err(CollaboratorError::Rejected(format!("unknown {handle}")));
            };
            match activation.failure {
                Some(reason) => Ok((AbilityStatus::Failed(reason), None)),
                None => {
                    let grant = state
                        .grants
                        .get(&activation.effect)
                        .map(|tags| (activation.target, tags.clone()));
                    Ok((AbilityStatus::Completed, grant))
                }
            }
        })?;

        if let Some((target, tags)) = grant {
            self.world.grant(target, &tags);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use damage_core::TagRegistry;

    use super::*;

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    fn context() -> EffectContext {
        EffectContext {
            event_id: EventId(1),
            instigator: None,
            damage_type: tag("Damage.Blunt"),
            context_tags: TagSet::new(),
            amount: 4.0,
        }
    }

    #[test]
    fn completion_grants_tags_once() {
        let world = Arc::new(InMemoryWorld::new());
        world.spawn(ActorHandle(1), TagSet::new());
        let runtime = ScriptedAbilityRuntime::new(Arc::clone(&world));
        runtime.script(tag("Ability.Stagger"), AbilityScript::SucceedAfter(1));
        runtime.grant_on_complete(
            tag("Ability.Stagger"),
            TagSet::new().with(tag("Status.Staggered")),
        );

        let handle = runtime
            .activate(ActorHandle(1), &tag("Ability.Stagger"), &context())
            .unwrap();
        assert_eq!(runtime.status(handle), Ok(AbilityStatus::Running));
        assert_eq!(runtime.in_flight(), 1);
        assert_eq!(runtime.status(handle), Ok(AbilityStatus::Completed));
        assert_eq!(runtime.in_flight(), 0);
        assert!(world.has_tag(ActorHandle(1), &tag("Status.Staggered")));
        assert_eq!(runtime.activations()[0].amount, 4.0);
    }

    #[test]
    fn settled_activations_are_forgotten() {
        let runtime = ScriptedAbilityRuntime::new(Arc::new(InMemoryWorld::new()));
        runtime.script(tag("Effect.Burning"), AbilityScript::FailAfter(0, "resisted".into()));
        let burning = runtime
            .activate(ActorHandle(1), &tag("Effect.Burning"), &context())
            .unwrap();
        let slow = runtime
            .activate(ActorHandle(1), &tag("Effect.Slow"), &context())
            .unwrap();
        assert_eq!(runtime.in_flight(), 2);

        assert_eq!(
            runtime.status(burning),
            Ok(AbilityStatus::Failed("resisted".into()))
        );
        assert_eq!(runtime.status(slow), Ok(AbilityStatus::Completed));
        assert_eq!(runtime.in_flight(), 0);
        assert!(matches!(
            runtime.status(slow),
            Err(CollaboratorError::Rejected(_))
        ));
        assert_eq!(runtime.activations().len(), 2);
    }

    #[test]
    fn unreachable_for_recovers() {
        let runtime = ScriptedAbilityRuntime::new(Arc::new(InMemoryWorld::new()));
        runtime.script(tag("Effect.Poison"), AbilityScript::UnreachableFor(2));
        let effect = tag("Effect.Poison");

        assert_eq!(
            runtime.activate(ActorHandle(1), &effect, &context()),
            Err(CollaboratorError::Unavailable)
        );
        assert_eq!(
            runtime.activate(ActorHandle(1), &effect, &context()),
            Err(CollaboratorError::Unavailable)
        );
        assert!(runtime.activate(ActorHandle(1), &effect, &context()).is_ok());
    }

    #[test]
    fn unknown_handle_is_rejected() {
        let runtime = ScriptedAbilityRuntime::new(Arc::new(InMemoryWorld::new()));
        assert!(matches!(
            runtime.status(AbilityHandle(42)),
            Err(CollaboratorError::Rejected(_))
        ));
    }
}
