//! In-crate stubs for unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use glam::Vec3;

use crate::env::{
    AbilityHandle, AbilityRuntime, AbilityStatus, ActorDirectory, AiModule, CollaboratorError,
    Collaborators, EffectContext, ImpulseRequest, PhysicsService, ReactionRequest, TagRegistry,
};
use crate::event::DamageEvent;
use crate::tags::{Tag, TagSet};
use crate::types::{ActorHandle, Tick};

pub fn tag(s: &str) -> Tag {
    Tag::new(s).unwrap()
}

pub fn tags(list: &[&str]) -> TagSet {
    list.iter().map(|s| tag(s)).collect()
}

pub fn event(target: u64, damage_type: &str, amount: f32) -> DamageEvent {
    DamageEvent::from_parts(
        None,
        ActorHandle(target),
        amount,
        tag(damage_type),
        TagSet::new(),
        None,
        None,
        None,
        Tick::ZERO,
    )
}

pub fn event_with_geometry(target: u64, damage_type: &str, amount: f32) -> DamageEvent {
    DamageEvent::from_parts(
        Some(ActorHandle(500)),
        ActorHandle(target),
        amount,
        tag(damage_type),
        tags(&["Hit.Critical"]),
        Some(Vec3::ZERO),
        Some(Vec3::Y),
        Some(Vec3::NEG_Y),
        Tick::ZERO,
    )
}

#[derive(Default)]
pub struct StubDirectory {
    actors: BTreeSet<ActorHandle>,
    parents: Mutex<BTreeMap<ActorHandle, ActorHandle>>,
    refuse_attachment: bool,
}

impl StubDirectory {
    pub fn with_actors(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            actors: ids.into_iter().map(ActorHandle).collect(),
            ..Self::default()
        }
    }

    pub fn attach(mut self, child: u64, parent: u64) -> Self {
        self.parents
            .get_mut()
            .unwrap()
            .insert(ActorHandle(child), ActorHandle(parent));
        self
    }

    pub fn refusing_attachment(mut self) -> Self {
        self.refuse_attachment = true;
        self
    }
}

impl ActorDirectory for StubDirectory {
    fn is_valid(&self, actor: ActorHandle) -> bool {
        self.actors.contains(&actor)
    }

    fn attach_parent(&self, actor: ActorHandle) -> Option<ActorHandle> {
        self.parents.lock().unwrap().get(&actor).copied()
    }

    fn attached_actors(&self, actor: ActorHandle) -> Vec<ActorHandle> {
        self.parents
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, parent)| **parent == actor)
            .map(|(child, _)| *child)
            .collect()
    }

    fn request_attach(&self, actor: ActorHandle, parent: ActorHandle) -> Result<(), CollaboratorError> {
        if self.refuse_attachment {
            return Err(CollaboratorError::Rejected("welded".into()));
        }
        self.parents.lock().unwrap().insert(actor, parent);
        Ok(())
    }

    fn request_detach(&self, actor: ActorHandle) -> Result<(), CollaboratorError> {
        self.parents.lock().unwrap().remove(&actor);
        Ok(())
    }
}

#[derive(Default)]
pub struct StubRegistry {
    tags: Mutex<BTreeMap<ActorHandle, TagSet>>,
}

impl StubRegistry {
    pub fn set(&self, actor: u64, set: TagSet) {
        self.tags.lock().unwrap().insert(ActorHandle(actor), set);
    }

    pub fn remove(&self, actor: u64) {
        self.tags.lock().unwrap().remove(&ActorHandle(actor));
    }
}

impl TagRegistry for StubRegistry {
    fn tags_of(&self, actor: ActorHandle) -> Option<TagSet> {
        self.tags.lock().unwrap().get(&actor).cloned()
    }
}

/// Scripted ability outcome keyed by effect tag.
#[derive(Clone, Debug)]
pub enum AbilityScript {
    Instant,
    Running(u32),
    Reject,
    Unreachable,
    FailAfter(u32),
}

#[derive(Default)]
pub struct StubAbilities {
    scripts: Mutex<BTreeMap<String, AbilityScript>>,
    running: Mutex<BTreeMap<AbilityHandle, (u32, bool)>>,
    pub activations: Mutex<Vec<(ActorHandle, Tag)>>,
}

impl StubAbilities {
    pub fn script(&self, effect: &str, script: AbilityScript) {
        self.scripts.lock().unwrap().insert(effect.to_owned(), script);
    }
}

impl AbilityRuntime for StubAbilities {
    fn activate(
        &self,
        target: ActorHandle,
        effect: &Tag,
        _context: &EffectContext,
    ) -> Result<AbilityHandle, CollaboratorError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(effect.as_str())
            .cloned()
            .unwrap_or(AbilityScript::Instant);
        let mut running = self.running.lock().unwrap();
        let handle = AbilityHandle(running.len() as u64 + 1);
        match script {
            AbilityScript::Instant => {
                running.insert(handle, (0, false));
            }
            AbilityScript::Running(polls) => {
                running.insert(handle, (polls, false));
            }
            AbilityScript::FailAfter(polls) => {
                running.insert(handle, (polls, true));
            }
            AbilityScript::Reject => return Err(CollaboratorError::Rejected("denied".into())),
            AbilityScript::Unreachable => return Err(CollaboratorError::Unavailable),
        }
        self.activations.lock().unwrap().push((target, effect.clone()));
        Ok(handle)
    }

    fn status(&self, handle: AbilityHandle) -> Result<AbilityStatus, CollaboratorError> {
        let mut running = self.running.lock().unwrap();
        let entry = running
            .get_mut(&handle)
            .ok_or(CollaboratorError::Rejected("unknown handle".into()))?;
        if entry.0 > 0 {
            entry.0 -= 1;
            return Ok(AbilityStatus::Running);
        }
        if entry.1 {
            Ok(AbilityStatus::Failed("interrupted".into()))
        } else {
            Ok(AbilityStatus::Completed)
        }
    }
}

#[derive(Default)]
pub struct StubPhysics {
    pub impulses: Mutex<Vec<ImpulseRequest>>,
}

impl PhysicsService for StubPhysics {
    fn apply_impulse(&self, request: ImpulseRequest) -> Result<(), CollaboratorError> {
        self.impulses.lock().unwrap().push(request);
        Ok(())
    }
}

#[derive(Default)]
pub struct StubAi {
    pub reactions: Mutex<Vec<ReactionRequest>>,
}

impl AiModule for StubAi {
    fn request_reaction(&self, request: ReactionRequest) -> Result<(), CollaboratorError> {
        self.reactions.lock().unwrap().push(request);
        Ok(())
    }
}

/// Stubs plus the bundle that shares them.
pub struct StubWorld {
    pub registry: Arc<StubRegistry>,
    pub abilities: Arc<StubAbilities>,
    pub physics: Arc<StubPhysics>,
    pub ai: Arc<StubAi>,
    pub collaborators: Collaborators,
}

impl StubWorld {
    pub fn new() -> Self {
        let registry = Arc::new(StubRegistry::default());
        let abilities = Arc::new(StubAbilities::default());
        let physics = Arc::new(StubPhysics::default());
        let ai = Arc::new(StubAi::default());
        let collaborators = Collaborators::new(
            registry.clone(),
            Arc::new(StubDirectory::default()),
            abilities.clone(),
            physics.clone(),
            ai.clone(),
        );
        Self {
            registry,
            abilities,
            physics,
            ai,
            collaborators,
        }
    }
}
