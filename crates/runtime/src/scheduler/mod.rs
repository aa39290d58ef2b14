//! Resolution scheduler.
//!
//! Owns one [`TargetResolutionSlot`] per target with work. Events for the
//! same target resolve strictly in submission order; different targets make
//! progress independently within the same tick. Every accepted event ends in
//! exactly one [`ResolutionOutcome`].
//!
//! The scheduler is a plain single-owner value. The runtime confines it to
//! the resolution worker task, so slot mutation never needs a lock.

mod slot;

pub use slot::{SlotReport, SlotStatus, Submission, TargetResolutionSlot};

use std::collections::BTreeMap;
use std::sync::Arc;

use damage_core::{
    ActorHandle, CancelReason, Collaborators, DamageError, DamageEvent, EngineConfig, EventId,
    ExecutionContext, ExecutionPoll, PlanExecution, ResolutionOutcome, ResolutionPlan, RuleTable,
    TagSnapshot, Tick, match_rules,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::SchedulingEvent;

/// Submissions the scheduler turns away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("resolution queue for {target} is full ({depth} events)")]
    QueueFull { target: ActorHandle, depth: usize },
}

/// How starting the next queued event went.
enum Start {
    Running(PlanExecution),
    Resolved(ResolutionOutcome),
}

pub struct ResolutionScheduler {
    collaborators: Collaborators,
    config: EngineConfig,
    rules: Arc<RuleTable>,
    staged_rules: Option<RuleTable>,
    rules_version: u64,
    slots: BTreeMap<ActorHandle, TargetResolutionSlot>,
    next_event_id: u64,
    now: Tick,
    notices: Vec<SchedulingEvent>,
}

impl ResolutionScheduler {
    pub fn new(collaborators: Collaborators, rules: RuleTable, config: EngineConfig) -> Self {
        let rules_version = rules.version().max(1);
        Self {
            collaborators,
            config,
            rules: Arc::new(rules.with_version(rules_version)),
            staged_rules: None,
            rules_version,
            slots: BTreeMap::new(),
            next_event_id: 1,
            now: Tick::ZERO,
            notices: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &Arc<RuleTable> {
        &self.rules
    }

    /// Tick of the most recent pass.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Queues `event` on its target's slot. Never blocks and never runs effects.
    pub fn submit(&mut self, event: DamageEvent) -> Result<EventId, SchedulerError> {
        let target = event.target();
        let limit = self.config.max_queue_per_target;
        let slot = self.slots.entry(target).or_default();

        if slot.pending() >= limit {
            warn!(
                target: "runtime::scheduler",
                actor = %target,
                depth = slot.pending(),
                "Resolution queue full, rejecting event"
            );
            let depth = slot.pending();
            if slot.is_finished() {
                self.slots.remove(&target);
            }
            self.notices.push(SchedulingEvent::Rejected { target, depth });
            return Err(SchedulerError::QueueFull { target, depth });
        }

        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        slot.queue.push_back(Submission { id, event });
        slot.status = SlotStatus::Draining;
        let depth = slot.depth();

        debug!(
            target: "runtime::scheduler",
            actor = %target,
            event = %id,
            depth,
            "Event queued"
        );
        self.notices.push(SchedulingEvent::Queued {
            event_id: id,
            target,
            depth,
        });
        Ok(id)
    }

    /// Runs one scheduling pass at `now` and returns every outcome it produced.
    ///
    /// A staged rule table is applied before any slot is touched. Slots are
    /// visited in handle order.
    pub fn tick(&mut self, now: Tick) -> Vec<ResolutionOutcome> {
        self.now = now;
        self.apply_staged_rules();

        let Self {
            collaborators,
            config,
            rules,
            slots,
            notices,
            ..
        } = self;
        let (collaborators, config, rules) = (&*collaborators, &*config, &**rules);
        let ctx = ExecutionContext::new(collaborators, config, now);
        let mut outcomes = Vec::new();

        for (&target, slot) in slots.iter_mut() {
            loop {
                if slot.current.is_none() {
                    let Some(submission) = slot.queue.pop_front() else {
                        break;
                    };
                    match start(submission, rules, collaborators, now) {
                        Start::Running(execution) => {
                            notices.push(SchedulingEvent::Started {
                                event_id: execution.event_id(),
                                target,
                                matched_rules: execution
                                    .plan()
                                    .matched_rules
                                    .iter()
                                    .map(|rule| rule.id.clone())
                                    .collect(),
                                final_amount: execution.plan().final_amount,
                                at: now,
                            });
                            slot.current = Some(execution);
                        }
                        Start::Resolved(outcome) => {
                            outcomes.push(outcome);
                            continue;
                        }
                    }
                }

                let Some(execution) = slot.current.as_mut() else {
                    break;
                };
                match execution.step(&ctx) {
                    ExecutionPoll::Pending => break,
                    ExecutionPoll::Ready(outcome) => {
                        slot.current = None;
                        log_outcome(&outcome);
                        outcomes.push(outcome);
                    }
                }
            }

            if slot.is_finished() && slot.status == SlotStatus::Draining {
                slot.status = SlotStatus::Idle;
                debug!(target: "runtime::scheduler", actor = %target, "Slot drained");
                notices.push(SchedulingEvent::Drained { target, at: now });
            }
        }

        slots.retain(|_, slot| !(slot.is_finished() && slot.status == SlotStatus::Idle));
        outcomes
    }

    /// Stages `table`; it takes effect at the start of the next tick.
    ///
    /// Plans already executing keep the rules they were matched with.
    pub fn replace_rules(&mut self, table: RuleTable) -> u64 {
        self.rules_version += 1;
        let version = self.rules_version;
        self.staged_rules = Some(table.with_version(version));
        version
    }

    pub fn slot_status(&self, target: ActorHandle) -> SlotStatus {
        self.slots
            .get(&target)
            .map(TargetResolutionSlot::status)
            .unwrap_or_default()
    }

    pub fn slot_report(&self, target: ActorHandle) -> SlotReport {
        self.slots
            .get(&target)
            .map(TargetResolutionSlot::report)
            .unwrap_or_default()
    }

    /// Events queued behind the executing plan of `target`.
    pub fn pending_for(&self, target: ActorHandle) -> usize {
        self.slots
            .get(&target)
            .map(TargetResolutionSlot::pending)
            .unwrap_or(0)
    }

    /// Targets with queued or executing work, in handle order.
    pub fn active_targets(&self) -> Vec<ActorHandle> {
        self.slots.keys().copied().collect()
    }

    /// Total queued plus executing events across all targets.
    pub fn total_depth(&self) -> usize {
        self.slots.values().map(TargetResolutionSlot::depth).sum()
    }

    /// Cancels everything in flight and queued, returning an outcome for each.
    pub fn flush(&mut self, reason: CancelReason) -> Vec<ResolutionOutcome> {
        let now = self.now;
        let mut outcomes = Vec::new();

        for (_, slot) in std::mem::take(&mut self.slots) {
            if let Some(execution) = slot.current {
                outcomes.push(execution.abort(reason, now));
            }
            for Submission { id, event } in slot.queue {
                let execution = PlanExecution::new(id, ResolutionPlan::unmatched(event), now);
                outcomes.push(execution.abort(reason, now));
            }
        }

        info!(
            target: "runtime::scheduler",
            reason = %reason,
            cancelled = outcomes.len(),
            "Scheduler flushed"
        );
        self.notices.push(SchedulingEvent::Flushed {
            reason,
            cancelled: outcomes.len(),
        });
        outcomes
    }

    /// Notifications accumulated since the last drain.
    pub fn drain_notices(&mut self) -> Vec<SchedulingEvent> {
        std::mem::take(&mut self.notices)
    }

    fn apply_staged_rules(&mut self) {
        let Some(table) = self.staged_rules.take() else {
            return;
        };
        info!(
            target: "runtime::scheduler",
            version = table.version(),
            rules = table.len(),
            "Rule table swapped"
        );
        self.notices.push(SchedulingEvent::RulesSwapped {
            version: table.version(),
            rules: table.len(),
            at: self.now,
        });
        self.rules = Arc::new(table);
    }
}

/// Snapshots the target's tags, matches rules, and creates the execution.
fn start(
    submission: Submission,
    rules: &RuleTable,
    collaborators: &Collaborators,
    now: Tick,
) -> Start {
    let Submission { id, event } = submission;
    let snapshot = TagSnapshot::capture(collaborators.tags(), event.target(), event.instigator());

    match snapshot {
        Some(snapshot) => {
            let plan = match_rules(event, rules, &snapshot);
            debug!(
                target: "runtime::scheduler",
                event = %id,
                rules = plan.matched_rules.len(),
                final_amount = plan.final_amount,
                "Plan matched"
            );
            Start::Running(PlanExecution::new(id, plan, now))
        }
        None => {
            debug!(target: "runtime::scheduler", event = %id, "Target gone before matching");
            let execution = PlanExecution::new(id, ResolutionPlan::unmatched(event), now);
            let outcome = execution.abort(CancelReason::TargetRemoved, now);
            log_outcome(&outcome);
            Start::Resolved(outcome)
        }
    }
}

fn log_outcome(outcome: &ResolutionOutcome) {
    for failure in &outcome.failures {
        warn!(
            target: "runtime::scheduler",
            event = %outcome.event_id,
            code = failure.error_code(),
            severity = failure.severity().as_str(),
            "{}", failure
        );
    }
    debug!(
        target: "runtime::scheduler",
        event = %outcome.event_id,
        actor = %outcome.target,
        state = %outcome.state,
        effects = outcome.effects.len(),
        "Event resolved"
    );
}

#[cfg(test)]
mod tests {
    use damage_core::{
        BehaviorRule, CancelReason, EffectRef, EffectSpec, EffectStatus, HitContextBuilder,
        HitRequest, PlanState, ResolutionFailure, RuleId, SkipReason, Tag, TagSet,
    };

    use super::*;
    use crate::sandbox::{AbilityScript, Sandbox};

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    fn sandbox(actors: &[u64]) -> Sandbox {
        let sandbox = Sandbox::new();
        for &actor in actors {
            sandbox.world.spawn(ActorHandle(actor), TagSet::new());
        }
        sandbox
    }

    fn event(sandbox: &Sandbox, target: u64, damage_type: &str, amount: f32) -> DamageEvent {
        HitContextBuilder::new(&*sandbox.world, Tick::ZERO)
            .build(HitRequest::new(damage_type, amount).with_target(ActorHandle(target)))
            .unwrap()
    }

    fn stagger_rules() -> RuleTable {
        RuleTable::new(vec![
            BehaviorRule::new("stagger")
                .for_damage_type(tag("Damage.Blunt"))
                .with_effect(EffectSpec::apply_effect(tag("Ability.Stagger")).awaiting()),
        ])
        .unwrap()
    }

    fn ids(outcomes: &[ResolutionOutcome]) -> Vec<u64> {
        outcomes.iter().map(|outcome| outcome.event_id.0).collect()
    }

    #[test]
    fn same_target_is_fifo_while_other_targets_progress() {
        let sandbox = sandbox(&[1, 2]);
        sandbox
            .abilities
            .script(tag("Ability.Stagger"), AbilityScript::SucceedAfter(1));
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), stagger_rules(), EngineConfig::default());

        let first = scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 10.0)).unwrap();
        let second = scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 5.0)).unwrap();
        let other = scheduler.submit(event(&sandbox, 2, "Damage.Fire", 3.0)).unwrap();

        assert_eq!(ids(&scheduler.tick(Tick(0))), vec![other.0]);
        let report = scheduler.slot_report(ActorHandle(1));
        assert_eq!(report.current, Some(first));
        assert_eq!(report.pending, 1);
        assert!(report.suspended);
        assert_eq!(scheduler.slot_status(ActorHandle(2)), SlotStatus::Idle);

        assert!(scheduler.tick(Tick(1)).is_empty());
        assert_eq!(ids(&scheduler.tick(Tick(2))), vec![first.0]);
        assert_eq!(scheduler.slot_report(ActorHandle(1)).current, Some(second));

        assert!(scheduler.tick(Tick(3)).is_empty());
        let outcomes = scheduler.tick(Tick(4));
        assert_eq!(ids(&outcomes), vec![second.0]);
        assert!(outcomes[0].is_completed());
        assert!(scheduler.active_targets().is_empty());
    }

    #[test]
    fn ward_granted_by_earlier_effect_blocks_later_effect() {
        let sandbox = sandbox(&[1]);
        sandbox
            .abilities
            .script(tag("Ability.Shield"), AbilityScript::Succeed);
        sandbox.abilities.grant_on_complete(
            tag("Ability.Shield"),
            TagSet::new().with(tag("Damage.Immune.Fire")),
        );
        let rules = RuleTable::new(vec![
            BehaviorRule::new("ward")
                .with_effect(EffectSpec::apply_effect(tag("Ability.Shield")).awaiting())
                .with_effect(
                    EffectSpec::apply_effect(tag("Effect.Burning")).blocked_by(tag("Damage.Immune")),
                ),
        ])
        .unwrap();
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), rules, EngineConfig::default());
        scheduler.submit(event(&sandbox, 1, "Damage.Fire", 10.0)).unwrap();

        assert!(scheduler.tick(Tick(0)).is_empty());
        let outcomes = scheduler.tick(Tick(1));
        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert_eq!(outcome.state, PlanState::Cancelled);
        assert_eq!(outcome.cancel_reason, Some(CancelReason::TargetImmune));
        assert_eq!(
            outcome
                .effects
                .iter()
                .map(|record| &record.status)
                .collect::<Vec<_>>(),
            [
                &EffectStatus::Completed,
                &EffectStatus::Skipped(SkipReason::PlanCancelled)
            ]
        );
        let activated: Vec<Tag> = sandbox
            .abilities
            .activations()
            .into_iter()
            .map(|record| record.effect)
            .collect();
        assert_eq!(activated, vec![tag("Ability.Shield")]);
    }

    #[test]
    fn fire_and_forget_failure_reaches_the_outcome() {
        let sandbox = sandbox(&[1]);
        sandbox.abilities.script(
            tag("Effect.Burning"),
            AbilityScript::FailAfter(0, "resisted".into()),
        );
        let rules = RuleTable::new(vec![
            BehaviorRule::new("ignite")
                .for_damage_type(tag("Damage.Fire"))
                .with_effect(EffectSpec::apply_effect(tag("Effect.Burning"))),
        ])
        .unwrap();
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), rules, EngineConfig::default());
        scheduler.submit(event(&sandbox, 1, "Damage.Fire", 10.0)).unwrap();

        let outcomes = scheduler.tick(Tick(0));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_completed());
        assert_eq!(
            outcomes[0].failures,
            vec![ResolutionFailure::EffectActivationFailed {
                at: EffectRef::new(RuleId::new("ignite"), 0),
                reason: "resisted".into(),
                critical: false,
            }]
        );
        assert_eq!(
            outcomes[0].status_of(&EffectRef::new(RuleId::new("ignite"), 0)),
            Some(&EffectStatus::Failed("resisted".into()))
        );
        assert_eq!(sandbox.abilities.in_flight(), 0);
    }

    #[test]
    fn swapped_rules_apply_from_next_tick_and_spare_in_flight_plans() {
        let sandbox = sandbox(&[1]);
        let doubling = RuleTable::new(vec![
            BehaviorRule::new("double")
                .with_effect(EffectSpec::multiply(2.0))
                .with_effect(EffectSpec::apply_effect(tag("Ability.Stagger")).awaiting()),
        ])
        .unwrap();
        let tripling =
            RuleTable::new(vec![BehaviorRule::new("triple").with_effect(EffectSpec::multiply(3.0))])
                .unwrap();
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), doubling, EngineConfig::default());

        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 10.0)).unwrap();
        assert!(scheduler.tick(Tick(0)).is_empty());

        let version = scheduler.replace_rules(tripling);
        assert_eq!(version, 2);
        assert_eq!(scheduler.rules().version(), 1);
        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 10.0)).unwrap();

        let outcomes = scheduler.tick(Tick(1));
        assert_eq!(scheduler.rules().version(), 2);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].matched_rules, vec![RuleId::new("double")]);
        assert_eq!(outcomes[0].final_amount, 20.0);
        assert_eq!(outcomes[1].matched_rules, vec![RuleId::new("triple")]);
        assert_eq!(outcomes[1].final_amount, 30.0);

        let notices = scheduler.drain_notices();
        assert!(notices.contains(&SchedulingEvent::RulesSwapped {
            version: 2,
            rules: 1,
            at: Tick(1),
        }));
    }

    #[test]
    fn full_queue_rejects_submissions() {
        let sandbox = sandbox(&[1]);
        let config = EngineConfig::default().with_max_queue_per_target(2);
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), RuleTable::empty(), config);

        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 1.0)).unwrap();
        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 1.0)).unwrap();
        let err = scheduler
            .submit(event(&sandbox, 1, "Damage.Blunt", 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            SchedulerError::QueueFull {
                target: ActorHandle(1),
                depth: 2
            }
        );
        assert_eq!(scheduler.pending_for(ActorHandle(1)), 2);
        assert_eq!(scheduler.tick(Tick(0)).len(), 2);
    }

    #[test]
    fn exhausted_retries_do_not_stall_the_queue() {
        let sandbox = sandbox(&[1]);
        sandbox
            .abilities
            .script(tag("Effect.Burning"), AbilityScript::UnreachableFor(2));
        let rules = RuleTable::new(vec![
            BehaviorRule::new("ignite").with_effect(EffectSpec::apply_effect(tag("Effect.Burning"))),
        ])
        .unwrap();
        let config = EngineConfig::default().with_max_effect_retries(1);
        let mut scheduler = ResolutionScheduler::new(sandbox.collaborators(), rules, config);

        scheduler.submit(event(&sandbox, 1, "Damage.Fire", 8.0)).unwrap();
        scheduler.submit(event(&sandbox, 1, "Damage.Fire", 8.0)).unwrap();

        assert!(scheduler.tick(Tick(0)).is_empty());
        let outcomes = scheduler.tick(Tick(1));
        assert_eq!(outcomes.len(), 2);

        assert!(outcomes[0].is_cancelled());
        assert_eq!(outcomes[0].cancel_reason, Some(CancelReason::EffectRuntimeUnavailable));
        assert_eq!(
            outcomes[0].failures,
            vec![ResolutionFailure::EffectRuntimeUnavailable {
                at: EffectRef::new("ignite".into(), 0),
                attempts: 2,
            }]
        );

        assert!(outcomes[1].is_completed());
        assert_eq!(
            outcomes[1].status_of(&EffectRef::new("ignite".into(), 0)),
            Some(&EffectStatus::Requested)
        );
    }

    #[test]
    fn target_removed_before_matching_is_cancelled() {
        let sandbox = sandbox(&[1]);
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), stagger_rules(), EngineConfig::default());

        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 4.0)).unwrap();
        sandbox.world.despawn(ActorHandle(1));

        let outcomes = scheduler.tick(Tick(0));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].cancel_reason, Some(CancelReason::TargetRemoved));
        assert!(outcomes[0].matched_rules.is_empty());
    }

    #[test]
    fn flush_cancels_running_and_queued_events() {
        let sandbox = sandbox(&[1]);
        sandbox
            .abilities
            .script(tag("Ability.Stagger"), AbilityScript::SucceedAfter(10));
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), stagger_rules(), EngineConfig::default());

        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 4.0)).unwrap();
        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 4.0)).unwrap();
        scheduler.tick(Tick(0));

        let outcomes = scheduler.flush(CancelReason::Shutdown);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|outcome| outcome.state == PlanState::Cancelled));
        assert!(
            outcomes
                .iter()
                .all(|outcome| outcome.cancel_reason == Some(CancelReason::Shutdown))
        );
        assert_eq!(
            outcomes[0].status_of(&EffectRef::new("stagger".into(), 0)),
            Some(&EffectStatus::Requested)
        );
        assert_eq!(scheduler.total_depth(), 0);
        assert!(
            scheduler
                .drain_notices()
                .contains(&SchedulingEvent::Flushed {
                    reason: CancelReason::Shutdown,
                    cancelled: 2,
                })
        );
    }

    #[test]
    fn drained_slot_is_reported_once() {
        let sandbox = sandbox(&[1]);
        let mut scheduler =
            ResolutionScheduler::new(sandbox.collaborators(), RuleTable::empty(), EngineConfig::default());

        scheduler.submit(event(&sandbox, 1, "Damage.Blunt", 4.0)).unwrap();
        scheduler.tick(Tick(3));
        scheduler.tick(Tick(4));

        let drained: Vec<_> = scheduler
            .drain_notices()
            .into_iter()
            .filter(|notice| matches!(notice, SchedulingEvent::Drained { .. }))
            .collect();
        assert_eq!(
            drained,
            vec![SchedulingEvent::Drained {
                target: ActorHandle(1),
                at: Tick(3),
            }]
        );
    }
}
