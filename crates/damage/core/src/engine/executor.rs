use glam::Vec3;

use super::{ExecutionContext, ExecutionPoll};
use crate::env::{
    AbilityHandle, AbilityStatus, CollaboratorError, EffectContext, ImpulseRequest,
    ReactionRequest,
};
use crate::event::DamageEvent;
use crate::outcome::{
    CancelReason, EffectKind, EffectRecord, EffectRef, EffectStatus, ResolutionFailure,
    ResolutionOutcome, SkipReason,
};
use crate::plan::{PlanState, ResolutionPlan};
use crate::rules::{EffectAction, EffectSpec, ImpulseDirection};
use crate::types::{EventId, Tick};

/// Where the executor stands on the current effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    /// About to run the effect at the current position.
    Ready,
    /// An awaited ability was activated at `since`.
    AwaitingAbility { handle: AbilityHandle, since: Tick },
    /// The collaborator was unreachable on `attempts` tries so far.
    Retrying { attempts: u32 },
}

/// A fire-and-forget ability whose final status has not been seen yet.
#[derive(Clone, Debug)]
struct Outstanding {
    at: EffectRef,
    handle: AbilityHandle,
    critical: bool,
    since: Tick,
    polled_at: Option<Tick>,
}

/// What running one effect led to.
enum StepResult {
    Advance(EffectStatus),
    /// Ability activated without awaiting; watched until it settles.
    Detached(AbilityHandle),
    /// Recorded as failed; the plan moves on.
    Continue {
        status: EffectStatus,
        failure: ResolutionFailure,
    },
    Suspend(Cursor),
    Cancel {
        status: EffectStatus,
        reason: CancelReason,
        failure: ResolutionFailure,
    },
}

/// Execution state of one plan.
#[derive(Debug)]
pub struct PlanExecution {
    event_id: EventId,
    plan: ResolutionPlan,
    cursor: Cursor,
    rule: usize,
    effect: usize,
    records: Vec<EffectRecord>,
    failures: Vec<ResolutionFailure>,
    outstanding: Vec<Outstanding>,
    cancel_reason: Option<CancelReason>,
    started_at: Tick,
}

impl PlanExecution {
    pub fn new(event_id: EventId, plan: ResolutionPlan, now: Tick) -> Self {
        let mut execution = Self {
            event_id,
            plan,
            cursor: Cursor::Ready,
            rule: 0,
            effect: 0,
            records: Vec::new(),
            failures: Vec::new(),
            outstanding: Vec::new(),
            cancel_reason: None,
            started_at: now,
        };
        execution.skip_empty_rules();
        execution
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn plan(&self) -> &ResolutionPlan {
        &self.plan
    }

    pub fn state(&self) -> PlanState {
        self.plan.state()
    }

    /// True while waiting on an ability or a retry, or while every effect
    /// has run but a fire-and-forget ability has not settled.
    pub fn is_suspended(&self) -> bool {
        self.cursor != Cursor::Ready
            || (self.current_ref().is_none() && !self.outstanding.is_empty())
    }

    /// Fire-and-forget abilities still being watched.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Runs effects until the plan finishes or must wait for a later tick.
    pub fn step(&mut self, ctx: &ExecutionContext<'_>) -> ExecutionPoll {
        if self.plan.state().is_terminal() {
            return ExecutionPoll::Ready(self.outcome(ctx.now));
        }
        if self.plan.state() == PlanState::Pending {
            self.enter(PlanState::Executing);
        }
        if let Some(reason) = self.observe_outstanding(ctx) {
            return ExecutionPoll::Ready(self.cancel(reason, ctx.now));
        }

        loop {
            let Some(at) = self.current_ref() else {
                if let Some(reason) = self.observe_outstanding(ctx) {
                    return ExecutionPoll::Ready(self.cancel(reason, ctx.now));
                }
                if !self.outstanding.is_empty() {
                    return ExecutionPoll::Pending;
                }
                self.enter(PlanState::Completed);
                return ExecutionPoll::Ready(self.outcome(ctx.now));
            };

            let result = match self.cursor {
                Cursor::AwaitingAbility { handle, since } => self.poll_ability(ctx, &at, handle, since),
                Cursor::Ready | Cursor::Retrying { .. } => match self.check_eligibility(ctx) {
                    Some(reason) => {
                        self.failures.push(ResolutionFailure::TargetIneligible {
                            at: Some(at),
                            reason,
                        });
                        return ExecutionPoll::Ready(self.cancel(reason, ctx.now));
                    }
                    None => self.run_effect(ctx, &at),
                },
            };

            match result {
                StepResult::Advance(status) => {
                    self.record(at, status);
                    self.cursor = Cursor::Ready;
                    self.advance();
                }
                StepResult::Detached(handle) => {
                    let critical = self.current_spec().is_some_and(|spec| spec.critical);
                    self.record(at.clone(), EffectStatus::Requested);
                    self.outstanding.push(Outstanding {
                        at,
                        handle,
                        critical,
                        since: ctx.now,
                        polled_at: None,
                    });
                    self.cursor = Cursor::Ready;
                    self.advance();
                }
                StepResult::Continue { status, failure } => {
                    self.record(at, status);
                    self.failures.push(failure);
                    self.cursor = Cursor::Ready;
                    self.advance();
                }
                StepResult::Suspend(cursor) => {
                    self.cursor = cursor;
                    return ExecutionPoll::Pending;
                }
                StepResult::Cancel {
                    status,
                    reason,
                    failure,
                } => {
                    self.record(at, status);
                    self.failures.push(failure);
                    self.cursor = Cursor::Ready;
                    self.advance();
                    return ExecutionPoll::Ready(self.cancel(reason, ctx.now));
                }
            }
        }
    }

    /// Cancels the plan between steps. Effects not yet run are skipped.
    ///
    /// Eligibility reasons also record a `TargetIneligible` failure.
    pub fn abort(mut self, reason: CancelReason, now: Tick) -> ResolutionOutcome {
        if self.plan.state().is_terminal() {
            return self.outcome(now);
        }
        if matches!(
            reason,
            CancelReason::TargetRemoved | CancelReason::TargetDead | CancelReason::TargetImmune
        ) {
            self.failures.push(ResolutionFailure::TargetIneligible {
                at: self.current_ref(),
                reason,
            });
        }
        self.cancel(reason, now)
    }

    fn run_effect(&self, ctx: &ExecutionContext<'_>, at: &EffectRef) -> StepResult {
        let Some(spec) = self.current_spec() else {
            return StepResult::Advance(EffectStatus::Skipped(SkipReason::PlanCancelled));
        };
        let event = &self.plan.event;
        let collaborators = ctx.collaborators;

        match &spec.action {
            EffectAction::ModifyAmount(_) => StepResult::Advance(EffectStatus::Applied),
            EffectAction::ApplyEffect {
                effect,
                await_completion,
            } => {
                let context = EffectContext {
                    event_id: self.event_id,
                    instigator: event.instigator(),
                    damage_type: event.damage_type().clone(),
                    context_tags: event.context_tags().clone(),
                    amount: self.plan.final_amount,
                };
                match collaborators
                    .abilities()
                    .activate(event.target(), effect, &context)
                {
                    Ok(handle) if *await_completion => StepResult::Suspend(Cursor::AwaitingAbility {
                        handle,
                        since: ctx.now,
                    }),
                    Ok(handle) => StepResult::Detached(handle),
                    Err(err) => self.collaborator_failed(ctx, spec, at, err),
                }
            }
            EffectAction::ApplyImpulse {
                strength,
                scale_with_amount,
                direction,
            } => {
                let Some((location, direction)) = impulse_geometry(event, *direction) else {
                    return StepResult::Advance(EffectStatus::Skipped(SkipReason::NoHitGeometry));
                };
                let magnitude = if *scale_with_amount {
                    strength * self.plan.final_amount.abs()
                } else {
                    *strength
                };
                let request = ImpulseRequest {
                    target: event.target(),
                    location,
                    direction,
                    magnitude,
                };
                match collaborators.physics().apply_impulse(request) {
                    Ok(()) => StepResult::Advance(EffectStatus::Requested),
                    Err(err) => self.collaborator_failed(ctx, spec, at, err),
                }
            }
            EffectAction::RequestReaction { reaction } => {
                let request = ReactionRequest {
                    actor: event.target(),
                    reaction: reaction.clone(),
                    instigator: event.instigator(),
                    context: event.all_tags(),
                };
                match collaborators.ai().request_reaction(request) {
                    Ok(()) => StepResult::Advance(EffectStatus::Requested),
                    Err(err) => self.collaborator_failed(ctx, spec, at, err),
                }
            }
        }
    }

    fn poll_ability(
        &self,
        ctx: &ExecutionContext<'_>,
        at: &EffectRef,
        handle: AbilityHandle,
        since: Tick,
    ) -> StepResult {
        let critical = self.current_spec().is_some_and(|spec| spec.critical);
        match ctx.collaborators.abilities().status(handle) {
            Ok(AbilityStatus::Completed) => return StepResult::Advance(EffectStatus::Completed),
            Ok(AbilityStatus::Failed(reason)) => return activation_failed(at, reason, critical),
            Err(CollaboratorError::Rejected(reason)) => return activation_failed(at, reason, critical),
            Ok(AbilityStatus::Running) | Err(CollaboratorError::Unavailable) => {}
        }

        if ctx.now.since(since) > ctx.config.ability_ack_timeout_ticks {
            return StepResult::Cancel {
                status: EffectStatus::Failed("ability acknowledgement timed out".into()),
                reason: CancelReason::EffectRuntimeUnavailable,
                failure: ResolutionFailure::EffectRuntimeUnavailable {
                    at: at.clone(),
                    attempts: 1,
                },
            };
        }
        StepResult::Suspend(Cursor::AwaitingAbility { handle, since })
    }

    /// Polls every fire-and-forget ability once per tick.
    ///
    /// Failures rewrite the effect's record and attach a failure. Returns a
    /// cancel reason when a critical one failed or never settled in time.
    fn observe_outstanding(&mut self, ctx: &ExecutionContext<'_>) -> Option<CancelReason> {
        let mut cancel = None;
        for mut entry in std::mem::take(&mut self.outstanding) {
            if cancel.is_some() || entry.polled_at == Some(ctx.now) {
                self.outstanding.push(entry);
                continue;
            }
            entry.polled_at = Some(ctx.now);

            let reason = match ctx.collaborators.abilities().status(entry.handle) {
                Ok(AbilityStatus::Completed) => continue,
                Ok(AbilityStatus::Failed(reason)) | Err(CollaboratorError::Rejected(reason)) => {
                    self.failures.push(ResolutionFailure::EffectActivationFailed {
                        at: entry.at.clone(),
                        reason: reason.clone(),
                        critical: entry.critical,
                    });
                    self.set_status(&entry.at, EffectStatus::Failed(reason));
                    CancelReason::CriticalEffectFailed
                }
                Ok(AbilityStatus::Running) | Err(CollaboratorError::Unavailable) => {
                    if ctx.now.since(entry.since) <= ctx.config.ability_ack_timeout_ticks {
                        self.outstanding.push(entry);
                        continue;
                    }
                    self.failures.push(ResolutionFailure::EffectRuntimeUnavailable {
                        at: entry.at.clone(),
                        attempts: 1,
                    });
                    self.set_status(
                        &entry.at,
                        EffectStatus::Failed("ability acknowledgement timed out".into()),
                    );
                    CancelReason::EffectRuntimeUnavailable
                }
            };
            if entry.critical {
                cancel = Some(reason);
            }
        }
        cancel
    }

    fn collaborator_failed(
        &self,
        ctx: &ExecutionContext<'_>,
        spec: &EffectSpec,
        at: &EffectRef,
        err: CollaboratorError,
    ) -> StepResult {
        match err {
            CollaboratorError::Rejected(reason) => activation_failed(at, reason, spec.critical),
            CollaboratorError::Unavailable => {
                let attempts = match self.cursor {
                    Cursor::Retrying { attempts } => attempts + 1,
                    _ => 1,
                };
                if attempts > ctx.config.max_effect_retries {
                    StepResult::Cancel {
                        status: EffectStatus::Failed(err.to_string()),
                        reason: CancelReason::EffectRuntimeUnavailable,
                        failure: ResolutionFailure::EffectRuntimeUnavailable {
                            at: at.clone(),
                            attempts,
                        },
                    }
                } else {
                    StepResult::Suspend(Cursor::Retrying { attempts })
                }
            }
        }
    }

    /// Live check of the target before an effect runs.
    fn check_eligibility(&self, ctx: &ExecutionContext<'_>) -> Option<CancelReason> {
        let Some(tags) = ctx.collaborators.tags().tags_of(self.plan.event.target()) else {
            return Some(CancelReason::TargetRemoved);
        };
        if tags.has_any(&ctx.config.ineligible_tags) {
            return Some(CancelReason::TargetDead);
        }
        let query = &self.current_spec()?.eligibility;
        (!query.matches(&tags)).then_some(CancelReason::TargetImmune)
    }

    fn cancel(&mut self, reason: CancelReason, now: Tick) -> ResolutionOutcome {
        if let (Cursor::AwaitingAbility { .. }, Some(at)) = (self.cursor, self.current_ref()) {
            self.record(at, EffectStatus::Requested);
            self.advance();
        }
        self.outstanding.clear();
        while let Some(at) = self.current_ref() {
            self.record(at, EffectStatus::Skipped(SkipReason::PlanCancelled));
            self.advance();
        }
        self.cancel_reason = Some(reason);
        self.cursor = Cursor::Ready;
        self.enter(PlanState::Cancelled);
        self.outcome(now)
    }

    fn outcome(&self, now: Tick) -> ResolutionOutcome {
        ResolutionOutcome {
            event_id: self.event_id,
            target: self.plan.event.target(),
            final_amount: self.plan.final_amount,
            matched_rules: self
                .plan
                .matched_rules
                .iter()
                .map(|rule| rule.id.clone())
                .collect(),
            state: self.plan.state(),
            effects: self.records.clone(),
            failures: self.failures.clone(),
            cancel_reason: self.cancel_reason,
            started_at: self.started_at,
            finished_at: now,
        }
    }

    /// A refused transition is attached to the outcome as an internal failure.
    fn enter(&mut self, next: PlanState) {
        if let Err(err) = self.plan.transition(next) {
            self.failures.push(err.into());
        }
    }

    fn set_status(&mut self, at: &EffectRef, status: EffectStatus) {
        if let Some(record) = self.records.iter_mut().find(|record| &record.at == at) {
            record.status = status;
        }
    }

    fn record(&mut self, at: EffectRef, status: EffectStatus) {
        let kind = self
            .current_spec()
            .map(|spec| EffectKind::from(&spec.action))
            .unwrap_or(EffectKind::ModifyAmount);
        self.records.push(EffectRecord { at, kind, status });
    }

    fn current_spec(&self) -> Option<&EffectSpec> {
        self.plan.matched_rules.get(self.rule)?.effects.get(self.effect)
    }

    fn current_ref(&self) -> Option<EffectRef> {
        let rule = self.plan.matched_rules.get(self.rule)?;
        (self.effect < rule.effects.len()).then(|| EffectRef::new(rule.id.clone(), self.effect))
    }

    fn advance(&mut self) {
        self.effect += 1;
        self.skip_empty_rules();
    }

    fn skip_empty_rules(&mut self) {
        while let Some(rule) = self.plan.matched_rules.get(self.rule) {
            if self.effect < rule.effects.len() {
                break;
            }
            self.rule += 1;
            self.effect = 0;
        }
    }
}

fn activation_failed(at: &EffectRef, reason: String, critical: bool) -> StepResult {
    let failure = ResolutionFailure::EffectActivationFailed {
        at: at.clone(),
        reason: reason.clone(),
        critical,
    };
    let status = EffectStatus::Failed(reason);
    if critical {
        StepResult::Cancel {
            status,
            reason: CancelReason::CriticalEffectFailed,
            failure,
        }
    } else {
        StepResult::Continue { status, failure }
    }
}

/// Location and unit push direction for an impulse, if the hit has them.
fn impulse_geometry(event: &DamageEvent, direction: ImpulseDirection) -> Option<(Vec3, Vec3)> {
    let location = event.hit_location()?;
    let direction = match direction {
        ImpulseDirection::AlongNormal => event.hit_normal()?,
        ImpulseDirection::AgainstNormal => -event.hit_normal()?,
        ImpulseDirection::Travel => event.hit_direction()?,
    };
    Some((location, direction.try_normalize()?))
}
