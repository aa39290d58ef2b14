//! Observable records of resolved events.
//!
//! Every submitted event ends in exactly one [`ResolutionOutcome`], whether
//! its plan completed or was cancelled. Failures are attached to the outcome
//! rather than raised across the scheduling loop.

use std::fmt;

use crate::error::{DamageError, ErrorSeverity};
use crate::plan::{PlanState, PlanStateError};
use crate::rules::{EffectAction, RuleId};
use crate::types::{ActorHandle, EventId, Tick};

/// Position of an effect inside a plan: the owning rule and its index there.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRef {
    pub rule: RuleId,
    pub index: usize,
}

impl EffectRef {
    pub fn new(rule: RuleId, index: usize) -> Self {
        Self { rule, index }
    }
}

impl fmt::Display for EffectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.rule, self.index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EffectKind {
    ModifyAmount,
    ApplyEffect,
    ApplyImpulse,
    RequestReaction,
}

impl From<&EffectAction> for EffectKind {
    fn from(action: &EffectAction) -> Self {
        match action {
            EffectAction::ModifyAmount(_) => EffectKind::ModifyAmount,
            EffectAction::ApplyEffect { .. } => EffectKind::ApplyEffect,
            EffectAction::ApplyImpulse { .. } => EffectKind::ApplyImpulse,
            EffectAction::RequestReaction { .. } => EffectKind::RequestReaction,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Impulse without a hit location or direction.
    NoHitGeometry,
    /// The plan was cancelled before this step ran.
    PlanCancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectStatus {
    /// Took effect synchronously.
    Applied,
    /// Handed to a collaborator without waiting. A fire-and-forget ability
    /// that later fails is rewritten to `Failed`.
    Requested,
    /// Awaited to completion.
    Completed,
    Failed(String),
    Skipped(SkipReason),
}

/// What happened to one effect step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRecord {
    pub at: EffectRef,
    pub kind: EffectKind,
    pub status: EffectStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CancelReason {
    TargetRemoved,
    TargetDead,
    TargetImmune,
    CriticalEffectFailed,
    EffectRuntimeUnavailable,
    Shutdown,
}

/// Failure attached to an outcome.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolutionFailure {
    #[error("effect runtime unavailable at {at} after {attempts} attempts")]
    EffectRuntimeUnavailable { at: EffectRef, attempts: u32 },

    #[error("effect {at} failed: {reason}")]
    EffectActivationFailed {
        at: EffectRef,
        reason: String,
        critical: bool,
    },

    #[error("target ineligible ({reason})")]
    TargetIneligible {
        at: Option<EffectRef>,
        reason: CancelReason,
    },

    /// The executor tried a lifecycle transition the plan refused.
    #[error(transparent)]
    IllegalTransition(#[from] PlanStateError),
}

impl ResolutionFailure {
    pub fn kind(&self) -> &'static str {
        self.error_code()
    }
}

impl DamageError for ResolutionFailure {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ResolutionFailure::EffectRuntimeUnavailable { .. } => ErrorSeverity::Recoverable,
            ResolutionFailure::EffectActivationFailed { .. } => ErrorSeverity::Validation,
            ResolutionFailure::TargetIneligible { .. } => ErrorSeverity::Validation,
            ResolutionFailure::IllegalTransition(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ResolutionFailure::EffectRuntimeUnavailable { .. } => "effect_runtime_unavailable",
            ResolutionFailure::EffectActivationFailed { .. } => "effect_activation_failed",
            ResolutionFailure::TargetIneligible { .. } => "target_ineligible",
            ResolutionFailure::IllegalTransition(err) => err.error_code(),
        }
    }
}

/// Final record of one resolved event.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionOutcome {
    pub event_id: EventId,
    pub target: ActorHandle,
    pub final_amount: f32,
    pub matched_rules: Vec<RuleId>,
    /// `Completed` or `Cancelled`.
    pub state: PlanState,
    pub effects: Vec<EffectRecord>,
    pub failures: Vec<ResolutionFailure>,
    pub cancel_reason: Option<CancelReason>,
    pub started_at: Tick,
    pub finished_at: Tick,
}

impl ResolutionOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == PlanState::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == PlanState::Cancelled
    }

    pub fn status_of(&self, at: &EffectRef) -> Option<&EffectStatus> {
        self.effects
            .iter()
            .find(|record| &record.at == at)
            .map(|record| &record.status)
    }
}
