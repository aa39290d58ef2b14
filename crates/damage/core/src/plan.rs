//! Resolution plans and their lifecycle.

use std::sync::Arc;

use crate::error::{DamageError, ErrorSeverity};
use crate::event::DamageEvent;
use crate::rules::BehaviorRule;

/// Lifecycle of a resolution plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PlanState {
    #[default]
    Pending,
    Executing,
    Completed,
    Cancelled,
}

impl PlanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PlanState::Completed | PlanState::Cancelled)
    }

    pub fn can_transition_to(self, next: PlanState) -> bool {
        use PlanState::*;
        matches!(
            (self, next),
            (Pending, Executing) | (Pending, Cancelled) | (Executing, Completed) | (Executing, Cancelled)
        )
    }
}

/// Rejected lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("illegal plan transition {from} -> {to}")]
pub struct PlanStateError {
    pub from: PlanState,
    pub to: PlanState,
}

impl DamageError for PlanStateError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        "illegal_plan_transition"
    }
}

/// Outcome of matching one event against a rule table.
///
/// Created `Pending` by the matcher and advanced only by the executor.
#[derive(Clone, Debug)]
pub struct ResolutionPlan {
    pub event: DamageEvent,
    /// Matched rules in execution order.
    pub matched_rules: Vec<Arc<BehaviorRule>>,
    /// Event amount after every matched amount modifier.
    pub final_amount: f32,
    state: PlanState,
}

impl ResolutionPlan {
    pub fn new(event: DamageEvent, matched_rules: Vec<Arc<BehaviorRule>>, final_amount: f32) -> Self {
        Self {
            event,
            matched_rules,
            final_amount,
            state: PlanState::Pending,
        }
    }

    /// A plan with no rules that keeps the raw amount.
    pub fn unmatched(event: DamageEvent) -> Self {
        let amount = event.amount();
        Self::new(event, Vec::new(), amount)
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    pub fn is_empty(&self) -> bool {
        self.matched_rules.is_empty()
    }

    pub fn effect_count(&self) -> usize {
        self.matched_rules.iter().map(|rule| rule.effects.len()).sum()
    }

    pub fn transition(&mut self, next: PlanState) -> Result<(), PlanStateError> {
        if !self.state.can_transition_to(next) {
            return Err(PlanStateError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
