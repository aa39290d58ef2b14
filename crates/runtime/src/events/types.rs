use serde::{Deserialize, Serialize};

use damage_core::{ActorHandle, CancelReason, EventId, ResolutionOutcome, RuleId, Tick};

/// Published once per resolved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResolutionEvent {
    Resolved(Box<ResolutionOutcome>),
}

impl ResolutionEvent {
    pub fn outcome(&self) -> &ResolutionOutcome {
        match self {
            ResolutionEvent::Resolved(outcome) => outcome,
        }
    }
}

/// Queue and slot lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchedulingEvent {
    /// An event joined its target's queue.
    Queued {
        event_id: EventId,
        target: ActorHandle,
        depth: usize,
    },
    /// A submission was turned away because the target's queue is full.
    Rejected { target: ActorHandle, depth: usize },
    /// Rules were matched and execution began.
    Started {
        event_id: EventId,
        target: ActorHandle,
        matched_rules: Vec<RuleId>,
        final_amount: f32,
        at: Tick,
    },
    /// The target's slot has no more work and went idle.
    Drained { target: ActorHandle, at: Tick },
    /// A staged rule table took effect.
    RulesSwapped { version: u64, rules: usize, at: Tick },
    /// Everything in flight was cancelled.
    Flushed {
        reason: CancelReason,
        cancelled: usize,
    },
}
