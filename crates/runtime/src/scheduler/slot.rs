//! Per-target resolution slot.

use std::collections::VecDeque;

use damage_core::{DamageEvent, EventId, PlanExecution};

/// An accepted event waiting for, or undergoing, resolution.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: EventId,
    pub event: DamageEvent,
}

/// Whether a slot has work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    #[default]
    Idle,
    Draining,
}

/// Serializes resolution of every event aimed at one target.
///
/// At most one plan executes per slot; the rest wait in FIFO order.
#[derive(Debug, Default)]
pub struct TargetResolutionSlot {
    pub(crate) current: Option<PlanExecution>,
    pub(crate) queue: VecDeque<Submission>,
    pub(crate) status: SlotStatus,
}

impl TargetResolutionSlot {
    pub fn status(&self) -> SlotStatus {
        self.status
    }

    /// Events waiting behind the current plan.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queued plus executing.
    pub fn depth(&self) -> usize {
        self.queue.len() + usize::from(self.current.is_some())
    }

    pub fn current_event(&self) -> Option<EventId> {
        self.current.as_ref().map(PlanExecution::event_id)
    }

    pub fn is_suspended(&self) -> bool {
        self.current.as_ref().is_some_and(PlanExecution::is_suspended)
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    pub fn report(&self) -> SlotReport {
        SlotReport {
            status: self.status,
            pending: self.pending(),
            current: self.current_event(),
            suspended: self.is_suspended(),
        }
    }
}

/// Point-in-time view of a slot for introspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotReport {
    pub status: SlotStatus,
    pub pending: usize,
    pub current: Option<EventId>,
    pub suspended: bool,
}
