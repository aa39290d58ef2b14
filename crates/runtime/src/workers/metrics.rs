//! Resolution metrics and statistics.
//!
//! Tracks how many events were accepted, how they ended, and how deep the
//! per-target queues got.

use std::sync::atomic::{AtomicU64, Ordering};

use damage_core::{ResolutionFailure, ResolutionOutcome};

/// Counters updated by the resolution worker.
///
/// Uses atomics for lock-free access across threads.
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    /// Events accepted by the scheduler
    submitted: AtomicU64,

    /// Events turned away by back-pressure
    rejected: AtomicU64,

    /// Outcomes that ended `Completed`
    completed: AtomicU64,

    /// Outcomes that ended `Cancelled`
    cancelled: AtomicU64,

    runtime_unavailable: AtomicU64,
    activation_failed: AtomicU64,
    target_ineligible: AtomicU64,
    internal: AtomicU64,

    /// Queued plus executing events across all targets
    queue_depth: AtomicU64,

    /// Peak queue depth observed
    peak_queue_depth: AtomicU64,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts the final state and every failure of `outcome`.
    pub fn record_outcome(&self, outcome: &ResolutionOutcome) {
        if outcome.is_completed() {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cancelled.fetch_add(1, Ordering::Relaxed);
        }

        for failure in &outcome.failures {
            let counter = match failure {
                ResolutionFailure::EffectRuntimeUnavailable { .. } => &self.runtime_unavailable,
                ResolutionFailure::EffectActivationFailed { .. } => &self.activation_failed,
                ResolutionFailure::TargetIneligible { .. } => &self.target_ineligible,
                ResolutionFailure::IllegalTransition(_) => &self.internal,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Updates queue depth and tracks peak.
    pub fn set_queue_depth(&self, depth: u64) {
        self.queue_depth.store(depth, Ordering::Relaxed);

        let mut current_peak = self.peak_queue_depth.load(Ordering::Relaxed);
        while depth > current_peak {
            match self.peak_queue_depth.compare_exchange_weak(
                current_peak,
                depth,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_peak = actual,
            }
        }
    }

    /// Events accepted but not yet resolved.
    pub fn in_flight(&self) -> u64 {
        let resolved = self.completed.load(Ordering::Relaxed) + self.cancelled.load(Ordering::Relaxed);
        self.submitted.load(Ordering::Relaxed).saturating_sub(resolved)
    }

    /// Returns completion rate as a percentage (0-100).
    pub fn completion_rate(&self) -> f64 {
        let completed = self.completed.load(Ordering::Relaxed);
        let total = completed + self.cancelled.load(Ordering::Relaxed);

        if total == 0 {
            100.0
        } else {
            (completed as f64 / total as f64) * 100.0
        }
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Individual fields are read atomically; the snapshot as a whole may be
    /// inconsistent while the worker is updating.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            failures: FailureCounts {
                runtime_unavailable: self.runtime_unavailable.load(Ordering::Relaxed),
                activation_failed: self.activation_failed.load(Ordering::Relaxed),
                target_ineligible: self.target_ineligible.load(Ordering::Relaxed),
                internal: self.internal.load(Ordering::Relaxed),
            },
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
            peak_queue_depth: self.peak_queue_depth.load(Ordering::Relaxed),
            completion_rate: self.completion_rate(),
        }
    }
}

/// Failure counts keyed by [`ResolutionFailure`] variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureCounts {
    pub runtime_unavailable: u64,
    pub activation_failed: u64,
    pub target_ineligible: u64,
    pub internal: u64,
}

impl FailureCounts {
    pub fn total(&self) -> u64 {
        self.runtime_unavailable + self.activation_failed + self.target_ineligible + self.internal
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub rejected: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub failures: FailureCounts,
    pub queue_depth: u64,
    pub peak_queue_depth: u64,
    pub completion_rate: f64,
}

#[cfg(test)]
mod tests {
    use damage_core::{ActorHandle, CancelReason, EffectRef, EventId, PlanState, Tick};

    use super::*;

    fn outcome(state: PlanState, failures: Vec<ResolutionFailure>) -> ResolutionOutcome {
        ResolutionOutcome {
            event_id: EventId(1),
            target: ActorHandle(1),
            final_amount: 10.0,
            matched_rules: Vec::new(),
            state,
            effects: Vec::new(),
            failures,
            cancel_reason: (state == PlanState::Cancelled).then_some(CancelReason::TargetDead),
            started_at: Tick(0),
            finished_at: Tick(0),
        }
    }

    #[test]
    fn outcomes_are_counted_by_state_and_failure() {
        let metrics = ResolutionMetrics::new();
        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_outcome(&outcome(PlanState::Completed, Vec::new()));
        metrics.record_outcome(&outcome(
            PlanState::Cancelled,
            vec![ResolutionFailure::EffectRuntimeUnavailable {
                at: EffectRef::new("ignite".into(), 0),
                attempts: 4,
            }],
        ));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.cancelled, 1);
        assert_eq!(snapshot.failures.runtime_unavailable, 1);
        assert_eq!(snapshot.failures.total(), 1);
        assert_eq!(metrics.in_flight(), 1);
        assert_eq!(snapshot.completion_rate, 50.0);
    }

    #[test]
    fn peak_queue_depth_only_grows() {
        let metrics = ResolutionMetrics::new();
        metrics.set_queue_depth(5);
        metrics.set_queue_depth(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queue_depth, 2);
        assert_eq!(snapshot.peak_queue_depth, 5);
    }
}
