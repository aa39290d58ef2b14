//! Worker tasks that back the runtime orchestration.
//!
//! The resolution worker owns the scheduler and is the only task that ever
//! touches per-target slots.

mod metrics;
mod resolution;

pub use metrics::{FailureCounts, MetricsSnapshot, ResolutionMetrics};
pub use resolution::{Command, ResolutionWorker};
