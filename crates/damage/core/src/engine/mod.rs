//! Effect execution pipeline.
//!
//! A [`PlanExecution`] drives one [`crate::plan::ResolutionPlan`] against the
//! host's collaborators. Execution is tick-driven: each call to
//! [`PlanExecution::step`] runs effects until the plan finishes or must
//! suspend, and suspension is an explicit cursor state resumed on a later
//! tick. Nothing here blocks.

mod executor;

pub use executor::PlanExecution;

use crate::config::EngineConfig;
use crate::env::Collaborators;
use crate::outcome::ResolutionOutcome;
use crate::types::Tick;

/// Everything a step may consult.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionContext<'a> {
    pub collaborators: &'a Collaborators,
    pub config: &'a EngineConfig,
    pub now: Tick,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(collaborators: &'a Collaborators, config: &'a EngineConfig, now: Tick) -> Self {
        Self {
            collaborators,
            config,
            now,
        }
    }
}

/// Result of one [`PlanExecution::step`].
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionPoll {
    /// Suspended; step again on a later tick.
    Pending,
    /// The plan reached `Completed` or `Cancelled`.
    Ready(ResolutionOutcome),
}

impl ExecutionPoll {
    pub fn is_pending(&self) -> bool {
        matches!(self, ExecutionPoll::Pending)
    }
}
