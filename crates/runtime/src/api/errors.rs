//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, scheduling, and content loading
//! so clients can bubble them up with consistent context.
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::scheduler::SchedulerError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("resolution worker command channel closed")]
    CommandChannelClosed,

    #[error("resolution worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("resolution worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("runtime requires collaborators to be configured before building")]
    MissingCollaborators,

    #[error("failed to load rule table from {path}: {message}")]
    RuleLoad { path: PathBuf, message: String },
}
