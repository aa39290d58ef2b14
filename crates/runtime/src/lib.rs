//! Runtime orchestration for damage-behavior resolution.
//!
//! This crate wires the pure resolution logic of `damage-core` into a
//! tick-driven service. Hosts embed [`Runtime`] to submit damage events,
//! advance the clock, and subscribe to outcomes through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`scheduler`] serializes resolution per target
//! - [`sandbox`] provides in-memory collaborators for tools and tests
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod runtime;
pub mod sandbox;
pub mod scheduler;

mod workers;

pub use api::{OutcomeReceipt, Result, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, ResolutionEvent, SchedulingEvent, Topic};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use sandbox::{
    AbilityScript, ActivationRecord, InMemoryWorld, RecordingAi, RecordingPhysics, Sandbox,
    ScriptedAbilityRuntime,
};
pub use scheduler::{
    ResolutionScheduler, SchedulerError, SlotReport, SlotStatus, TargetResolutionSlot,
};
pub use workers::{FailureCounts, MetricsSnapshot, ResolutionMetrics};
