//! Deterministic damage-behavior resolution logic shared across hosts.
//!
//! `damage-core` turns a raw damage occurrence into an ordered, rule-driven
//! consequence and drives that consequence against the host's collaborators.
//! Everything here is pure and tick-driven; the runtime crate owns threads,
//! channels, and logging.
//!
//! Modules are organized leaf-first:
//! - [`tags`] hierarchical tags, sets, queries, and snapshots
//! - [`env`] collaborator traits implemented by the host engine
//! - [`hit`] hit context builder and per-activation hit windows
//! - [`rules`] behavior rules, rule tables, and the rule matcher
//! - [`plan`] resolution plans and their lifecycle
//! - [`engine`] the effect executor state machine
//! - [`outcome`] observable records of every resolved event
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod event;
pub mod hit;
pub mod outcome;
pub mod plan;
pub mod rules;
pub mod tags;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine::{ExecutionContext, ExecutionPoll, PlanExecution};
pub use env::{
    AbilityHandle, AbilityRuntime, AbilityStatus, ActorDirectory, AiModule, CollaboratorError,
    Collaborators, EffectContext, ImpulseRequest, PhysicsService, ReactionRequest, TagRegistry,
};
pub use error::{DamageError, ErrorSeverity};
pub use event::DamageEvent;
pub use hit::{
    HitContextBuilder, HitDetection, HitRequest, HitSource, HitWindow, InvalidEventError,
    RawHitResult, SourceFilter, attachment_root,
};
pub use outcome::{
    CancelReason, EffectKind, EffectRecord, EffectRef, EffectStatus, ResolutionFailure,
    ResolutionOutcome, SkipReason,
};
pub use plan::{PlanState, PlanStateError, ResolutionPlan};
pub use rules::{
    AmountOp, BehaviorRule, EffectAction, EffectSpec, ImpulseDirection, RuleId, RuleMatcher,
    RulePreconditions, RuleTable, RuleTableError, match_rules,
};
pub use tags::{Tag, TagError, TagQuery, TagSet, TagSnapshot};
pub use types::{ActorHandle, EventId, Tick};

pub use glam::Vec3;
