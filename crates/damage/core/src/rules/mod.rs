//! Behavior rules and the matcher that turns them into resolution plans.
//!
//! A [`RuleTable`] is authored as data (RON through `damage-content`, or in
//! code), validated once, and then shared read-only. The matcher filters it
//! against an event and a [`crate::tags::TagSnapshot`], orders the survivors,
//! and folds their amount modifiers into a [`crate::plan::ResolutionPlan`].
mod effect;
mod matcher;
mod rule;
mod table;

pub use effect::{AmountOp, EffectAction, EffectSpec, ImpulseDirection};
pub use matcher::{RuleMatcher, match_rules};
pub use rule::{BehaviorRule, RuleId, RulePreconditions};
pub use table::{RuleTable, RuleTableError};
