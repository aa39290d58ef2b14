//! Hierarchical gameplay tags.
//!
//! Tags mark actor state and capability (`"Status.Stunned"`), damage
//! categories (`"Damage.Fire"`), and hit circumstances (`"Hit.Critical"`).
//! Matching is hierarchical: a tag matches any of its ancestors, so
//! `"Damage.Fire.Dot"` satisfies a query for `"Damage.Fire"`.
//!
//! Resolution never reads live tag state while matching rules. The matcher
//! works on a [`TagSnapshot`] copied once per match call.
mod query;
mod set;
mod snapshot;
mod tag;

pub use query::TagQuery;
pub use set::TagSet;
pub use snapshot::TagSnapshot;
pub use tag::{Tag, TagError};
