//! Data-driven rule tables and engine configuration.
//!
//! This crate reads designer-authored content from disk:
//! - Behavior rule tables (RON)
//! - Engine configuration (TOML)
//!
//! A default rule set ships embedded in the crate so tools and tests can run
//! without a data directory.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, RuleCatalog, RuleTableLoader};
