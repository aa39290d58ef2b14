//! From raw physics hits to validated damage events.
//!
//! [`HitWindow`] filters the stream of raw hits a damage behavior produces
//! while it is active, and [`HitContextBuilder`] turns a surviving hit into
//! an immutable [`crate::event::DamageEvent`].
mod builder;
mod error;
mod raw;
mod window;

pub use builder::{HitContextBuilder, HitRequest, attachment_root};
pub use error::InvalidEventError;
pub use raw::{HitSource, RawHitResult};
pub use window::{HitDetection, HitWindow, SourceFilter};
