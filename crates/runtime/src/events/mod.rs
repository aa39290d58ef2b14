//! Topic-based event bus for runtime events.
//!
//! Outcomes are published on [`Topic::Resolution`]; queue and slot
//! lifecycle notifications on [`Topic::Scheduling`]. Consumers subscribe
//! only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{ResolutionEvent, SchedulingEvent};
