//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{ResolutionEvent, SchedulingEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Resolution outcomes
    Resolution,
    /// Queue and slot lifecycle
    Scheduling,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Resolution(ResolutionEvent),
    Scheduling(SchedulingEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Resolution(_) => Topic::Resolution,
            Event::Scheduling(_) => Topic::Scheduling,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Every topic gets its own broadcast channel up
/// front, so publishing never takes a lock. Publishing is best-effort.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<TopicChannels>,
}

struct TopicChannels {
    resolution: broadcast::Sender<Event>,
    scheduling: broadcast::Sender<Event>,
}

impl TopicChannels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Resolution => &self.resolution,
            Topic::Scheduling => &self.scheduling,
        }
    }
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(TopicChannels {
                resolution: broadcast::channel(capacity).0,
                scheduling: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
