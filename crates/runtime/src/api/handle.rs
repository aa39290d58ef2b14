//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! submitting events, advancing the clock, and streaming events from
//! specific topics.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use damage_core::{ActorHandle, DamageEvent, EventId, ResolutionOutcome, RuleTable, Tick};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::scheduler::{SlotReport, SlotStatus};
use crate::workers::{Command, MetricsSnapshot, ResolutionMetrics};

/// Pending outcome of a submitted event.
#[derive(Debug)]
pub struct OutcomeReceipt {
    event_id: EventId,
    rx: oneshot::Receiver<ResolutionOutcome>,
}

impl OutcomeReceipt {
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Waits until the event's plan completes or is cancelled.
    ///
    /// Resolution only progresses through [`RuntimeHandle::advance`], so
    /// something else must keep ticking the runtime while this is awaited.
    pub async fn outcome(self) -> Result<ResolutionOutcome> {
        self.rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    metrics: Arc<ResolutionMetrics>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        metrics: Arc<ResolutionMetrics>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            metrics,
        }
    }

    /// Queue a damage event on its target's slot.
    ///
    /// Fails with [`RuntimeError::Scheduler`] when the target's queue is full.
    pub async fn submit(&self, event: DamageEvent) -> Result<OutcomeReceipt> {
        let (outcome_tx, rx) = oneshot::channel();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Submit {
                event,
                outcome_tx,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        let event_id = reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)??;
        Ok(OutcomeReceipt { event_id, rx })
    }

    /// Run one scheduling pass at `now` and return the outcomes it produced.
    pub async fn advance(&self, now: Tick) -> Result<Vec<ResolutionOutcome>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Advance {
                now,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Stage a new rule table. It takes effect at the next [`advance`](Self::advance).
    pub async fn replace_rules(&self, table: RuleTable) -> Result<u64> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::ReplaceRules {
                table,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Query one target's slot (read-only snapshot)
    pub async fn slot_report(&self, target: ActorHandle) -> Result<SlotReport> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::QuerySlot {
                target,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub async fn slot_status(&self, target: ActorHandle) -> Result<SlotStatus> {
        Ok(self.slot_report(target).await?.status)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Resolution` - one event per resolved damage event
    /// - `Topic::Scheduling` - queue, start, drain, and rule swap notices
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use damage_runtime::Topic;
    ///
    /// let mut outcomes = handle.subscribe(Topic::Resolution);
    /// while let Ok(event) = outcomes.recv().await {
    ///     // Handle resolution outcomes
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub(crate) async fn shutdown(&self) -> Result<Vec<ResolutionOutcome>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}
