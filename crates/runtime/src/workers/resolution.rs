//! Resolution worker that owns the authoritative [`ResolutionScheduler`].
//!
//! Receives commands from [`RuntimeHandle`](crate::api::RuntimeHandle),
//! drives scheduling passes, and publishes outcomes and scheduling notices
//! to the [`EventBus`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use damage_core::{
    ActorHandle, CancelReason, DamageEvent, EventId, ResolutionOutcome, RuleTable, Tick,
};

use super::metrics::ResolutionMetrics;
use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, ResolutionEvent};
use crate::scheduler::{ResolutionScheduler, SlotReport};

/// Commands that can be sent to the resolution worker
pub enum Command {
    /// Queue an event. `outcome_tx` receives its outcome once resolved.
    Submit {
        event: DamageEvent,
        outcome_tx: oneshot::Sender<ResolutionOutcome>,
        reply: oneshot::Sender<Result<EventId>>,
    },
    /// Run one scheduling pass at `now`.
    Advance {
        now: Tick,
        reply: oneshot::Sender<Vec<ResolutionOutcome>>,
    },
    /// Stage a rule table for the next pass. Replies with its version.
    ReplaceRules {
        table: RuleTable,
        reply: oneshot::Sender<u64>,
    },
    /// Read-only view of one target's slot.
    QuerySlot {
        target: ActorHandle,
        reply: oneshot::Sender<SlotReport>,
    },
    /// Cancel everything queued and in flight, then stop.
    Shutdown {
        reply: oneshot::Sender<Vec<ResolutionOutcome>>,
    },
}

/// Background task that processes resolution commands.
pub struct ResolutionWorker {
    scheduler: ResolutionScheduler,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    metrics: Arc<ResolutionMetrics>,
    waiters: HashMap<EventId, oneshot::Sender<ResolutionOutcome>>,
}

impl ResolutionWorker {
    pub fn new(
        scheduler: ResolutionScheduler,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        metrics: Arc<ResolutionMetrics>,
    ) -> Self {
        info!(
            target: "runtime::worker",
            rules = scheduler.rules().len(),
            version = scheduler.rules().version(),
            "ResolutionWorker initialized"
        );

        Self {
            scheduler,
            command_rx,
            event_bus,
            metrics,
            waiters: HashMap::new(),
        }
    }

    /// Main worker loop.
    ///
    /// Exits on [`Command::Shutdown`] or once every handle is dropped. Work
    /// still pending at that point is cancelled with
    /// [`CancelReason::Shutdown`].
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if !self.handle_command(cmd) {
                        return;
                    }
                }
                else => break,
            }
        }

        let outcomes = self.scheduler.flush(CancelReason::Shutdown);
        self.publish(outcomes);
    }

    /// Returns false when the worker should stop.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Submit {
                event,
                outcome_tx,
                reply,
            } => {
                let result = self.submit(event, outcome_tx);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Submit reply channel closed (caller dropped)");
                }
            }
            Command::Advance { now, reply } => {
                let outcomes = self.scheduler.tick(now);
                let outcomes = self.publish(outcomes);
                if reply.send(outcomes).is_err() {
                    debug!(target: "runtime::worker", "Advance reply channel closed (caller dropped)");
                }
            }
            Command::ReplaceRules { table, reply } => {
                let version = self.scheduler.replace_rules(table);
                debug!(target: "runtime::worker", version, "Rule table staged");
                if reply.send(version).is_err() {
                    debug!(target: "runtime::worker", "ReplaceRules reply channel closed (caller dropped)");
                }
            }
            Command::QuerySlot { target, reply } => {
                if reply.send(self.scheduler.slot_report(target)).is_err() {
                    debug!(target: "runtime::worker", "QuerySlot reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => {
                let outcomes = self.scheduler.flush(CancelReason::Shutdown);
                let outcomes = self.publish(outcomes);
                info!(
                    target: "runtime::worker",
                    cancelled = outcomes.len(),
                    "ResolutionWorker shutting down"
                );
                if reply.send(outcomes).is_err() {
                    debug!(target: "runtime::worker", "Shutdown reply channel closed (caller dropped)");
                }
                return false;
            }
        }
        true
    }

    fn submit(
        &mut self,
        event: DamageEvent,
        outcome_tx: oneshot::Sender<ResolutionOutcome>,
    ) -> Result<EventId> {
        let result = self.scheduler.submit(event);
        match &result {
            Ok(id) => {
                self.metrics.record_submitted();
                self.waiters.insert(*id, outcome_tx);
            }
            Err(_) => self.metrics.record_rejected(),
        }
        self.publish_notices();
        self.metrics.set_queue_depth(self.scheduler.total_depth() as u64);
        result.map_err(RuntimeError::from)
    }

    /// Publishes notices and outcomes, completes receipts, and updates
    /// metrics. Returns the outcomes unchanged.
    fn publish(&mut self, outcomes: Vec<ResolutionOutcome>) -> Vec<ResolutionOutcome> {
        self.publish_notices();

        for outcome in &outcomes {
            self.metrics.record_outcome(outcome);
            self.event_bus
                .publish(Event::Resolution(ResolutionEvent::Resolved(Box::new(
                    outcome.clone(),
                ))));

            match self.waiters.remove(&outcome.event_id) {
                Some(waiter) => {
                    if waiter.send(outcome.clone()).is_err() {
                        debug!(
                            target: "runtime::worker",
                            event = %outcome.event_id,
                            "Outcome receipt dropped before resolution"
                        );
                    }
                }
                None => warn!(
                    target: "runtime::worker",
                    event = %outcome.event_id,
                    "Resolved event has no receipt"
                ),
            }
        }

        self.metrics.set_queue_depth(self.scheduler.total_depth() as u64);
        outcomes
    }

    fn publish_notices(&mut self) {
        for notice in self.scheduler.drain_notices() {
            self.event_bus.publish(Event::Scheduling(notice));
        }
    }
}
