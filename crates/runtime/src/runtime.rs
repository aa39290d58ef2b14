//! High-level runtime orchestrator.
//!
//! The runtime owns the resolution worker, wires up the command channel and
//! event bus, and exposes a builder-based API for hosts to drive resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use damage_content::RuleTableLoader;
use damage_core::{Collaborators, EngineConfig, ResolutionOutcome, RuleTable};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::{Event, EventBus, Topic};
use crate::scheduler::ResolutionScheduler;
use crate::workers::{Command, ResolutionMetrics, ResolutionWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

/// Main runtime that orchestrates damage resolution
///
/// Runtime owns the worker; [`RuntimeHandle`] provides a cloneable façade
/// for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Subscribe to events from one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the runtime gracefully
    ///
    /// Everything still queued or executing is cancelled with
    /// [`CancelReason::Shutdown`](damage_core::CancelReason::Shutdown); the
    /// returned outcomes are also published and delivered to receipts.
    pub async fn shutdown(self) -> Result<Vec<ResolutionOutcome>> {
        let outcomes = self.handle.shutdown().await?;
        drop(self.handle);

        self.worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(outcomes)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    rules: Option<RuleTable>,
    rules_path: Option<PathBuf>,
    collaborators: Option<Collaborators>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            rules: None,
            rules_path: None,
            collaborators: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override only the engine configuration
    pub fn engine_config(mut self, engine: EngineConfig) -> Self {
        self.config.engine = engine;
        self
    }

    /// Set the initial rule table
    pub fn rules(mut self, table: RuleTable) -> Self {
        self.rules = Some(table);
        self.rules_path = None;
        self
    }

    /// Load the initial rule table from a RON file at build time
    pub fn rules_path(mut self, path: impl AsRef<Path>) -> Self {
        self.rules_path = Some(path.as_ref().to_path_buf());
        self.rules = None;
        self
    }

    /// Set required collaborators
    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = Some(collaborators);
        self
    }

    /// Build the runtime
    ///
    /// Without rules or a rules path the runtime starts with an empty table.
    pub async fn build(self) -> Result<Runtime> {
        let collaborators = self
            .collaborators
            .ok_or(RuntimeError::MissingCollaborators)?;

        let rules = match (self.rules, self.rules_path) {
            (Some(table), _) => table,
            (None, Some(path)) => {
                RuleTableLoader::load(&path).map_err(|err| RuntimeError::RuleLoad {
                    message: format!("{err:#}"),
                    path,
                })?
            }
            (None, None) => RuleTable::empty(),
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let metrics = Arc::new(ResolutionMetrics::new());

        let handle = RuntimeHandle::new(command_tx, event_bus.clone(), Arc::clone(&metrics));

        let scheduler = ResolutionScheduler::new(collaborators, rules, self.config.engine);
        let worker = ResolutionWorker::new(scheduler, command_rx, event_bus, metrics);

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}
