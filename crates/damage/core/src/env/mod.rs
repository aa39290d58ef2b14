//! Traits describing the host engine's live services.
//!
//! Collaborators answer questions about actors and tags and carry out the
//! side effects a resolution plan asks for. The [`Collaborators`] bundle
//! groups them so the executor and scheduler can reach everything without
//! coupling to concrete implementations.
mod ability;
mod actors;
mod ai;
mod error;
mod physics;
mod tags;

use std::fmt;
use std::sync::Arc;

pub use ability::{AbilityHandle, AbilityRuntime, AbilityStatus, EffectContext};
pub use actors::ActorDirectory;
pub use ai::{AiModule, ReactionRequest};
pub use error::CollaboratorError;
pub use physics::{ImpulseRequest, PhysicsService};
pub use tags::TagRegistry;

/// Shared handles to every collaborator the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    tags: Arc<dyn TagRegistry>,
    actors: Arc<dyn ActorDirectory>,
    abilities: Arc<dyn AbilityRuntime>,
    physics: Arc<dyn PhysicsService>,
    ai: Arc<dyn AiModule>,
}

impl Collaborators {
    pub fn new(
        tags: Arc<dyn TagRegistry>,
        actors: Arc<dyn ActorDirectory>,
        abilities: Arc<dyn AbilityRuntime>,
        physics: Arc<dyn PhysicsService>,
        ai: Arc<dyn AiModule>,
    ) -> Self {
        Self {
            tags,
            actors,
            abilities,
            physics,
            ai,
        }
    }

    pub fn tags(&self) -> &dyn TagRegistry {
        self.tags.as_ref()
    }

    pub fn actors(&self) -> &dyn ActorDirectory {
        self.actors.as_ref()
    }

    pub fn abilities(&self) -> &dyn AbilityRuntime {
        self.abilities.as_ref()
    }

    pub fn physics(&self) -> &dyn PhysicsService {
        self.physics.as_ref()
    }

    pub fn ai(&self) -> &dyn AiModule {
        self.ai.as_ref()
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
