//! In-memory collaborators for tools, tests, and headless simulation.
//!
//! [`Sandbox`] bundles a scripted world (actors, attachments, tags), a
//! scripted ability runtime, and recording physics / AI services behind the
//! [`damage_core::env`] traits.

mod abilities;
mod services;
mod world;

pub use abilities::{AbilityScript, ActivationRecord, ScriptedAbilityRuntime};
pub use services::{RecordingAi, RecordingPhysics};
pub use world::InMemoryWorld;

use std::sync::Arc;

use damage_core::Collaborators;

/// Shared handles to every sandbox collaborator.
#[derive(Clone)]
pub struct Sandbox {
    pub world: Arc<InMemoryWorld>,
    pub abilities: Arc<ScriptedAbilityRuntime>,
    pub physics: Arc<RecordingPhysics>,
    pub ai: Arc<RecordingAi>,
}

impl Sandbox {
    pub fn new() -> Self {
        let world = Arc::new(InMemoryWorld::new());
        Self {
            abilities: Arc::new(ScriptedAbilityRuntime::new(Arc::clone(&world))),
            world,
            physics: Arc::new(RecordingPhysics::default()),
            ai: Arc::new(RecordingAi::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.world.clone(),
            self.world.clone(),
            self.abilities.clone(),
            self.physics.clone(),
            self.ai.clone(),
        )
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}
