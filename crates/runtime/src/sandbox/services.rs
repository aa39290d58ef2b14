use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use damage_core::{AiModule, CollaboratorError, ImpulseRequest, PhysicsService, ReactionRequest};

/// Physics service that records every impulse it is asked to apply.
#[derive(Debug, Default)]
pub struct RecordingPhysics {
    impulses: Mutex<Vec<ImpulseRequest>>,
    unavailable: AtomicBool,
}

impl RecordingPhysics {
    /// While set, every request fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn impulses(&self) -> Vec<ImpulseRequest> {
        self.impulses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PhysicsService for RecordingPhysics {
    fn apply_impulse(&self, request: ImpulseRequest) -> Result<(), CollaboratorError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable);
        }
        self.impulses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(())
    }
}

/// AI module that records every reaction request.
#[derive(Debug, Default)]
pub struct RecordingAi {
    reactions: Mutex<Vec<ReactionRequest>>,
}

impl RecordingAi {
    pub fn reactions(&self) -> Vec<ReactionRequest> {
        self.reactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AiModule for RecordingAi {
    fn request_reaction(&self, request: ReactionRequest) -> Result<(), CollaboratorError> {
        self.reactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(())
    }
}
