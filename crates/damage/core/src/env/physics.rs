use glam::Vec3;

use super::CollaboratorError;
use crate::types::ActorHandle;

/// Impulse to apply at a world location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpulseRequest {
    pub target: ActorHandle,
    pub location: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    pub magnitude: f32,
}

impl ImpulseRequest {
    pub fn impulse(&self) -> Vec3 {
        self.direction * self.magnitude
    }
}

/// Physics layer. Requests are fire-and-forget.
pub trait PhysicsService: Send + Sync {
    fn apply_impulse(&self, request: ImpulseRequest) -> Result<(), CollaboratorError>;
}
