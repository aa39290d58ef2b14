use std::fmt;

use super::CollaboratorError;
use crate::tags::{Tag, TagSet};
use crate::types::{ActorHandle, EventId};

/// Handle to an ability activation owned by the ability runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbilityHandle(pub u64);

impl fmt::Display for AbilityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ability#{}", self.0)
    }
}

/// Progress of an activated ability.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityStatus {
    Running,
    Completed,
    Failed(String),
}

/// What the ability runtime is told about the hit that triggered it.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectContext {
    pub event_id: EventId,
    pub instigator: Option<ActorHandle>,
    pub damage_type: Tag,
    pub context_tags: TagSet,
    pub amount: f32,
}

/// Gameplay ability / effect runtime.
pub trait AbilityRuntime: Send + Sync {
    /// Starts `effect` on `target`. Must not block.
    fn activate(
        &self,
        target: ActorHandle,
        effect: &Tag,
        context: &EffectContext,
    ) -> Result<AbilityHandle, CollaboratorError>;

    /// Polls an activation started by [`AbilityRuntime::activate`].
    fn status(&self, handle: AbilityHandle) -> Result<AbilityStatus, CollaboratorError>;
}
