use super::CollaboratorError;
use crate::tags::{Tag, TagSet};
use crate::types::ActorHandle;

/// Reaction the AI module is asked to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionRequest {
    pub actor: ActorHandle,
    pub reaction: Tag,
    pub instigator: Option<ActorHandle>,
    /// Damage type plus the event's context tags.
    pub context: TagSet,
}

/// AI module. Requests are fire-and-forget.
pub trait AiModule: Send + Sync {
    fn request_reaction(&self, request: ReactionRequest) -> Result<(), CollaboratorError>;
}
