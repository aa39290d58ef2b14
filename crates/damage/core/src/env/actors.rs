use super::CollaboratorError;
use crate::types::ActorHandle;

/// Actor lifetime and attachment hierarchy.
pub trait ActorDirectory: Send + Sync {
    /// Whether `actor` still refers to a live actor.
    fn is_valid(&self, actor: ActorHandle) -> bool;

    /// The actor `actor` is attached to, if any.
    fn attach_parent(&self, actor: ActorHandle) -> Option<ActorHandle>;

    /// Actors directly attached to `actor`.
    fn attached_actors(&self, actor: ActorHandle) -> Vec<ActorHandle>;

    /// Asks the host to attach `actor` to `parent`, keeping its world transform.
    ///
    /// Hosts without runtime attachment reject every request.
    fn request_attach(
        &self,
        actor: ActorHandle,
        parent: ActorHandle,
    ) -> Result<(), CollaboratorError> {
        let _ = (actor, parent);
        Err(CollaboratorError::Rejected("attachment not supported".into()))
    }

    /// Asks the host to detach `actor` from its parent.
    fn request_detach(&self, actor: ActorHandle) -> Result<(), CollaboratorError> {
        let _ = actor;
        Err(CollaboratorError::Rejected("attachment not supported".into()))
    }
}
