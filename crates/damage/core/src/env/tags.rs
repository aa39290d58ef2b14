use crate::tags::{Tag, TagSet};
use crate::types::ActorHandle;

/// Live tag state of actors.
pub trait TagRegistry: Send + Sync {
    /// Current tags of `actor`, or `None` when the actor no longer exists.
    fn tags_of(&self, actor: ActorHandle) -> Option<TagSet>;

    /// Hierarchical membership test.
    fn has_tag(&self, actor: ActorHandle, tag: &Tag) -> bool {
        self.tags_of(actor).is_some_and(|tags| tags.has_tag(tag))
    }
}
