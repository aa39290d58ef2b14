use super::TagSet;
use crate::env::TagRegistry;
use crate::types::ActorHandle;

/// Tags of the target and instigator copied at one instant.
///
/// The matcher evaluates every rule against the same snapshot, so a tag
/// change in the middle of a match can never split the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagSnapshot {
    pub target: TagSet,
    /// Empty for environmental damage.
    pub instigator: TagSet,
}

impl TagSnapshot {
    pub fn new(target: TagSet, instigator: TagSet) -> Self {
        Self { target, instigator }
    }

    /// Reads both actors' tags from the registry.
    ///
    /// Returns `None` when the target no longer exists. A vanished instigator
    /// is treated like environmental damage.
    pub fn capture<R>(
        registry: &R,
        target: ActorHandle,
        instigator: Option<ActorHandle>,
    ) -> Option<Self>
    where
        R: TagRegistry + ?Sized,
    {
        let target = registry.tags_of(target)?;
        let instigator = instigator
            .and_then(|actor| registry.tags_of(actor))
            .unwrap_or_default();
        Some(Self { target, instigator })
    }
}
