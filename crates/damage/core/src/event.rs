//! The immutable record of a single damage occurrence.

use glam::Vec3;

use crate::tags::{Tag, TagSet};
use crate::types::{ActorHandle, Tick};

/// One damage occurrence, as produced by [`crate::hit::HitContextBuilder`].
///
/// Events are never mutated after construction. Amended values (such as the
/// final amount after rule modifiers) live on the
/// [`crate::plan::ResolutionPlan`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DamageEvent {
    instigator: Option<ActorHandle>,
    target: ActorHandle,
    amount: f32,
    damage_type: Tag,
    context_tags: TagSet,
    hit_location: Option<Vec3>,
    hit_normal: Option<Vec3>,
    hit_direction: Option<Vec3>,
    timestamp: Tick,
}

impl DamageEvent {
    /// Crate-internal: validation happens in the hit context builder.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        instigator: Option<ActorHandle>,
        target: ActorHandle,
        amount: f32,
        damage_type: Tag,
        context_tags: TagSet,
        hit_location: Option<Vec3>,
        hit_normal: Option<Vec3>,
        hit_direction: Option<Vec3>,
        timestamp: Tick,
    ) -> Self {
        Self {
            instigator,
            target,
            amount,
            damage_type,
            context_tags,
            hit_location,
            hit_normal,
            hit_direction,
            timestamp,
        }
    }

    /// `None` for environmental damage.
    pub fn instigator(&self) -> Option<ActorHandle> {
        self.instigator
    }

    pub fn target(&self) -> ActorHandle {
        self.target
    }

    /// Raw amount before rule modifiers. Negative values heal.
    pub fn amount(&self) -> f32 {
        self.amount
    }

    pub fn damage_type(&self) -> &Tag {
        &self.damage_type
    }

    pub fn context_tags(&self) -> &TagSet {
        &self.context_tags
    }

    pub fn hit_location(&self) -> Option<Vec3> {
        self.hit_location
    }

    pub fn hit_normal(&self) -> Option<Vec3> {
        self.hit_normal
    }

    /// Normalized travel direction of the sweep that produced the hit.
    pub fn hit_direction(&self) -> Option<Vec3> {
        self.hit_direction
    }

    pub fn timestamp(&self) -> Tick {
        self.timestamp
    }

    /// Damage type followed by the context tags.
    pub fn all_tags(&self) -> TagSet {
        let mut tags = self.context_tags.clone();
        tags.insert(self.damage_type.clone());
        tags
    }
}
