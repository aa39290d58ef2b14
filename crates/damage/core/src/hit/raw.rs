use glam::Vec3;

use crate::tags::Tag;
use crate::types::ActorHandle;

/// The hit registrator that reported a hit and the source it belongs to,
/// e.g. registrator `"Blade"` on source `"RightHand"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitSource {
    pub source: String,
    pub registrator: String,
}

impl HitSource {
    pub fn new(source: impl Into<String>, registrator: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            registrator: registrator.into(),
        }
    }
}

/// A hit as reported by the physics layer, before any validation.
///
/// Overlap-style detections may carry no geometry at all.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RawHitResult {
    /// Actor owning the component that was hit.
    pub hit_actor: Option<ActorHandle>,
    pub location: Option<Vec3>,
    pub normal: Option<Vec3>,
    /// Travel direction of the sweep that produced the hit.
    pub direction: Option<Vec3>,
    /// Physical surface tag of the hit component (e.g. `"Surface.Flesh"`).
    pub surface: Option<Tag>,
    /// Registrator that detected the hit, when the host reports it.
    pub source: Option<HitSource>,
}

impl RawHitResult {
    pub fn on(actor: ActorHandle) -> Self {
        Self {
            hit_actor: Some(actor),
            ..Self::default()
        }
    }

    pub fn at(mut self, location: Vec3, normal: Vec3) -> Self {
        self.location = Some(location);
        self.normal = Some(normal);
        self
    }

    pub fn travelling(mut self, direction: Vec3) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn on_surface(mut self, surface: Tag) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn from_source(mut self, source: HitSource) -> Self {
        self.source = Some(source);
        self
    }

    pub(crate) fn is_finite(&self) -> bool {
        [self.location, self.normal, self.direction]
            .into_iter()
            .flatten()
            .all(Vec3::is_finite)
    }
}
