use std::collections::BTreeSet;

use super::{InvalidEventError, RawHitResult};
use crate::env::ActorDirectory;
use crate::event::DamageEvent;
use crate::tags::{Tag, TagSet};
use crate::types::{ActorHandle, Tick};

/// Attachment chains deeper than this are treated as cyclic and cut short.
const MAX_ATTACHMENT_DEPTH: usize = 32;

/// Walks `attach_parent` links up to the top-most actor.
///
/// A weapon attached to a character resolves to the character; an actor
/// with no parent resolves to itself.
pub fn attachment_root<D>(directory: &D, actor: ActorHandle) -> ActorHandle
where
    D: ActorDirectory + ?Sized,
{
    let mut current = actor;
    let mut seen = BTreeSet::from([actor]);
    for _ in 0..MAX_ATTACHMENT_DEPTH {
        match directory.attach_parent(current) {
            Some(parent) if seen.insert(parent) => current = parent,
            _ => break,
        }
    }
    current
}

/// Everything needed to describe one hit, prior to validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitRequest {
    pub raw: RawHitResult,
    pub instigator: Option<ActorHandle>,
    /// Explicit target. When absent the raw hit actor's attachment root is used.
    pub target: Option<ActorHandle>,
    pub damage_type: String,
    pub amount: f32,
    pub context_tags: TagSet,
}

impl HitRequest {
    pub fn new(damage_type: impl Into<String>, amount: f32) -> Self {
        Self {
            damage_type: damage_type.into(),
            amount,
            ..Self::default()
        }
    }

    pub fn with_raw(mut self, raw: RawHitResult) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_instigator(mut self, instigator: ActorHandle) -> Self {
        self.instigator = Some(instigator);
        self
    }

    pub fn with_target(mut self, target: ActorHandle) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.context_tags.insert(tag);
        self
    }

    pub fn with_context_tags(mut self, tags: TagSet) -> Self {
        self.context_tags.extend_from(&tags);
        self
    }
}

/// Validates hits and stamps them with the current tick.
///
/// Reads the directory only; building an event has no side effects.
#[derive(Clone, Copy, Debug)]
pub struct HitContextBuilder<'a, D>
where
    D: ActorDirectory + ?Sized,
{
    directory: &'a D,
    clock: Tick,
}

impl<'a, D> HitContextBuilder<'a, D>
where
    D: ActorDirectory + ?Sized,
{
    pub fn new(directory: &'a D, clock: Tick) -> Self {
        Self { directory, clock }
    }

    pub fn build(&self, request: HitRequest) -> Result<DamageEvent, InvalidEventError> {
        let HitRequest {
            raw,
            instigator,
            target,
            damage_type,
            amount,
            mut context_tags,
        } = request;

        if !amount.is_finite() {
            return Err(InvalidEventError::NonFiniteAmount);
        }
        if damage_type.is_empty() {
            return Err(InvalidEventError::EmptyDamageType);
        }
        let damage_type = Tag::new(damage_type)?;
        if !raw.is_finite() {
            return Err(InvalidEventError::NonFiniteHitGeometry);
        }

        let target = target
            .or_else(|| {
                raw.hit_actor
                    .map(|actor| attachment_root(self.directory, actor))
            })
            .ok_or(InvalidEventError::MissingTarget)?;
        if !self.directory.is_valid(target) {
            return Err(InvalidEventError::InvalidTarget(target));
        }

        if let Some(surface) = raw.surface {
            context_tags.insert(surface);
        }
        let hit_direction = raw.direction.and_then(|direction| direction.try_normalize());

        Ok(DamageEvent::from_parts(
            instigator,
            target,
            amount,
            damage_type,
            context_tags,
            raw.location,
            raw.normal,
            hit_direction,
            self.clock,
        ))
    }

    /// Positional form of [`HitContextBuilder::build`].
    pub fn build_event(
        &self,
        raw: &RawHitResult,
        instigator: Option<ActorHandle>,
        target: Option<ActorHandle>,
        damage_type: &str,
        amount: f32,
        extra_context_tags: &TagSet,
    ) -> Result<DamageEvent, InvalidEventError> {
        self.build(HitRequest {
            raw: raw.clone(),
            instigator,
            target,
            damage_type: damage_type.to_owned(),
            amount,
            context_tags: extra_context_tags.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::testing::StubDirectory;

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    #[test]
    fn builds_event_with_clock_and_context() {
        let directory = StubDirectory::with_actors([1, 2]);
        let builder = HitContextBuilder::new(&directory, Tick(7));
        let event = builder
            .build(
                HitRequest::new("Damage.Fire", 10.0)
                    .with_target(ActorHandle(1))
                    .with_instigator(ActorHandle(2))
                    .with_tag(tag("Hit.Critical")),
            )
            .unwrap();

        assert_eq!(event.target(), ActorHandle(1));
        assert_eq!(event.instigator(), Some(ActorHandle(2)));
        assert_eq!(event.damage_type(), &tag("Damage.Fire"));
        assert!(event.context_tags().has_exact(&tag("Hit.Critical")));
        assert_eq!(event.timestamp(), Tick(7));
        assert_eq!(event.hit_location(), None);
    }

    #[test]
    fn rejects_invalid_input() {
        let directory = StubDirectory::with_actors([1]);
        let builder = HitContextBuilder::new(&directory, Tick::ZERO);
        let base = HitRequest::new("Damage.Fire", 1.0).with_target(ActorHandle(1));

        let nan = HitRequest {
            amount: f32::NAN,
            ..base.clone()
        };
        assert_eq!(builder.build(nan), Err(InvalidEventError::NonFiniteAmount));

        let empty = HitRequest {
            damage_type: String::new(),
            ..base.clone()
        };
        assert_eq!(builder.build(empty), Err(InvalidEventError::EmptyDamageType));

        let malformed = HitRequest {
            damage_type: "Damage..Fire".into(),
            ..base.clone()
        };
        assert!(matches!(
            builder.build(malformed),
            Err(InvalidEventError::InvalidTag(_))
        ));

        let untargeted = HitRequest::new("Damage.Fire", 1.0);
        assert_eq!(
            builder.build(untargeted),
            Err(InvalidEventError::MissingTarget)
        );

        let gone = base.clone().with_target(ActorHandle(99));
        assert_eq!(
            builder.build(gone),
            Err(InvalidEventError::InvalidTarget(ActorHandle(99)))
        );

        let bad_geometry = base.with_raw(
            RawHitResult::on(ActorHandle(1)).at(Vec3::new(f32::INFINITY, 0.0, 0.0), Vec3::Z),
        );
        assert_eq!(
            builder.build(bad_geometry),
            Err(InvalidEventError::NonFiniteHitGeometry)
        );
    }

    #[test]
    fn environmental_damage_has_no_instigator() {
        let directory = StubDirectory::with_actors([1]);
        let event = HitContextBuilder::new(&directory, Tick::ZERO)
            .build(HitRequest::new("Damage.Fall", 3.0).with_target(ActorHandle(1)))
            .unwrap();
        assert_eq!(event.instigator(), None);
    }

    #[test]
    fn raw_hit_on_attached_weapon_targets_its_owner() {
        let directory = StubDirectory::with_actors([1, 10]).attach(10, 1);
        let raw = RawHitResult::on(ActorHandle(10))
            .at(Vec3::new(1.0, 2.0, 3.0), Vec3::Y)
            .travelling(Vec3::new(0.0, 0.0, -4.0))
            .on_surface(tag("Surface.Metal"));

        let event = HitContextBuilder::new(&directory, Tick(1))
            .build_event(&raw, None, None, "Damage.Slash", 5.0, &TagSet::new())
            .unwrap();

        assert_eq!(event.target(), ActorHandle(1));
        assert!(event.context_tags().has_exact(&tag("Surface.Metal")));
        assert_eq!(event.hit_location(), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(event.hit_direction(), Some(Vec3::NEG_Z));
    }

    #[test]
    fn attachment_root_stops_on_cycles() {
        let directory = StubDirectory::with_actors([1, 2]).attach(1, 2).attach(2, 1);
        let root = attachment_root(&directory, ActorHandle(1));
        assert_eq!(root, ActorHandle(2));
    }
}
