use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use damage_core::{ActorDirectory, ActorHandle, CollaboratorError, Tag, TagRegistry, TagSet};

#[derive(Debug, Default)]
struct WorldState {
    tags: BTreeMap<ActorHandle, TagSet>,
    parents: BTreeMap<ActorHandle, ActorHandle>,
}

/// Actors, their tags, and their attachment hierarchy.
///
/// An actor exists from [`InMemoryWorld::spawn`] until
/// [`InMemoryWorld::despawn`].
#[derive(Debug, Default)]
pub struct InMemoryWorld {
    state: RwLock<WorldState>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, actor: ActorHandle, tags: TagSet) {
        self.write(|state| {
            state.tags.insert(actor, tags);
        });
    }

    /// Removes the actor and detaches everything attached to it.
    pub fn despawn(&self, actor: ActorHandle) {
        self.write(|state| {
            state.tags.remove(&actor);
            state.parents.remove(&actor);
            state.parents.retain(|_, parent| *parent != actor);
        });
    }

    pub fn attach(&self, child: ActorHandle, parent: ActorHandle) {
        self.write(|state| {
            state.parents.insert(child, parent);
        });
    }

    pub fn detach(&self, child: ActorHandle) {
        self.write(|state| {
            state.parents.remove(&child);
        });
    }

    /// Returns false when the actor does not exist.
    pub fn add_tag(&self, actor: ActorHandle, tag: Tag) -> bool {
        self.write(|state| match state.tags.get_mut(&actor) {
            Some(tags) => {
                tags.insert(tag);
                true
            }
            None => false,
        })
    }

    pub fn grant(&self, actor: ActorHandle, tags: &TagSet) -> bool {
        self.write(|state| match state.tags.get_mut(&actor) {
            Some(existing) => {
                existing.extend_from(tags);
                true
            }
            None => false,
        })
    }

    pub fn remove_tag(&self, actor: ActorHandle, tag: &Tag) -> bool {
        self.write(|state| {
            state
                .tags
                .get_mut(&actor)
                .is_some_and(|tags| tags.remove(tag))
        })
    }

    pub fn actors(&self) -> BTreeSet<ActorHandle> {
        self.read(|state| state.tags.keys().copied().collect())
    }

    fn read<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut WorldState) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl TagRegistry for InMemoryWorld {
    fn tags_of(&self, actor: ActorHandle) -> Option<TagSet> {
        self.read(|state| state.tags.get(&actor).cloned())
    }

    fn has_tag(&self, actor: ActorHandle, tag: &Tag) -> bool {
        self.read(|state| state.tags.get(&actor).is_some_and(|tags| tags.has_tag(tag)))
    }
}

impl ActorDirectory for InMemoryWorld {
    fn is_valid(&self, actor: ActorHandle) -> bool {
        self.read(|state| state.tags.contains_key(&actor))
    }

    fn attach_parent(&self, actor: ActorHandle) -> Option<ActorHandle> {
        self.read(|state| state.parents.get(&actor).copied())
    }

    fn attached_actors(&self, actor: ActorHandle) -> Vec<ActorHandle> {
        self.read(|state| {
            state
                .parents
                .iter()
                .filter(|(_, parent)| **parent == actor)
                .map(|(child, _)| *child)
                .collect()
        })
    }

    fn request_attach(
        &self,
        actor: ActorHandle,
        parent: ActorHandle,
    ) -> Result<(), CollaboratorError> {
        self.write(|state| {
            if !state.tags.contains_key(&actor) || !state.tags.contains_key(&parent) {
                return Err(CollaboratorError::Rejected(format!(
                    "cannot attach {actor} to {parent}"
                )));
            }
            state.parents.insert(actor, parent);
            Ok(())
        })
    }

    fn request_detach(&self, actor: ActorHandle) -> Result<(), CollaboratorError> {
        self.detach(actor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use damage_core::attachment_root;

    use super::*;

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    #[test]
    fn despawn_invalidates_and_detaches() {
        let world = InMemoryWorld::new();
        world.spawn(ActorHandle(1), TagSet::new());
        world.spawn(ActorHandle(2), TagSet::new());
        world.attach(ActorHandle(2), ActorHandle(1));
        assert_eq!(attachment_root(&world, ActorHandle(2)), ActorHandle(1));

        world.despawn(ActorHandle(1));
        assert!(!world.is_valid(ActorHandle(1)));
        assert!(world.tags_of(ActorHandle(1)).is_none());
        assert_eq!(world.attach_parent(ActorHandle(2)), None);
    }

    #[test]
    fn attach_requests_need_live_actors() {
        let world = InMemoryWorld::new();
        world.spawn(ActorHandle(1), TagSet::new());
        assert!(matches!(
            world.request_attach(ActorHandle(2), ActorHandle(1)),
            Err(CollaboratorError::Rejected(_))
        ));

        world.spawn(ActorHandle(2), TagSet::new());
        assert_eq!(world.request_attach(ActorHandle(2), ActorHandle(1)), Ok(()));
        assert_eq!(attachment_root(&world, ActorHandle(2)), ActorHandle(1));
        assert_eq!(world.request_detach(ActorHandle(2)), Ok(()));
        assert_eq!(world.attach_parent(ActorHandle(2)), None);
    }

    #[test]
    fn tag_edits_require_a_live_actor() {
        let world = InMemoryWorld::new();
        assert!(!world.add_tag(ActorHandle(1), tag("Status.Wet")));

        world.spawn(ActorHandle(1), TagSet::new());
        assert!(world.add_tag(ActorHandle(1), tag("Status.Wet")));
        assert!(world.has_tag(ActorHandle(1), &tag("Status")));
        assert!(world.remove_tag(ActorHandle(1), &tag("Status.Wet")));
        assert!(!world.has_tag(ActorHandle(1), &tag("Status.Wet")));
    }
}
