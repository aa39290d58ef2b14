use std::collections::BTreeSet;

use super::{RawHitResult, attachment_root};
use crate::env::ActorDirectory;
use crate::types::ActorHandle;

/// How a damage behavior detects hits while its window is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitDetection {
    /// Sweeps between frames; each actor is hit at most once per window.
    #[default]
    Trace,
    /// Overlap begin events; every new overlap is a fresh hit.
    Overlap,
}

/// Registrators of one hit source that a window listens to.
///
/// An empty registrator list accepts every registrator of the source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceFilter {
    pub source: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub registrators: BTreeSet<String>,
}

impl SourceFilter {
    pub fn new<I, S>(source: impl Into<String>, registrators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: source.into(),
            registrators: registrators.into_iter().map(Into::into).collect(),
        }
    }

    fn accepts(&self, raw: &RawHitResult) -> bool {
        raw.source.as_ref().is_some_and(|hit| {
            hit.source == self.source
                && (self.registrators.is_empty() || self.registrators.contains(&hit.registrator))
        })
    }
}

/// Activation span of one damage behavior (a sword swing, a kick).
///
/// While open, [`HitWindow::register`] lets through the first hit on each
/// actor hierarchy and drops the rest. Closing the window forgets every
/// remembered actor and detaches whatever the window attached to its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HitWindow {
    behavior: String,
    detection: HitDetection,
    owner: Option<ActorHandle>,
    sources: Vec<SourceFilter>,
    attach_while_active: bool,
    active: bool,
    hit_actors: BTreeSet<ActorHandle>,
    attached: Vec<ActorHandle>,
}

impl HitWindow {
    pub fn new(behavior: impl Into<String>, detection: HitDetection) -> Self {
        Self {
            behavior: behavior.into(),
            detection,
            owner: None,
            sources: Vec::new(),
            attach_while_active: false,
            active: false,
            hit_actors: BTreeSet::new(),
            attached: Vec::new(),
        }
    }

    /// Hits landing on the owner's hierarchy are ignored.
    pub fn with_owner(mut self, owner: ActorHandle) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Restricts the window to hits from the given registrators.
    ///
    /// With no filters every hit is accepted; once one is added, hits that
    /// match no filter (or carry no source) are dropped.
    pub fn accepting(mut self, filter: SourceFilter) -> Self {
        self.sources.push(filter);
        self
    }

    /// Hit actors are attached to the owner until the window closes.
    pub fn attach_while_active(mut self, attach: bool) -> Self {
        self.attach_while_active = attach;
        self
    }

    pub fn behavior(&self) -> &str {
        &self.behavior
    }

    pub fn detection(&self) -> HitDetection {
        self.detection
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn hit_actors(&self) -> &BTreeSet<ActorHandle> {
        &self.hit_actors
    }

    /// Actors currently attached to the owner by this window.
    pub fn attached_actors(&self) -> &[ActorHandle] {
        &self.attached
    }

    pub fn accepts_source(&self, raw: &RawHitResult) -> bool {
        self.sources.is_empty() || self.sources.iter().any(|filter| filter.accepts(raw))
    }

    pub fn open(&mut self) {
        self.active = true;
    }

    /// Deactivates the window and detaches every actor it attached.
    ///
    /// Returns the actors the directory refused to detach.
    pub fn close<D>(&mut self, directory: &D) -> Vec<ActorHandle>
    where
        D: ActorDirectory + ?Sized,
    {
        self.active = false;
        self.hit_actors.clear();
        self.attached
            .drain(..)
            .filter(|actor| directory.request_detach(*actor).is_err())
            .collect()
    }

    /// Returns the actor to resolve damage against, or `None` when the hit
    /// is filtered out.
    ///
    /// Attaching can move the hit actor under the owner, so callers should
    /// pass the returned actor as the explicit event target.
    pub fn register<D>(&mut self, raw: &RawHitResult, directory: &D) -> Option<ActorHandle>
    where
        D: ActorDirectory + ?Sized,
    {
        if !self.active || !self.accepts_source(raw) {
            return None;
        }
        let hit = raw.hit_actor?;
        let root = attachment_root(directory, hit);
        if self
            .owner
            .is_some_and(|owner| attachment_root(directory, owner) == root)
        {
            return None;
        }

        match self.detection {
            HitDetection::Overlap => Some(root),
            HitDetection::Trace => {
                if self.hit_actors.contains(&root) || self.hit_actors.contains(&hit) {
                    return None;
                }
                self.remember_hierarchy(root, directory);
                self.hit_actors.insert(hit);
                self.attach_to_owner(root, directory);
                Some(root)
            }
        }
    }

    fn attach_to_owner<D>(&mut self, root: ActorHandle, directory: &D)
    where
        D: ActorDirectory + ?Sized,
    {
        let Some(owner) = self.owner.filter(|_| self.attach_while_active) else {
            return;
        };
        if directory.request_attach(root, owner).is_ok() {
            self.attached.push(root);
        }
    }

    fn remember_hierarchy<D>(&mut self, root: ActorHandle, directory: &D)
    where
        D: ActorDirectory + ?Sized,
    {
        let mut stack = vec![root];
        while let Some(actor) = stack.pop() {
            if self.hit_actors.insert(actor) {
                stack.extend(directory.attached_actors(actor));
            }
        }
    }
}
