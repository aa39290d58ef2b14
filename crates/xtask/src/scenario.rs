//! Scripted scenario files for `xtask simulate`.
//!
//! A scenario seeds the sandbox world, scripts the ability runtime, and lists
//! timed hits and world changes.
//!
//! ```ron
//! (
//!     ticks: 10,
//!     actors: [(id: 1, tags: ["Class.Boss"]), (id: 3, attach_to: Some(2))],
//!     abilities: [(effect: "Ability.Stagger", script: SucceedAfter(2))],
//!     windows: [(name: "smash", owner: Some(1), attach_while_active: true,
//!                open_at: 0, close_at: 4)],
//!     hits: [(at: 1, window: Some("smash"), damage_type: "Damage.Blunt", amount: 10.0,
//!             raw: (hit_actor: Some(3)))],
//!     changes: [(at: 6, change: AddTag(actor: 2, tag: "Status.Dead"))],
//! )
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use damage_core::{
    ActorHandle, HitDetection, HitRequest, HitWindow, RawHitResult, SourceFilter, Tag, TagSet,
    Tick,
};
use damage_runtime::{AbilityScript, Sandbox};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Last tick to simulate (inclusive).
    pub ticks: u64,
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
    #[serde(default)]
    pub abilities: Vec<AbilitySpec>,
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
    #[serde(default)]
    pub hits: Vec<HitSpec>,
    #[serde(default)]
    pub changes: Vec<TimedChange>,
}

#[derive(Debug, Deserialize)]
pub struct ActorSpec {
    pub id: ActorHandle,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub attach_to: Option<ActorHandle>,
}

#[derive(Debug, Deserialize)]
pub struct AbilitySpec {
    pub effect: Tag,
    pub script: AbilityScript,
    /// Tags the target gains when an activation completes.
    #[serde(default)]
    pub grants: TagSet,
}

#[derive(Debug, Deserialize)]
pub struct WindowSpec {
    pub name: String,
    #[serde(default)]
    pub detection: HitDetection,
    #[serde(default)]
    pub owner: Option<ActorHandle>,
    /// Hit actors are held by the owner until the window closes.
    #[serde(default)]
    pub attach_while_active: bool,
    /// Registrators the window listens to; empty accepts every hit.
    #[serde(default)]
    pub sources: Vec<SourceFilter>,
    pub open_at: Tick,
    pub close_at: Tick,
}

impl WindowSpec {
    pub fn window(&self) -> HitWindow {
        let window = HitWindow::new(self.name.clone(), self.detection)
            .attach_while_active(self.attach_while_active);
        let window = match self.owner {
            Some(owner) => window.with_owner(owner),
            None => window,
        };
        self.sources
            .iter()
            .cloned()
            .fold(window, HitWindow::accepting)
    }
}

#[derive(Debug, Deserialize)]
pub struct HitSpec {
    pub at: Tick,
    /// Routes the hit through a named window first.
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub instigator: Option<ActorHandle>,
    #[serde(default)]
    pub target: Option<ActorHandle>,
    pub damage_type: String,
    pub amount: f32,
    #[serde(default)]
    pub raw: RawHitResult,
    #[serde(default)]
    pub context: TagSet,
}

impl HitSpec {
    pub fn request(&self) -> HitRequest {
        HitRequest {
            raw: self.raw.clone(),
            instigator: self.instigator,
            target: self.target,
            damage_type: self.damage_type.clone(),
            amount: self.amount,
            context_tags: self.context.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TimedChange {
    pub at: Tick,
    pub change: WorldChange,
}

#[derive(Debug, Clone, Deserialize)]
pub enum WorldChange {
    Spawn { actor: ActorHandle, tags: TagSet },
    Despawn(ActorHandle),
    AddTag { actor: ActorHandle, tag: Tag },
    RemoveTag { actor: ActorHandle, tag: Tag },
    PhysicsAvailable(bool),
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse scenario: {}", e))
    }

    /// Builds a sandbox holding the scenario's actors and ability scripts.
    pub fn sandbox(&self) -> Sandbox {
        let sandbox = Sandbox::new();
        for actor in &self.actors {
            sandbox.world.spawn(actor.id, actor.tags.clone());
        }
        for actor in &self.actors {
            if let Some(parent) = actor.attach_to {
                sandbox.world.attach(actor.id, parent);
            }
        }
        for ability in &self.abilities {
            sandbox
                .abilities
                .script(ability.effect.clone(), ability.script.clone());
            if !ability.grants.is_empty() {
                sandbox
                    .abilities
                    .grant_on_complete(ability.effect.clone(), ability.grants.clone());
            }
        }
        sandbox
    }
}

impl WorldChange {
    pub fn apply(&self, sandbox: &Sandbox) {
        match self {
            WorldChange::Spawn { actor, tags } => sandbox.world.spawn(*actor, tags.clone()),
            WorldChange::Despawn(actor) => sandbox.world.despawn(*actor),
            WorldChange::AddTag { actor, tag } => {
                sandbox.world.add_tag(*actor, tag.clone());
            }
            WorldChange::RemoveTag { actor, tag } => {
                sandbox.world.remove_tag(*actor, tag);
            }
            WorldChange::PhysicsAvailable(available) => sandbox.physics.set_unavailable(!available),
        }
    }
}

#[cfg(test)]
mod tests {
    use damage_core::{ActorDirectory, TagRegistry};

    use super::*;

    #[test]
    fn bundled_duel_scenario_parses() {
        let path = damage_content::ContentFactory::default_paths().scenario_path("duel");
        let scenario = Scenario::load(&path).unwrap();
        assert!(!scenario.hits.is_empty());
        assert!(scenario.windows.iter().any(|window| window.attach_while_active));

        let sandbox = scenario.sandbox();
        for actor in &scenario.actors {
            assert!(sandbox.world.is_valid(actor.id));
        }
    }

    #[test]
    fn window_spec_carries_sources_and_attachment() {
        let scenario = Scenario::parse(
            r#"(
                ticks: 1,
                actors: [(id: 1), (id: 2)],
                windows: [(
                    name: "grab",
                    owner: Some(1),
                    attach_while_active: true,
                    sources: [(source: "LeftHand", registrators: ["Palm"])],
                    open_at: 0,
                    close_at: 1,
                )],
            )"#,
        )
        .unwrap();
        let sandbox = scenario.sandbox();
        let mut window = scenario.windows[0].window();
        window.open();

        let palm = RawHitResult::on(ActorHandle(2))
            .from_source(damage_core::HitSource::new("LeftHand", "Palm"));
        assert_eq!(window.register(&RawHitResult::on(ActorHandle(2)), &*sandbox.world), None);
        assert_eq!(window.register(&palm, &*sandbox.world), Some(ActorHandle(2)));
        assert_eq!(sandbox.world.attach_parent(ActorHandle(2)), Some(ActorHandle(1)));

        assert!(window.close(&*sandbox.world).is_empty());
        assert_eq!(sandbox.world.attach_parent(ActorHandle(2)), None);
    }

    #[test]
    fn sandbox_applies_attachments_and_changes() {
        let scenario = Scenario::parse(
            r#"(
                ticks: 2,
                actors: [(id: 1), (id: 2, attach_to: Some(1))],
                changes: [(at: 1, change: AddTag(actor: 1, tag: "Status.Dead"))],
            )"#,
        )
        .unwrap();
        let sandbox = scenario.sandbox();
        assert_eq!(sandbox.world.attach_parent(ActorHandle(2)), Some(ActorHandle(1)));

        scenario.changes[0].change.apply(&sandbox);
        assert!(sandbox.world.has_tag(ActorHandle(1), &Tag::new("Status.Dead").unwrap()));
    }
}
