use std::fmt;

use super::EffectSpec;
use crate::event::DamageEvent;
use crate::tags::{Tag, TagQuery, TagSet};

/// Unique identifier of a rule within a table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RuleId(pub String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Tag conditions a rule needs to apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RulePreconditions {
    pub target: TagQuery,
    /// Evaluated against an empty set for environmental damage.
    pub instigator: TagQuery,
    /// Evaluated against the event's context tags.
    pub context: TagQuery,
}

impl RulePreconditions {
    pub fn holds(&self, target: &TagSet, instigator: &TagSet, context: &TagSet) -> bool {
        self.target.matches(target)
            && self.instigator.matches(instigator)
            && self.context.matches(context)
    }
}

/// Conditional mapping from a damage situation to ordered effects.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BehaviorRule {
    pub id: RuleId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub preconditions: RulePreconditions,
    /// Exact match against the event's damage type.
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type_filter: Option<Tag>,
    /// Higher runs first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<EffectSpec>,
    /// Stops evaluation of every later rule once this one matches.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stop_on_match: bool,
}

impl BehaviorRule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RuleId::new(id),
            preconditions: RulePreconditions::default(),
            damage_type_filter: None,
            priority: 0,
            effects: Vec::new(),
            stop_on_match: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn for_damage_type(mut self, damage_type: Tag) -> Self {
        self.damage_type_filter = Some(damage_type);
        self
    }

    pub fn with_preconditions(mut self, preconditions: RulePreconditions) -> Self {
        self.preconditions = preconditions;
        self
    }

    pub fn when_target(mut self, query: TagQuery) -> Self {
        self.preconditions.target = query;
        self
    }

    pub fn when_instigator(mut self, query: TagQuery) -> Self {
        self.preconditions.instigator = query;
        self
    }

    pub fn when_context(mut self, query: TagQuery) -> Self {
        self.preconditions.context = query;
        self
    }

    pub fn with_effect(mut self, effect: EffectSpec) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn stop_on_match(mut self) -> Self {
        self.stop_on_match = true;
        self
    }

    /// Damage type filter and preconditions against already-copied tags.
    pub fn applies_to(&self, event: &DamageEvent, target: &TagSet, instigator: &TagSet) -> bool {
        let type_ok = self
            .damage_type_filter
            .as_ref()
            .is_none_or(|filter| filter == event.damage_type());
        type_ok
            && self
                .preconditions
                .holds(target, instigator, event.context_tags())
    }
}
