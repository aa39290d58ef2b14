use crate::tags::{Tag, TagSet};

/// Tunable parameters of the resolution engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Attempts allowed for a step whose collaborator is unreachable.
    pub max_effect_retries: u32,
    /// Ticks to wait for an awaited ability before giving up on it.
    pub ability_ack_timeout_ticks: u64,
    /// Target tags that make every remaining effect ineligible.
    pub ineligible_tags: TagSet,
    /// Queued events allowed per target before submissions are rejected.
    pub max_queue_per_target: usize,
}

impl EngineConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_EFFECT_RETRIES: u32 = 3;
    pub const DEFAULT_ABILITY_ACK_TIMEOUT_TICKS: u64 = 30;
    pub const DEFAULT_MAX_QUEUE_PER_TARGET: usize = 64;
    pub const DEFAULT_DEAD_TAG: &'static str = "Status.Dead";

    pub fn new() -> Self {
        let ineligible_tags = Tag::new(Self::DEFAULT_DEAD_TAG)
            .map(|dead| TagSet::new().with(dead))
            .unwrap_or_default();
        Self {
            max_effect_retries: Self::DEFAULT_MAX_EFFECT_RETRIES,
            ability_ack_timeout_ticks: Self::DEFAULT_ABILITY_ACK_TIMEOUT_TICKS,
            ineligible_tags,
            max_queue_per_target: Self::DEFAULT_MAX_QUEUE_PER_TARGET,
        }
    }

    pub fn with_max_effect_retries(mut self, retries: u32) -> Self {
        self.max_effect_retries = retries;
        self
    }

    pub fn with_ability_ack_timeout(mut self, ticks: u64) -> Self {
        self.ability_ack_timeout_ticks = ticks;
        self
    }

    pub fn with_ineligible_tags(mut self, tags: TagSet) -> Self {
        self.ineligible_tags = tags;
        self
    }

    pub fn with_max_queue_per_target(mut self, depth: usize) -> Self {
        self.max_queue_per_target = depth;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_treat_dead_targets_as_ineligible() {
        let config = EngineConfig::default();
        assert_eq!(config.max_effect_retries, 3);
        assert_eq!(config.ability_ack_timeout_ticks, 30);
        assert_eq!(config.max_queue_per_target, 64);
        assert!(
            config
                .ineligible_tags
                .has_exact(&Tag::new("Status.Dead").unwrap())
        );
    }
}
