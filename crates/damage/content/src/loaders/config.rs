//! Engine configuration loader.

use std::path::Path;

use damage_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load an [`EngineConfig`] from a TOML file. Missing keys keep defaults.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use damage_core::Tag;

    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("max_effect_retries = 5\n").unwrap();
        assert_eq!(config.max_effect_retries, 5);
        assert_eq!(config.ability_ack_timeout_ticks, 30);
        assert!(
            config
                .ineligible_tags
                .has_exact(&Tag::new("Status.Dead").unwrap())
        );
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "ability_ack_timeout_ticks = 4\nineligible_tags = [\"Status.Dead\", \"Status.Despawning\"]"
        )
        .unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.ability_ack_timeout_ticks, 4);
        assert_eq!(config.ineligible_tags.len(), 2);
    }

    #[test]
    fn invalid_tags_are_rejected() {
        let err = ConfigLoader::parse("ineligible_tags = [\"Status..Dead\"]").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config TOML"));
    }
}
