//! Content factory for loading everything from a data directory.

use std::path::{Path, PathBuf};

use damage_core::{EngineConfig, RuleTable};

use crate::loaders::{ConfigLoader, LoadResult, RuleTableLoader};

/// Loads rule content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── engine.toml
/// ├── rules.ron
/// └── scenarios/
///     └── {scenario}.ron
/// ```
#[derive(Clone, Debug)]
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolves the data directory from `DAMAGE_DATA_DIR`, falling back to
    /// the data shipped with this crate.
    pub fn default_paths() -> Self {
        let data_dir = std::env::var("DAMAGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"));
        Self::new(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load engine configuration from `engine.toml`, or defaults when absent.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("engine.toml");
        if !path.exists() {
            return Ok(EngineConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the rule table from `rules.ron`.
    pub fn load_rules(&self) -> LoadResult<RuleTable> {
        RuleTableLoader::load(&self.data_dir.join("rules.ron"))
    }

    pub fn scenario_path(&self, name: &str) -> PathBuf {
        self.data_dir.join("scenarios").join(format!("{name}.ron"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap(), EngineConfig::default());
        assert!(factory.load_rules().is_err());
    }

    #[test]
    fn shipped_data_directory_loads() {
        let factory = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
        factory.load_config().unwrap();
        assert!(!factory.load_rules().unwrap().is_empty());
        assert!(factory.scenario_path("duel").ends_with("scenarios/duel.ron"));
    }
}
