//! Behavior rule table loader.

use std::path::Path;

use damage_core::{BehaviorRule, RuleTable};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Rule catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCatalog {
    pub rules: Vec<BehaviorRule>,
}

/// Loader for rule tables from RON files.
pub struct RuleTableLoader;

impl RuleTableLoader {
    /// Load and validate a rule table from a RON file.
    pub fn load(path: &Path) -> LoadResult<RuleTable> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    /// Parse and validate a rule table from RON text.
    pub fn parse(content: &str) -> LoadResult<RuleTable> {
        let catalog: RuleCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rule catalog RON: {}", e))?;
        let table = RuleTable::new(catalog.rules)
            .map_err(|e| anyhow::anyhow!("Invalid rule table: {}", e))?;
        Ok(table)
    }

    /// The default rule set embedded in this crate.
    pub fn builtin() -> LoadResult<RuleTable> {
        Self::parse(include_str!("../../data/rules.ron"))
    }
}
