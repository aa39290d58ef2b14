//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod check_rules;
mod simulate;

pub use check_rules::CheckRules;
pub use simulate::Simulate;

use std::path::PathBuf;

use damage_content::ContentFactory;

/// Content factory for `--data-dir`, or the default data directory.
fn content(data_dir: Option<PathBuf>) -> ContentFactory {
    data_dir
        .map(ContentFactory::new)
        .unwrap_or_else(ContentFactory::default_paths)
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Full JSON output
    Json,
}
