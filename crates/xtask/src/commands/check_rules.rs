//! Validate a rule table and show the order the matcher walks it in.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use damage_content::RuleTableLoader;
use damage_core::{BehaviorRule, EffectKind, RuleTable, TagQuery};

use super::{OutputFormat, content};

/// Validate a rule table and print its evaluation order
#[derive(Parser)]
pub struct CheckRules {
    /// Rule table to check (defaults to rules.ron in the data directory)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Custom data directory (defaults to DAMAGE_DATA_DIR or the bundled data)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl CheckRules {
    pub fn execute(self) -> Result<()> {
        let factory = content(self.data_dir);
        let path = self
            .path
            .unwrap_or_else(|| factory.data_dir().join("rules.ron"));

        let table = RuleTableLoader::load(&path)
            .with_context(|| format!("Rule table rejected: {}", path.display()))?;
        let config = factory.load_config()?;

        match self.format {
            OutputFormat::Summary => {
                println!("{} {}", style("Rule Table:").bold().cyan(), path.display());
                println!("{} {}", style("Rules:").bold().cyan(), table.len());
                println!(
                    "{} {}",
                    style("Ineligible Tags:").bold().cyan(),
                    join(config.ineligible_tags.iter())
                );
                println!();
                print_order(&table);
            }
            OutputFormat::Json => {
                let rules: Vec<&BehaviorRule> =
                    table.evaluation_order().iter().map(|rule| &**rule).collect();
                println!("{}", serde_json::to_string_pretty(&rules)?);
            }
        }

        Ok(())
    }
}

fn print_order(table: &RuleTable) {
    println!("{}", style("=== Evaluation Order ===").bold().green());
    for (position, rule) in table.evaluation_order().iter().enumerate() {
        let stop = if rule.stop_on_match {
            style(" [stop]").red().to_string()
        } else {
            String::new()
        };
        println!(
            "{:>3}. {} {}{}",
            position + 1,
            style(format!("{:>5}", rule.priority)).yellow(),
            style(&rule.id).bold(),
            stop
        );

        if let Some(filter) = &rule.damage_type_filter {
            println!("       type    {filter}");
        }
        print_query("target", &rule.preconditions.target);
        print_query("instig.", &rule.preconditions.instigator);
        print_query("context", &rule.preconditions.context);

        for (index, effect) in rule.effects.iter().enumerate() {
            let mut flags = Vec::new();
            if effect.critical {
                flags.push("critical");
            }
            if !effect.eligibility.is_empty() {
                flags.push("gated");
            }
            println!(
                "       [{index}] {}{}",
                EffectKind::from(&effect.action),
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", flags.join(", "))
                }
            );
        }
    }
}

fn print_query(label: &str, query: &TagQuery) {
    if query.is_empty() {
        return;
    }
    println!(
        "       {label:<7} all[{}] none[{}]",
        join(query.require_all.iter()),
        join(query.forbid_any.iter())
    );
}

fn join<'a>(tags: impl Iterator<Item = &'a damage_core::Tag>) -> String {
    tags.map(|tag| tag.as_str()).collect::<Vec<_>>().join(", ")
}
