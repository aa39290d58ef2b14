//! Run a scripted scenario through the resolution runtime.
//!
//! Hits are built with the hit context builder, optionally filtered through
//! hit windows, submitted to a sandboxed runtime, and resolved tick by tick.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use damage_content::RuleTableLoader;
use damage_core::{EffectStatus, HitContextBuilder, HitWindow, ResolutionOutcome, Tick};
use damage_runtime::{Runtime, RuntimeConfig, RuntimeHandle, Sandbox};

use super::{OutputFormat, content};
use crate::scenario::Scenario;

/// Run a scripted scenario and report every outcome
#[derive(Parser)]
pub struct Simulate {
    /// Scenario name under data/scenarios, or a path to a scenario file
    #[arg(value_name = "SCENARIO")]
    scenario: String,

    /// Rule table to use (defaults to rules.ron in the data directory)
    #[arg(short, long, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Custom data directory (defaults to DAMAGE_DATA_DIR or the bundled data)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl Simulate {
    pub fn execute(self) -> Result<()> {
        tokio::runtime::Runtime::new()?.block_on(self.execute_async())
    }

    async fn execute_async(self) -> Result<()> {
        let factory = content(self.data_dir);

        let scenario_path = {
            let direct = PathBuf::from(&self.scenario);
            if direct.is_file() {
                direct
            } else {
                factory.scenario_path(&self.scenario)
            }
        };
        let scenario = Scenario::load(&scenario_path)?;

        let rules = match &self.rules {
            Some(path) => RuleTableLoader::load(path)?,
            None => factory.load_rules()?,
        };
        let config = RuntimeConfig {
            engine: factory.load_config()?,
            ..RuntimeConfig::default()
        };

        let sandbox = scenario.sandbox();
        let runtime = Runtime::builder()
            .config(config)
            .rules(rules)
            .collaborators(sandbox.collaborators())
            .build()
            .await?;
        let handle = runtime.handle();

        if matches!(self.format, OutputFormat::Summary) {
            println!("{} {}", style("Scenario:").bold().cyan(), scenario_path.display());
            println!(
                "{} {} actors, {} hits, {} ticks",
                style("World:").bold().cyan(),
                scenario.actors.len(),
                scenario.hits.len(),
                scenario.ticks + 1
            );
            println!();
        }

        let mut outcomes = run(&scenario, &sandbox, &handle, self.format).await?;
        let flushed = runtime
            .shutdown()
            .await
            .context("Runtime did not shut down cleanly")?;
        for outcome in &flushed {
            report(outcome, self.format)?;
        }
        outcomes.extend(flushed);

        if matches!(self.format, OutputFormat::Summary) {
            print_summary(&outcomes, &sandbox);
        }
        Ok(())
    }
}

async fn run(
    scenario: &Scenario,
    sandbox: &Sandbox,
    handle: &RuntimeHandle,
    format: OutputFormat,
) -> Result<Vec<ResolutionOutcome>> {
    let mut windows: BTreeMap<&str, HitWindow> = scenario
        .windows
        .iter()
        .map(|spec| (spec.name.as_str(), spec.window()))
        .collect();
    let mut outcomes = Vec::new();

    for tick in 0..=scenario.ticks {
        let now = Tick(tick);

        for timed in scenario.changes.iter().filter(|change| change.at == now) {
            timed.change.apply(sandbox);
            if matches!(format, OutputFormat::Summary) {
                println!("{} {:?}", style(format!("[{now}]")).dim(), timed.change);
            }
        }
        for spec in &scenario.windows {
            if let Some(window) = windows.get_mut(spec.name.as_str()) {
                if spec.open_at == now {
                    window.open();
                }
                if spec.close_at == now {
                    for actor in window.close(&*sandbox.world) {
                        println!(
                            "{} {} {} stayed attached after '{}' closed",
                            style(format!("[{now}]")).dim(),
                            style("warning:").yellow(),
                            actor,
                            spec.name
                        );
                    }
                }
            }
        }

        for hit in scenario.hits.iter().filter(|hit| hit.at == now) {
            let mut request = hit.request();
            if let Some(name) = &hit.window {
                let window = windows
                    .get_mut(name.as_str())
                    .with_context(|| format!("Hit references unknown window '{name}'"))?;
                match window.register(&hit.raw, &*sandbox.world) {
                    Some(target) => {
                        request.target.get_or_insert(target);
                    }
                    None => {
                        if matches!(format, OutputFormat::Summary) {
                            println!(
                                "{} hit filtered by window '{}'",
                                style(format!("[{now}]")).dim(),
                                name
                            );
                        }
                        continue;
                    }
                }
            }

            let event = match HitContextBuilder::new(&*sandbox.world, now).build(request) {
                Ok(event) => event,
                Err(err) => {
                    println!("{} {} {}", style(format!("[{now}]")).dim(), style("invalid hit:").red(), err);
                    continue;
                }
            };
            match handle.submit(event).await {
                Ok(receipt) => {
                    if matches!(format, OutputFormat::Summary) {
                        println!(
                            "{} submitted {}",
                            style(format!("[{now}]")).dim(),
                            receipt.event_id()
                        );
                    }
                }
                Err(err) => println!("{} {} {}", style(format!("[{now}]")).dim(), style("rejected:").red(), err),
            }
        }

        for outcome in handle.advance(now).await? {
            report(&outcome, format)?;
            outcomes.push(outcome);
        }
    }

    Ok(outcomes)
}

fn report(outcome: &ResolutionOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(outcome)?),
        OutputFormat::Summary => {
            let state = if outcome.is_completed() {
                style(outcome.state.to_string()).green()
            } else {
                style(outcome.state.to_string()).red()
            };
            println!(
                "{} {} on {} {} amount={} rules=[{}]",
                style(format!("[{}]", outcome.finished_at)).dim(),
                style(outcome.event_id).bold(),
                outcome.target,
                state,
                outcome.final_amount,
                outcome
                    .matched_rules
                    .iter()
                    .map(|rule| rule.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for record in &outcome.effects {
                let status = match &record.status {
                    EffectStatus::Failed(reason) => style(format!("failed: {reason}")).red(),
                    EffectStatus::Skipped(reason) => style(format!("skipped: {reason}")).yellow(),
                    other => style(format!("{other:?}").to_lowercase()).green(),
                };
                println!("      {} {} {}", record.at, record.kind, status);
            }
            if let Some(reason) = outcome.cancel_reason {
                println!("      {} {}", style("cancelled:").red(), reason);
            }
        }
    }
    Ok(())
}

fn print_summary(outcomes: &[ResolutionOutcome], sandbox: &Sandbox) {
    let completed = outcomes.iter().filter(|outcome| outcome.is_completed()).count();
    println!();
    println!("{}", style("=== Summary ===").bold().green());
    println!("  Resolved:   {}", outcomes.len());
    println!("  Completed:  {completed}");
    println!("  Cancelled:  {}", outcomes.len() - completed);
    println!("  Abilities:  {}", sandbox.abilities.activations().len());
    println!("  Impulses:   {}", sandbox.physics.impulses().len());
    println!("  Reactions:  {}", sandbox.ai.reactions().len());
}
