//! Development tasks for the damage behaviors workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod scenario;

use anyhow::Result;
use clap::Parser;
use commands::{CheckRules, Simulate};

/// Development tasks for the damage behaviors workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for damage rule authoring", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Validate a rule table and print its evaluation order
    CheckRules(CheckRules),

    /// Run a scripted scenario through the runtime and report outcomes
    Simulate(Simulate),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for DAMAGE_DATA_DIR and RUST_LOG)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::CheckRules(cmd) => cmd.execute(),
        Command::Simulate(cmd) => cmd.execute(),
    }
}
