//! arcpull CLI - Command-line interface for listing and extracting archives

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arcpull")]
#[command(about = "arcpull: list and extract compressed archives", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the arcpull CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Logs go to stderr so `list --json` stays clean; RUST_LOG overrides the level
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
