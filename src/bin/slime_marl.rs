//! slime-marl CLI - Multi-agent Q-learning for slime aggregation
//!
//! This CLI provides:
//! - Training followed by evaluation of independent Q-learners
//! - Validation of parameter files before a long run

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slime-marl")]
#[command(version, about = "Tabular Q-learning for slime aggregation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the learners, then evaluate their tables
    Run(slime_marl::cli::commands::run::RunArgs),

    /// Validate parameter files and print the resolved run
    Check(slime_marl::cli::commands::check::CheckArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => slime_marl::cli::commands::run::execute(args),
        Commands::Check(args) => slime_marl::cli::commands::check::execute(args),
    }
}
