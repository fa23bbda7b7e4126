//! Run command - Train learners, then evaluate the learned tables

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    adapters::ToySwarm,
    app::{App, RunConfig},
    cli::output::{print_kv, print_run_result},
};

#[derive(Parser, Debug)]
#[command(about = "Train Q-learning agents, then evaluate them")]
pub struct RunArgs {
    /// Simulation parameters (JSON)
    #[arg(long, default_value = "qLearning-env-params.json")]
    pub params_path: PathBuf,

    /// Learning parameters (JSON)
    #[arg(long, default_value = "qLearning-learning-params.json")]
    pub learning_params_path: PathBuf,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    pub random_seed: u64,

    /// Directory that receives the run log
    #[arg(long, default_value = "runs")]
    pub log_dir: PathBuf,

    /// Skip writing the run log
    #[arg(long, default_value_t = false)]
    pub no_log: bool,

    /// Show progress bars
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub progress: bool,

    /// Optional path for writing a JSON summary of both phases
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let config = RunConfig::load(&args.params_path, &args.learning_params_path)
        .context("failed to load run configuration")?;

    let mut builder = App::builder()
        .with_progress(args.progress)
        .with_default_seed(args.random_seed);
    builder = if args.no_log {
        builder.without_log()
    } else {
        builder.with_log_dir(&args.log_dir)
    };
    let app = builder.build();

    // Offset so the world and the policy do not share a random stream.
    let mut env = ToySwarm::from_env_params(&config.env, Some(args.random_seed.wrapping_add(1)))
        .context("failed to build simulation")?;

    let report = app.run(&config, &mut env)?;

    print_run_result(&report.training);
    if let Some(path) = &report.log_path {
        print_kv("Run log", &path.display().to_string());
    }
    print_run_result(&report.evaluation);

    // Evaluation cluster sizes, one per episode.
    println!(
        "{}",
        serde_json::to_string(&report.evaluation.cluster_by_episode)?
    );

    if let Some(path) = &args.summary {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create summary '{}'", path.display()))?;
        serde_json::to_writer_pretty(file, &report)?;
    }

    Ok(())
}
