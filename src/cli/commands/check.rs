//! Check command - Validate parameter files without running

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::RunConfig,
    cli::output::{print_kv, print_section},
    export::column_names,
    q_learning::StateEncoder,
};

#[derive(Parser, Debug)]
#[command(about = "Validate parameter files and show the resolved run")]
pub struct CheckArgs {
    /// Simulation parameters (JSON)
    #[arg(long, default_value = "qLearning-env-params.json")]
    pub params_path: PathBuf,

    /// Learning parameters (JSON)
    #[arg(long, default_value = "qLearning-learning-params.json")]
    pub learning_params_path: PathBuf,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let config = RunConfig::load(&args.params_path, &args.learning_params_path)
        .context("invalid run configuration")?;
    let encoder = StateEncoder::new(config.learning.observation_features)?;
    let learners = config.learner_ids();

    print_section("Run configuration");
    print_kv(
        "Learners",
        &format!("{} (ids {}..{})", learners.len(), learners.start, learners.end),
    );
    print_kv("Ticks/episode", &config.env.episode_ticks.to_string());
    print_kv(
        "Episodes",
        &format!(
            "{} train / {} test",
            config.learning.train_episodes, config.learning.test_episodes
        ),
    );
    print_kv(
        "Q-table",
        &format!("{} states x {} actions", encoder.num_states(), config.num_actions()),
    );
    print_kv("Decay", &format!("{:?}", config.decay_schedule()));
    print_kv("Test epsilon", &config.test_epsilon().to_string());
    print_kv("Columns", &column_names(&config).join(", "));

    Ok(())
}
