//! Wiring of a complete training + evaluation run.
//!
//! The app owns the infrastructure choices (where the run log goes, whether a
//! progress bar is shown, the default seed) and assembles the orchestrator
//! and its observers from a [`RunConfig`].

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::config::RunConfig;
use crate::{
    Result,
    export::RunLog,
    pipeline::{EpisodeOrchestrator, ProgressObserver, RunResult},
    ports::{Environment, Observer},
    q_learning::QTableStore,
};

/// Everything produced by [`App::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub training: RunResult,
    pub evaluation: RunResult,
    /// Location of the run log, when one was written
    pub log_path: Option<PathBuf>,
    /// Learned tables after training
    #[serde(skip)]
    pub store: QTableStore,
}

/// Application with its infrastructure dependencies.
///
/// # Examples
///
/// ```
/// use slime_marl::app::App;
///
/// let app = App::builder()
///     .without_log()
///     .with_progress(false)
///     .with_default_seed(42)
///     .build();
/// assert_eq!(app.default_seed(), Some(42));
/// ```
pub struct App {
    log_dir: Option<PathBuf>,
    default_seed: Option<u64>,
    progress: bool,
}

impl App {
    /// Create an app with defaults: logs under `runs/`, progress bars on,
    /// non-deterministic seed.
    pub fn new() -> Self {
        Self {
            log_dir: Some(PathBuf::from("runs")),
            default_seed: None,
            progress: true,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn default_seed(&self) -> Option<u64> {
        self.default_seed
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Orchestrator plus the path of its run log, if any.
    pub fn create_orchestrator(
        &self,
        config: &RunConfig,
    ) -> Result<(EpisodeOrchestrator, Option<PathBuf>)> {
        let mut orchestrator = EpisodeOrchestrator::from_config(config, self.default_seed)?;
        let mut log_path = None;

        if let Some(dir) = &self.log_dir {
            let log = RunLog::create_in(dir, config)?;
            log_path = Some(log.path().to_path_buf());
            orchestrator = orchestrator.with_observer(Box::new(log) as Box<dyn Observer>);
        }
        if self.progress {
            orchestrator = orchestrator.with_observer(Box::new(ProgressObserver::new()));
        }
        Ok((orchestrator, log_path))
    }

    /// Train, then evaluate the learned tables, then close the environment.
    ///
    /// The environment is closed even when a phase fails; the phase's error
    /// is returned in that case, not the close result.
    pub fn run<E>(&self, config: &RunConfig, env: &mut E) -> Result<RunReport>
    where
        E: Environment + ?Sized,
    {
        config.validate()?;
        let (mut orchestrator, log_path) = self.create_orchestrator(config)?;
        let mut store = orchestrator.create_store();

        let phases = Self::train_then_evaluate(config, &mut orchestrator, env, &mut store);
        let closed = env.close();
        if let Err(err) = &closed {
            warn!(error = %err, "closing the environment failed");
        }
        let (training, evaluation) = phases?;
        closed?;

        if let Some(path) = &log_path {
            info!(path = %path.display(), "run log written");
        }

        Ok(RunReport {
            training,
            evaluation,
            log_path,
            store,
        })
    }
}

impl App {
    fn train_then_evaluate<E>(
        config: &RunConfig,
        orchestrator: &mut EpisodeOrchestrator,
        env: &mut E,
        store: &mut QTableStore,
    ) -> Result<(RunResult, RunResult)>
    where
        E: Environment + ?Sized,
    {
        let training = orchestrator.train(env, store, config.learning.train_episodes)?;
        let evaluation = orchestrator.evaluate(
            env,
            store,
            config.learning.test_episodes,
            config.test_epsilon(),
        )?;
        Ok((training, evaluation))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    app: App,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self { app: App::new() }
    }

    /// Write run logs into `dir`.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.app.log_dir = Some(dir.into());
        self
    }

    /// Do not write a run log.
    pub fn without_log(mut self) -> Self {
        self.app.log_dir = None;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.app.progress = progress;
        self
    }

    /// Seed used for the policy's random source.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.app.default_seed = Some(seed);
        self
    }

    pub fn build(self) -> App {
        self.app
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
