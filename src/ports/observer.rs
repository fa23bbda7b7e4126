//! Observer port - abstraction for run observation and data collection
//!
//! Observers receive episode-level events from the orchestrator, so that
//! progress display, the run log and in-memory collection stay decoupled from
//! the training loop.

use crate::{
    Result,
    pipeline::stats::{EpisodeReport, SummaryRow},
    types::RunPhase,
};

/// Observer trait for monitoring training and evaluation
///
/// # Event Sequence
///
/// For each phase (training or evaluation):
/// 1. `on_run_start(phase, episodes)`
/// 2. For each episode:
///    - `on_episode_start(phase, episode)`
///    - `on_episode_end(report)`
///    - `on_summary(phase, row)` when the episode falls on the log interval
/// 3. `on_run_end(phase)`
///
/// Episodes are numbered from 1.
///
/// # Examples
///
/// ```
/// use slime_marl::{pipeline::EpisodeReport, ports::Observer};
///
/// struct ClusterTrace {
///     sizes: Vec<f64>,
/// }
///
/// impl Observer for ClusterTrace {
///     fn on_episode_end(&mut self, report: &EpisodeReport) -> slime_marl::Result<()> {
///         self.sizes.push(report.cluster_metric);
///         Ok(())
///     }
/// }
/// ```
pub trait Observer {
    /// Called once before the first episode of a phase.
    fn on_run_start(&mut self, _phase: RunPhase, _episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called after the environment has been reset for `episode`.
    fn on_episode_start(&mut self, _phase: RunPhase, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after the last tick of an episode, once epsilon has decayed.
    fn on_episode_end(&mut self, _report: &EpisodeReport) -> Result<()> {
        Ok(())
    }

    /// Called with each emitted summary row.
    fn on_summary(&mut self, _phase: RunPhase, _row: &SummaryRow) -> Result<()> {
        Ok(())
    }

    /// Called once after the last episode of a phase.
    fn on_run_end(&mut self, _phase: RunPhase) -> Result<()> {
        Ok(())
    }
}
