//! Observer implementations for training and evaluation runs
//!
//! Observers allow composable data collection without coupling the episode
//! loop to specific output formats.

use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};

use super::stats::{EpisodeReport, SummaryRow};
use crate::{Result, ports::Observer, types::RunPhase};

/// Progress bar observer - Shows episode progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self { progress_bar: None }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_run_start(&mut self, phase: RunPhase, episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {prefix} {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        pb.set_prefix(phase.to_string());
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, report: &EpisodeReport) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(report.episode as u64);
            pb.set_message(format!(
                "ε={:.4} cluster={:.2}",
                report.epsilon, report.cluster_metric
            ));
        }
        Ok(())
    }

    fn on_run_end(&mut self, _phase: RunPhase) -> Result<()> {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish();
        }
        Ok(())
    }
}

/// Everything a [`SummaryCollector`] has seen.
#[derive(Debug, Clone, Default)]
pub struct CollectedRun {
    pub episodes: Vec<EpisodeReport>,
    pub summaries: Vec<(RunPhase, SummaryRow)>,
}

impl CollectedRun {
    /// Episode reports for one phase.
    pub fn episodes_for(&self, phase: RunPhase) -> Vec<EpisodeReport> {
        self.episodes
            .iter()
            .filter(|report| report.phase == phase)
            .copied()
            .collect()
    }

    /// Summary rows for one phase.
    pub fn summaries_for(&self, phase: RunPhase) -> Vec<SummaryRow> {
        self.summaries
            .iter()
            .filter(|(row_phase, _)| *row_phase == phase)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

/// Keeps episode reports and summary rows in memory.
///
/// Clones share storage, so a handle kept by the caller sees what the copy
/// handed to the orchestrator records.
#[derive(Clone, Default)]
pub struct SummaryCollector {
    collected: Arc<Mutex<CollectedRun>>,
}

impl SummaryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything collected so far.
    pub fn snapshot(&self) -> CollectedRun {
        self.collected
            .lock()
            .map(|collected| collected.clone())
            .unwrap_or_default()
    }
}

impl Observer for SummaryCollector {
    fn on_episode_end(&mut self, report: &EpisodeReport) -> Result<()> {
        if let Ok(mut collected) = self.collected.lock() {
            collected.episodes.push(*report);
        }
        Ok(())
    }

    fn on_summary(&mut self, phase: RunPhase, row: &SummaryRow) -> Result<()> {
        if let Ok(mut collected) = self.collected.lock() {
            collected.summaries.push((phase, row.clone()));
        }
        Ok(())
    }
}
