//! Training and evaluation pipeline
//!
//! This module provides:
//! - The episode orchestrator that sequences agent turns against an environment
//! - Per-episode statistics and summary rows
//! - Observers for progress display and in-memory collection

pub mod observers;
pub mod orchestrator;
pub mod stats;

pub use observers::{CollectedRun, ProgressObserver, SummaryCollector};
pub use orchestrator::{EpisodeOrchestrator, EpisodeSettings, OrchestratorState, RunResult};
pub use stats::{EpisodeReport, EpisodeStats, StatsAggregator, SummaryRow, round2};

pub use crate::ports::{Environment, Observer};
