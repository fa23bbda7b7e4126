//! Multi-agent tabular Q-learning for slime aggregation
//!
//! This crate provides:
//! - Binary observation encoding into dense state ids
//! - Per-agent Q-tables with epsilon-greedy action selection
//! - One-step temporal-difference updates with deferred bootstrapping
//! - Epsilon decay schedules shared across learners
//! - Episode orchestration over a pluggable simulation port
//! - Periodic summary rows and a CSV run log

pub mod adapters;
pub mod app;
pub mod cli;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod types;

pub use app::{App, RunConfig};
pub use error::{Error, Result};
pub use pipeline::{EpisodeOrchestrator, EpisodeSettings, RunResult, StatsAggregator};
pub use ports::{AgentObservation, Environment, Observer};
pub use q_learning::{EpsilonScheduler, PolicyEngine, QTableStore, StateEncoder, TdLearner};
pub use types::{ActionId, AgentId, Observation, RunPhase, StateId};
