//! Application layer: run configuration and wiring.
//!
//! ```text
//! RunConfig ──► App ──► EpisodeOrchestrator ──► Environment (port)
//!                │             │
//!                │             └─► Observers: RunLog, ProgressObserver
//!                └─► QTableStore (created once, trained, then evaluated)
//! ```

pub mod config;
pub mod container;

pub use config::{EnvParams, LearningParams, REPORT_ORDER, RunConfig};
pub use container::{App, AppBuilder, RunReport};
