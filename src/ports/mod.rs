//! Ports (trait boundaries) for external collaborators.
//!
//! The swarm simulation and every consumer of run events sit behind these
//! traits; the learning core depends only on them.

pub mod environment;
pub mod observer;

pub use environment::{AgentObservation, Environment};
pub use observer::Observer;
