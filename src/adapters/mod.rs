//! Adapters implementing domain ports.
//!
//! This module contains concrete implementations of the traits defined in
//! the ports module.

pub mod toy_swarm;

pub use toy_swarm::{ToySwarm, ToySwarmParams};
