//! CLI infrastructure for slime-marl
//!
//! Loads the parameter files, runs training followed by evaluation, and
//! reports the results.

pub mod commands;
pub mod output;
