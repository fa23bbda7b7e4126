//! Subcommands of the slime-marl binary

pub mod check;
pub mod run;
