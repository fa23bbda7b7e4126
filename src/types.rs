//! Newtype wrappers for the integer identifiers used throughout the core.
//!
//! Text forms of these identifiers only appear when rows are serialized to the
//! run log.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a simulated agent.
///
/// Learners occupy the contiguous range that follows the non-learning
/// population, so the first learner id equals the configured `population`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(usize);

impl AgentId {
    pub const fn new(value: usize) -> Self {
        AgentId(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl From<usize> for AgentId {
    fn from(value: usize) -> Self {
        AgentId(value)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discrete state produced by the state encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(usize);

impl StateId {
    pub const fn new(value: usize) -> Self {
        StateId(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the configured, ordered action list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(usize);

impl ActionId {
    pub const fn new(value: usize) -> Self {
        ActionId(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl From<ActionId> for usize {
    fn from(action: ActionId) -> Self {
        action.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local boolean features an agent perceives on its turn.
///
/// The reference simulation reports two features: whether the agent sits in
/// a cluster of peers, and whether its patch carries pheromone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Observation(Vec<bool>);

impl Observation {
    pub fn new(features: Vec<bool>) -> Self {
        Observation(features)
    }

    pub fn features(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<bool>> for Observation {
    fn from(features: Vec<bool>) -> Self {
        Observation(features)
    }
}

impl<const N: usize> From<[bool; N]> for Observation {
    fn from(features: [bool; N]) -> Self {
        Observation(features.to_vec())
    }
}

/// Which half of a run the orchestrator is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Training,
    Evaluation,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Training => write!(f, "training"),
            RunPhase::Evaluation => write!(f, "evaluation"),
        }
    }
}
