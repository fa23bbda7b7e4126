//! Environment port - the swarm simulation as seen by the learning core
//!
//! Physics (movement resolution, pheromone evaporation and diffusion, cluster
//! detection, rendering) lives behind this trait. The orchestrator only
//! sequences calls into it.

use crate::{
    Result,
    types::{ActionId, AgentId, Observation},
};

/// What an agent perceives at the start of its turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentObservation {
    /// Local boolean features
    pub observation: Observation,
    /// Reward earned by the agent's previous action
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    /// Free-form diagnostics from the simulation
    pub info: serde_json::Value,
}

impl AgentObservation {
    /// Observation with a reward and no termination flags.
    pub fn new(observation: Observation, reward: f64) -> Self {
        Self {
            observation,
            reward,
            terminated: false,
            truncated: false,
            info: serde_json::Value::Null,
        }
    }
}

/// Shared multi-agent simulation driven one agent turn at a time.
///
/// # Call Sequence
///
/// For each episode:
/// 1. `reset()`
/// 2. For each tick:
///    - `turn_order(learners)` once
///    - for each agent in that order: `observe(agent)` then `step(action)`
///    - `finalize_tick()`
/// 3. `cluster_metric()`
///
/// `close()` is called once when the caller is done with the environment.
///
/// Calls are synchronous. The core never retries a failed call because the
/// simulation state after a failure is undefined; errors propagate as-is.
///
/// The environment never picks actions for learners. Bootstrap and
/// exploratory actions are drawn from the orchestrator's seeded
/// [`PolicyEngine`](crate::q_learning::PolicyEngine), so one seed reproduces
/// a run.
pub trait Environment {
    /// Start a new episode.
    fn reset(&mut self) -> Result<()>;

    /// Agents that act this tick, at most `max_agents` of them.
    ///
    /// The learning core requires every learner exactly once, ascending.
    fn turn_order(&mut self, max_agents: usize) -> Result<Vec<AgentId>>;

    /// Observation and reward for `agent`, which becomes the agent on turn.
    fn observe(&mut self, agent: AgentId) -> Result<AgentObservation>;

    /// Apply `action` for the agent currently on turn.
    ///
    /// The effect must be visible to agents observed later in the same tick.
    fn step(&mut self, action: ActionId) -> Result<()>;

    /// Resolve movement, evaporate and diffuse pheromone, render.
    fn finalize_tick(&mut self) -> Result<()>;

    /// Current average cluster size.
    fn cluster_metric(&self) -> Result<f64>;

    /// Release simulation resources.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

