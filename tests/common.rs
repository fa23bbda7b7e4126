//! Common test utilities for the slime-marl test suite.
//!
//! Provides a scripted environment whose rewards, observations and cluster
//! metric are fixed, and which records every call the orchestrator makes.

#![allow(dead_code)]

use slime_marl::{
    Error, Result,
    ports::{AgentObservation, Environment},
    q_learning::{DecaySchedule, EpsilonScheduler, TdLearner},
    pipeline::{EpisodeOrchestrator, EpisodeSettings},
    types::{ActionId, AgentId, Observation},
};

/// Calls seen by a [`ScriptedSwarm`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Reset,
    Observe(AgentId),
    Step(AgentId, ActionId),
    FinalizeTick,
}

/// Environment with constant rewards and observations.
pub struct ScriptedSwarm {
    pub population: usize,
    pub learners: usize,
    pub observation: Vec<bool>,
    pub reward: f64,
    pub cluster: f64,
    /// Hand out learners in descending order
    pub reversed: bool,
    /// Fail the n-th `step` call (0-based)
    pub fail_on_step: Option<usize>,
    pub calls: Vec<Call>,
    pub closed: bool,
    on_turn: Option<AgentId>,
    steps: usize,
}

impl ScriptedSwarm {
    pub fn new(population: usize, learners: usize) -> Self {
        Self {
            population,
            learners,
            observation: vec![false, false],
            reward: 1.0,
            cluster: 1.0,
            reversed: false,
            fail_on_step: None,
            calls: Vec::new(),
            closed: false,
            on_turn: None,
            steps: 0,
        }
    }

    /// Actions taken, with the agent that took them.
    pub fn steps(&self) -> Vec<(AgentId, ActionId)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Step(agent, action) => Some((*agent, *action)),
                _ => None,
            })
            .collect()
    }
}

impl Environment for ScriptedSwarm {
    fn reset(&mut self) -> Result<()> {
        self.calls.push(Call::Reset);
        Ok(())
    }

    fn turn_order(&mut self, max_agents: usize) -> Result<Vec<AgentId>> {
        let count = max_agents.min(self.learners);
        let mut order: Vec<AgentId> = (self.population..self.population + count)
            .map(AgentId::new)
            .collect();
        if self.reversed {
            order.reverse();
        }
        Ok(order)
    }

    fn observe(&mut self, agent: AgentId) -> Result<AgentObservation> {
        self.calls.push(Call::Observe(agent));
        self.on_turn = Some(agent);
        Ok(AgentObservation::new(
            Observation::new(self.observation.clone()),
            self.reward,
        ))
    }

    fn step(&mut self, action: ActionId) -> Result<()> {
        if self.fail_on_step == Some(self.steps) {
            return Err(Error::environment("simulation crashed"));
        }
        self.steps += 1;
        let agent = self
            .on_turn
            .take()
            .ok_or_else(|| Error::environment("step without observe"))?;
        self.calls.push(Call::Step(agent, action));
        Ok(())
    }

    fn finalize_tick(&mut self) -> Result<()> {
        self.calls.push(Call::FinalizeTick);
        Ok(())
    }

    fn cluster_metric(&self) -> Result<f64> {
        Ok(self.cluster)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Settings for `learners` learners after `population` scripted agents.
pub fn settings(population: usize, learners: usize, ticks: usize, seed: u64) -> EpisodeSettings {
    EpisodeSettings {
        population,
        learner_population: learners,
        episode_ticks: ticks,
        num_actions: 3,
        observation_features: 2,
        train_log_every: 1,
        test_log_every: 1,
        seed: Some(seed),
    }
}

/// Orchestrator with α = 0.5, γ = 0.9 and multiplicative decay 0.99.
pub fn orchestrator(settings: EpisodeSettings, epsilon: f64) -> EpisodeOrchestrator {
    let learner = TdLearner::new(0.5, 0.9).unwrap();
    let schedule = EpsilonScheduler::new(epsilon, DecaySchedule::Multiplicative { rate: 0.99 })
        .unwrap();
    EpisodeOrchestrator::new(settings, learner, schedule).unwrap()
}

pub const ENV_PARAMS: &str = r#"{
    "population": 6,
    "learner_population": 3,
    "episode_ticks": 20,
    "world_width": 24,
    "sniff_threshold": 0.9
}"#;

pub const LEARNING_PARAMS: &str = r#"{
    "actions": ["random-walk", "drop-chemical", "move-toward-chemical"],
    "alpha": 0.1,
    "gamma": 0.95,
    "epsilon": 0.9,
    "decay": 0.95,
    "train_episodes": 6,
    "test_episodes": 2,
    "TRAIN_LOG_EVERY": 2,
    "TEST_LOG_EVERY": 1,
    "OUTPUT_FILE": "ql-slime"
}"#;
