//! Small built-in swarm used for command-line runs and smoke tests.
//!
//! Agents live on a ring of cells. Learners walk, lay pheromone or climb the
//! pheromone gradient; the remaining population random-walks. Pheromone
//! evaporates and diffuses once per tick. It is deliberately simple and is
//! not meant to reproduce any particular slime-mold model.

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    app::config::EnvParams,
    ports::{AgentObservation, Environment},
    q_learning::policy::build_rng,
    types::{ActionId, AgentId, Observation},
};

const WALK: usize = 0;
const LAY_PHEROMONE: usize = 1;
const FOLLOW_PHEROMONE: usize = 2;

/// Tunables for [`ToySwarm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToySwarmParams {
    /// Number of cells on the ring
    pub world_width: usize,
    /// Cells on each side that count as "nearby"
    pub cluster_radius: usize,
    /// Nearby agents needed to be in a cluster
    pub cluster_threshold: usize,
    /// Pheromone an agent can smell
    pub sniff_threshold: f64,
    pub lay_amount: f64,
    /// Fraction kept each tick
    pub evaporation: f64,
    /// Fraction spread to the two neighbors each tick
    pub diffusion: f64,
    pub cluster_reward: f64,
    pub lonely_penalty: f64,
}

impl Default for ToySwarmParams {
    fn default() -> Self {
        Self {
            world_width: 64,
            cluster_radius: 2,
            cluster_threshold: 3,
            sniff_threshold: 0.9,
            lay_amount: 2.0,
            evaporation: 0.95,
            diffusion: 0.5,
            cluster_reward: 1.0,
            lonely_penalty: -0.1,
        }
    }
}

impl ToySwarmParams {
    /// Defaults overridden by any matching keys among the simulation params.
    pub fn from_env_params(params: &EnvParams) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::default())?;
        if let Some(fields) = merged.as_object_mut() {
            for (key, value) in &params.extra {
                if fields.contains_key(key) {
                    fields.insert(key.clone(), value.clone());
                }
            }
        }
        let tuned: Self = serde_json::from_value(merged)
            .map_err(|err| Error::config(format!("invalid toy swarm parameter: {err}")))?;
        if tuned.world_width < 3 {
            return Err(Error::config("world_width must be at least 3"));
        }
        Ok(tuned)
    }
}

/// Ring-world swarm implementing [`Environment`].
pub struct ToySwarm {
    params: ToySwarmParams,
    population: usize,
    learners: usize,
    positions: Vec<usize>,
    pheromone: Vec<f64>,
    on_turn: Option<AgentId>,
    rng: StdRng,
}

impl ToySwarm {
    pub fn new(params: ToySwarmParams, population: usize, learners: usize, seed: Option<u64>) -> Self {
        let width = params.world_width;
        Self {
            params,
            population,
            learners,
            positions: vec![0; population + learners],
            pheromone: vec![0.0; width],
            on_turn: None,
            rng: build_rng(seed),
        }
    }

    pub fn from_env_params(params: &EnvParams, seed: Option<u64>) -> Result<Self> {
        Ok(Self::new(
            ToySwarmParams::from_env_params(params)?,
            params.population,
            params.learner_population,
            seed,
        ))
    }

    fn width(&self) -> usize {
        self.params.world_width
    }

    fn position(&self, agent: AgentId) -> Result<usize> {
        self.positions
            .get(agent.value())
            .copied()
            .ok_or_else(|| Error::environment(format!("unknown agent {agent}")))
    }

    fn step_towards(&self, from: usize, right: bool) -> usize {
        if right {
            (from + 1) % self.width()
        } else {
            (from + self.width() - 1) % self.width()
        }
    }

    fn random_step(&mut self, from: usize) -> usize {
        let right = self.rng.random_bool(0.5);
        self.step_towards(from, right)
    }

    fn ring_distance(&self, a: usize, b: usize) -> usize {
        let d = a.abs_diff(b);
        d.min(self.width() - d)
    }

    fn neighbours(&self, agent: usize) -> usize {
        let here = self.positions[agent];
        self.positions
            .iter()
            .enumerate()
            .filter(|(other, pos)| {
                *other != agent && self.ring_distance(here, **pos) <= self.params.cluster_radius
            })
            .count()
    }

    fn evaporate(&mut self) {
        let keep = self.params.evaporation;
        self.pheromone.iter_mut().for_each(|level| *level *= keep);
    }

    fn diffuse(&mut self) {
        let width = self.width();
        let share = self.params.diffusion / 2.0;
        let mut next: Vec<f64> = self
            .pheromone
            .iter()
            .map(|level| level * (1.0 - self.params.diffusion))
            .collect();
        for (cell, level) in self.pheromone.iter().enumerate() {
            next[(cell + 1) % width] += level * share;
            next[(cell + width - 1) % width] += level * share;
        }
        self.pheromone = next;
    }
}

impl Environment for ToySwarm {
    fn reset(&mut self) -> Result<()> {
        let width = self.width();
        for position in &mut self.positions {
            *position = self.rng.random_range(0..width);
        }
        self.pheromone.iter_mut().for_each(|level| *level = 0.0);
        self.on_turn = None;
        Ok(())
    }

    fn turn_order(&mut self, max_agents: usize) -> Result<Vec<AgentId>> {
        Ok((self.population..self.population + self.learners)
            .take(max_agents)
            .map(AgentId::new)
            .collect())
    }

    fn observe(&mut self, agent: AgentId) -> Result<AgentObservation> {
        let position = self.position(agent)?;
        let in_cluster = self.neighbours(agent.value()) >= self.params.cluster_threshold;
        let on_pheromone = self.pheromone[position] > self.params.sniff_threshold;
        let reward = if in_cluster {
            self.params.cluster_reward
        } else {
            self.params.lonely_penalty
        };
        self.on_turn = Some(agent);
        Ok(AgentObservation::new(
            Observation::from([in_cluster, on_pheromone]),
            reward,
        ))
    }

    fn step(&mut self, action: ActionId) -> Result<()> {
        let agent = self
            .on_turn
            .take()
            .ok_or_else(|| Error::environment("step called with no agent on turn"))?;
        let here = self.position(agent)?;
        let next = match action.value() {
            WALK => self.random_step(here),
            LAY_PHEROMONE => {
                self.pheromone[here] += self.params.lay_amount;
                here
            }
            FOLLOW_PHEROMONE => {
                let left = self.step_towards(here, false);
                let right = self.step_towards(here, true);
                let (l, r) = (self.pheromone[left], self.pheromone[right]);
                if l.max(r) <= self.pheromone[here] {
                    here
                } else if r >= l {
                    right
                } else {
                    left
                }
            }
            other => {
                return Err(Error::environment(format!("unknown action {other}")));
            }
        };
        self.positions[agent.value()] = next;
        Ok(())
    }

    fn finalize_tick(&mut self) -> Result<()> {
        for agent in 0..self.population {
            let here = self.positions[agent];
            self.positions[agent] = self.random_step(here);
        }
        self.evaporate();
        self.diffuse();
        Ok(())
    }

    fn cluster_metric(&self) -> Result<f64> {
        let width = self.width();
        let mut occupancy = vec![0usize; width];
        for &position in &self.positions {
            occupancy[position] += 1;
        }
        let Some(gap) = occupancy.iter().position(|count| *count == 0) else {
            // Every cell occupied: one cluster spanning the ring.
            return Ok(self.positions.len() as f64);
        };

        let mut clusters = Vec::new();
        let mut current = 0;
        for offset in 1..=width {
            let count = occupancy[(gap + offset) % width];
            if count > 0 {
                current += count;
            } else if current > 0 {
                clusters.push(current);
                current = 0;
            }
        }
        if clusters.is_empty() {
            return Ok(0.0);
        }
        Ok(clusters.iter().sum::<usize>() as f64 / clusters.len() as f64)
    }
}
