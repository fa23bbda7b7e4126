//! ε-greedy action selection

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    q_learning::q_table::QTable,
    types::{ActionId, StateId},
};

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// ε-greedy policy over a learner's [`QTable`].
///
/// All randomness (the explore/exploit coin and the uniform draw) comes from
/// the injected generator, so a seeded engine reproduces a run exactly.
#[derive(Debug, Clone)]
pub struct PolicyEngine<R = StdRng> {
    num_actions: usize,
    rng: R,
}

impl PolicyEngine<StdRng> {
    /// Create an engine with a seeded (or entropy-seeded) generator.
    pub fn new(num_actions: usize, seed: Option<u64>) -> Self {
        Self::with_rng(num_actions, build_rng(seed))
    }
}

impl<R: Rng> PolicyEngine<R> {
    pub fn with_rng(num_actions: usize, rng: R) -> Self {
        assert!(num_actions > 0, "action space must not be empty");
        Self { num_actions, rng }
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Uniform draw over the action space.
    pub fn random_action(&mut self) -> ActionId {
        ActionId::new(self.rng.random_range(0..self.num_actions))
    }

    /// Explore with probability `epsilon`, otherwise act greedily.
    pub fn select_action(&mut self, table: &QTable, state: StateId, epsilon: f64) -> ActionId {
        if self.rng.random::<f64>() < epsilon {
            self.random_action()
        } else {
            table.argmax_action(state)
        }
    }
}
