//! One-step temporal difference update

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    q_learning::q_table::QTableStore,
    types::{ActionId, AgentId, StateId},
};

/// The (state, action) an agent chose on its previous turn.
///
/// The reward observed at the start of the agent's next turn is credited to
/// this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub state: StateId,
    pub action: ActionId,
}

/// Q-learning TD(0) update with fixed learning rate and discount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdLearner {
    learning_rate: f64,
    discount_factor: f64,
}

impl TdLearner {
    /// Create a learner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] unless α ∈ (0, 1] and
    /// γ ∈ [0, 1].
    pub fn new(learning_rate: f64, discount_factor: f64) -> Result<Self> {
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(Error::config(format!(
                "alpha must be in (0, 1], got {learning_rate}"
            )));
        }
        if !(0.0..=1.0).contains(&discount_factor) {
            return Err(Error::config(format!(
                "gamma must be in [0, 1], got {discount_factor}"
            )));
        }
        Ok(Self {
            learning_rate,
            discount_factor,
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Apply the update to `agent`'s previous pair and return the new value.
    ///
    /// Q(s,a) ← (1 − α)·Q(s,a) + α·(r + γ·max_a' Q(s',a'))
    pub fn update(
        &self,
        store: &mut QTableStore,
        agent: AgentId,
        previous: PendingUpdate,
        reward: f64,
        next_state: StateId,
    ) -> f64 {
        let table = store.table_mut(agent);
        let old_value = table.get(previous.state, previous.action);
        let next_max = table.max_over_actions(next_state);
        let new_value = (1.0 - self.learning_rate) * old_value
            + self.learning_rate * (reward + self.discount_factor * next_max);
        table.set(previous.state, previous.action, new_value);
        new_value
    }
}
