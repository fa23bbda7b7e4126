//! Dense per-agent Q-tables

use serde::{Deserialize, Serialize};

use crate::types::{ActionId, AgentId, StateId};

/// Q-table mapping (state, action) pairs to Q-values
///
/// Stored as a dense row-major `states × actions` matrix. All entries start
/// at zero. Indexing outside the declared dimensions panics: a silently
/// clamped index would corrupt learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    num_states: usize,
    num_actions: usize,
    q_values: Vec<f64>,
}

impl QTable {
    /// Create a zero-initialized table.
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        Self {
            num_states,
            num_actions,
            q_values: vec![0.0; num_states * num_actions],
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn offset(&self, state: StateId, action: ActionId) -> usize {
        assert!(
            state.value() < self.num_states,
            "state {state} out of range (table has {} states)",
            self.num_states
        );
        assert!(
            action.value() < self.num_actions,
            "action {action} out of range (table has {} actions)",
            self.num_actions
        );
        state.value() * self.num_actions + action.value()
    }

    fn row(&self, state: StateId) -> &[f64] {
        assert!(
            state.value() < self.num_states,
            "state {state} out of range (table has {} states)",
            self.num_states
        );
        let start = state.value() * self.num_actions;
        &self.q_values[start..start + self.num_actions]
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: StateId, action: ActionId) -> f64 {
        self.q_values[self.offset(state, action)]
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: StateId, action: ActionId, value: f64) {
        let offset = self.offset(state, action);
        self.q_values[offset] = value;
    }

    /// Maximum Q-value over all actions in a state
    pub fn max_over_actions(&self, state: StateId) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action for a state; ties go to the lowest action id
    pub fn argmax_action(&self, state: StateId) -> ActionId {
        let mut best = 0;
        let row = self.row(state);
        for (action, value) in row.iter().enumerate().skip(1) {
            if *value > row[best] {
                best = action;
            }
        }
        ActionId::new(best)
    }
}

/// One [`QTable`] per learner, addressed by agent id.
///
/// Learner ids form the contiguous range `first_learner..first_learner + len`.
/// Each table is only ever touched on behalf of its own agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableStore {
    first_learner: usize,
    tables: Vec<QTable>,
}

impl QTableStore {
    /// Create zeroed tables for `learners` agents starting at `first_learner`.
    pub fn new(first_learner: usize, learners: usize, num_states: usize, num_actions: usize) -> Self {
        Self {
            first_learner,
            tables: (0..learners)
                .map(|_| QTable::new(num_states, num_actions))
                .collect(),
        }
    }

    /// Number of learner tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate over learner ids in ascending order.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        (self.first_learner..self.first_learner + self.tables.len()).map(AgentId::new)
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        agent.value() >= self.first_learner
            && agent.value() < self.first_learner + self.tables.len()
    }

    fn index(&self, agent: AgentId) -> usize {
        assert!(
            self.contains(agent),
            "agent {agent} is not a learner (learners are {}..{})",
            self.first_learner,
            self.first_learner + self.tables.len()
        );
        agent.value() - self.first_learner
    }

    /// Borrow an agent's table.
    pub fn table(&self, agent: AgentId) -> &QTable {
        &self.tables[self.index(agent)]
    }

    /// Mutably borrow an agent's table.
    pub fn table_mut(&mut self, agent: AgentId) -> &mut QTable {
        let index = self.index(agent);
        &mut self.tables[index]
    }

    pub fn get(&self, agent: AgentId, state: StateId, action: ActionId) -> f64 {
        self.table(agent).get(state, action)
    }

    pub fn set(&mut self, agent: AgentId, state: StateId, action: ActionId, value: f64) {
        self.table_mut(agent).set(state, action, value);
    }

    pub fn max_over_actions(&self, agent: AgentId, state: StateId) -> f64 {
        self.table(agent).max_over_actions(state)
    }

    pub fn argmax_action(&self, agent: AgentId, state: StateId) -> ActionId {
        self.table(agent).argmax_action(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: usize) -> StateId {
        StateId::new(v)
    }

    fn a(v: usize) -> ActionId {
        ActionId::new(v)
    }

    #[test]
    fn test_qtable_initialization() {
        let qtable = QTable::new(4, 3);
        for state in 0..4 {
            for action in 0..3 {
                assert_eq!(qtable.get(s(state), a(action)), 0.0);
            }
        }
    }

    #[test]
    fn test_qtable_set_get() {
        let mut qtable = QTable::new(4, 3);
        qtable.set(s(2), a(1), 1.5);
        assert_eq!(qtable.get(s(2), a(1)), 1.5);
        assert_eq!(qtable.get(s(1), a(2)), 0.0);
    }

    #[test]
    fn test_max_over_actions() {
        let mut qtable = QTable::new(4, 3);
        qtable.set(s(0), a(0), 0.5);
        qtable.set(s(0), a(1), 1.5);
        qtable.set(s(0), a(2), 0.8);
        assert_eq!(qtable.max_over_actions(s(0)), 1.5);
    }

    #[test]
    fn test_argmax_action() {
        let mut qtable = QTable::new(4, 3);
        qtable.set(s(3), a(0), 0.5);
        qtable.set(s(3), a(2), 0.8);
        assert_eq!(qtable.argmax_action(s(3)), a(2));
    }

    #[test]
    fn test_argmax_ties_pick_lowest_action() {
        let mut qtable = QTable::new(4, 3);
        assert_eq!(qtable.argmax_action(s(1)), a(0));
        qtable.set(s(1), a(1), 2.0);
        qtable.set(s(1), a(2), 2.0);
        assert_eq!(qtable.argmax_action(s(1)), a(1));
    }

    #[test]
    fn test_argmax_with_negative_values() {
        let mut qtable = QTable::new(1, 3);
        qtable.set(s(0), a(0), -1.0);
        qtable.set(s(0), a(1), -0.5);
        qtable.set(s(0), a(2), -2.0);
        assert_eq!(qtable.argmax_action(s(0)), a(1));
        assert_eq!(qtable.max_over_actions(s(0)), -0.5);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_state_out_of_range_panics() {
        let qtable = QTable::new(4, 3);
        qtable.get(s(4), a(0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_action_out_of_range_panics() {
        let mut qtable = QTable::new(4, 3);
        qtable.set(s(0), a(3), 1.0);
    }

    #[test]
    fn test_store_partitions_by_agent() {
        let mut store = QTableStore::new(10, 2, 4, 3);
        store.set(AgentId::new(10), s(0), a(1), 1.0);
        assert_eq!(store.get(AgentId::new(10), s(0), a(1)), 1.0);
        assert_eq!(store.get(AgentId::new(11), s(0), a(1)), 0.0);
        let agents: Vec<_> = store.agents().map(|agent| agent.value()).collect();
        assert_eq!(agents, vec![10, 11]);
    }

    #[test]
    #[should_panic(expected = "is not a learner")]
    fn test_store_rejects_non_learner() {
        let store = QTableStore::new(10, 2, 4, 3);
        store.get(AgentId::new(9), s(0), a(0));
    }
}
