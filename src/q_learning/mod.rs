//! Independent tabular Q-learning
//!
//! Every learner owns one dense [`QTable`]; nothing is shared between
//! agents. The pieces compose as follows:
//!
//! | Piece | Role |
//! |-------|------|
//! | [`StateEncoder`] | Boolean observation → dense state id |
//! | [`QTableStore`] | One table per learner, keyed by agent id |
//! | [`PolicyEngine`] | ε-greedy action selection |
//! | [`TdLearner`] | One-step TD(0) update |
//! | [`EpsilonScheduler`] | Per-episode exploration decay |
//!
//! ## Usage Example
//!
//! ```
//! use slime_marl::q_learning::{PendingUpdate, QTableStore, StateEncoder, TdLearner};
//! use slime_marl::types::{ActionId, AgentId, Observation};
//!
//! let encoder = StateEncoder::default();
//! let mut store = QTableStore::new(0, 1, encoder.num_states(), 3);
//! let learner = TdLearner::new(0.5, 0.9)?;
//!
//! let agent = AgentId::new(0);
//! let state = encoder.encode(&Observation::from([false, false]))?;
//! let previous = PendingUpdate { state, action: ActionId::new(1) };
//! learner.update(&mut store, agent, previous, 1.0, state);
//!
//! assert_eq!(store.get(agent, state, ActionId::new(1)), 0.5);
//! # Ok::<(), slime_marl::Error>(())
//! ```

pub mod epsilon;
pub mod learner;
pub mod policy;
pub mod q_table;
pub mod state;

pub use epsilon::{DecayMode, DecaySchedule, EpsilonScheduler};
pub use learner::{PendingUpdate, TdLearner};
pub use policy::PolicyEngine;
pub use q_table::{QTable, QTableStore};
pub use state::StateEncoder;
