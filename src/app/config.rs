//! Run configuration loaded from the simulation and learning parameter files.

use std::{fs, ops::Range, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    q_learning::{DecayMode, DecaySchedule, EpsilonScheduler, TdLearner, state::MAX_FEATURES},
    types::{ActionId, AgentId},
};

/// Positions of follow_pheromone, walk and lay_pheromone in the simulation's
/// action enumeration (walk = 0, lay_pheromone = 1, follow_pheromone = 2).
///
/// Summary rows and the log header always list action columns in this order,
/// whatever order the action list declares.
pub const REPORT_ORDER: [ActionId; 3] = [ActionId::new(2), ActionId::new(0), ActionId::new(1)];

fn default_observation_features() -> usize {
    2
}

/// Simulation parameters.
///
/// Only the population sizes and episode length are read by the learning
/// core. Every other key is kept verbatim so the run log can dump the whole
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvParams {
    /// Agents driven by the simulation itself
    pub population: usize,
    /// Agents driven by a Q-table
    pub learner_population: usize,
    /// Ticks per episode
    pub episode_ticks: usize,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Learning hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    /// Action names in the simulation's enumeration order
    pub actions: Vec<String>,
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Initial exploration rate
    pub epsilon: f64,
    /// Decay rate, interpreted according to `decay_mode`
    pub decay: f64,
    #[serde(default)]
    pub decay_mode: DecayMode,
    /// Lower bound for exponential decay
    #[serde(default)]
    pub epsilon_floor: f64,
    /// Exploration rate used during evaluation (defaults to `epsilon`)
    #[serde(default)]
    pub test_epsilon: Option<f64>,
    pub train_episodes: usize,
    pub test_episodes: usize,
    #[serde(rename = "TRAIN_LOG_EVERY", alias = "train_log_every")]
    pub train_log_every: usize,
    #[serde(rename = "TEST_LOG_EVERY", alias = "test_log_every")]
    pub test_log_every: usize,
    /// Stem of the run log file name
    #[serde(rename = "OUTPUT_FILE", alias = "output_file")]
    pub output_file: String,
    /// Boolean features per observation
    #[serde(default = "default_observation_features")]
    pub observation_features: usize,
}

/// Complete configuration for one training + evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub env: EnvParams,
    pub learning: LearningParams,
}

fn parse_section<T: serde::de::DeserializeOwned>(raw: &str, section: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|err| Error::config(format!("malformed {section} parameters: {err}")))
}

fn read_section(path: &Path, section: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|err| Error::io(format!("read {section} parameters '{}'", path.display()), err))
}

impl RunConfig {
    /// Load and validate both parameter files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a file cannot be read and
    /// [`Error::InvalidConfiguration`] if a parameter is missing, malformed
    /// or out of range.
    pub fn load(params_path: &Path, learning_params_path: &Path) -> Result<Self> {
        let params = read_section(params_path, "environment")?;
        let learning = read_section(learning_params_path, "learning")?;
        Self::from_json_strs(&params, &learning)
    }

    /// Parse and validate both parameter documents.
    pub fn from_json_strs(params: &str, learning_params: &str) -> Result<Self> {
        let config = Self {
            env: parse_section(params, "environment")?,
            learning: parse_section(learning_params, "learning")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every numeric parameter before any episode runs.
    pub fn validate(&self) -> Result<()> {
        let env = &self.env;
        let learning = &self.learning;

        if env.learner_population == 0 {
            return Err(Error::config("learner_population must be at least 1"));
        }
        if env.episode_ticks == 0 {
            return Err(Error::config("episode_ticks must be at least 1"));
        }
        if learning.actions.len() != REPORT_ORDER.len() {
            return Err(Error::config(format!(
                "expected {} actions (walk, lay_pheromone, follow_pheromone), got {}",
                REPORT_ORDER.len(),
                learning.actions.len()
            )));
        }
        if learning.train_log_every == 0 || learning.test_log_every == 0 {
            return Err(Error::config(
                "TRAIN_LOG_EVERY and TEST_LOG_EVERY must be at least 1",
            ));
        }
        if learning.observation_features == 0 || learning.observation_features > MAX_FEATURES {
            return Err(Error::config(format!(
                "observation_features must be in 1..={MAX_FEATURES}, got {}",
                learning.observation_features
            )));
        }
        if let Some(test_epsilon) = learning.test_epsilon {
            if !(0.0..=1.0).contains(&test_epsilon) {
                return Err(Error::config(format!(
                    "test_epsilon must be in [0, 1], got {test_epsilon}"
                )));
            }
        }
        if learning.output_file.trim().is_empty() {
            return Err(Error::config("OUTPUT_FILE must not be empty"));
        }

        self.learner()?;
        self.epsilon_scheduler()?;
        Ok(())
    }

    /// Learner ids, ascending.
    pub fn learner_ids(&self) -> Range<usize> {
        self.env.population..self.env.population + self.env.learner_population
    }

    /// First learner id, ascending.
    pub fn first_learner(&self) -> AgentId {
        AgentId::new(self.env.population)
    }

    pub fn num_actions(&self) -> usize {
        self.learning.actions.len()
    }

    /// Names of the reported actions in report order.
    pub fn report_action_names(&self) -> Vec<&str> {
        REPORT_ORDER
            .iter()
            .map(|action| self.learning.actions[action.value()].as_str())
            .collect()
    }

    pub fn learner(&self) -> Result<TdLearner> {
        TdLearner::new(self.learning.alpha, self.learning.gamma)
    }

    pub fn decay_schedule(&self) -> DecaySchedule {
        match self.learning.decay_mode {
            DecayMode::Multiplicative => DecaySchedule::Multiplicative {
                rate: self.learning.decay,
            },
            DecayMode::Exponential => DecaySchedule::Exponential {
                rate: self.learning.decay,
                floor: self.learning.epsilon_floor,
            },
        }
    }

    pub fn epsilon_scheduler(&self) -> Result<EpsilonScheduler> {
        EpsilonScheduler::new(self.learning.epsilon, self.decay_schedule())
    }

    /// Exploration rate for evaluation episodes.
    pub fn test_epsilon(&self) -> f64 {
        self.learning.test_epsilon.unwrap_or(self.learning.epsilon)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PARAMS: &str = r#"{
        "population": 4,
        "learner_population": 2,
        "episode_ticks": 3,
        "sniff_threshold": 0.9,
        "grid_size": 20
    }"#;

    pub(crate) const LEARNING: &str = r#"{
        "actions": ["random-walk", "drop-chemical", "move-toward-chemical"],
        "alpha": 0.5,
        "gamma": 0.9,
        "epsilon": 0.9,
        "decay": 0.99,
        "train_episodes": 4,
        "test_episodes": 2,
        "TRAIN_LOG_EVERY": 2,
        "TEST_LOG_EVERY": 1,
        "OUTPUT_FILE": "ql-test"
    }"#;

    fn with_learning(key: &str, value: serde_json::Value) -> String {
        let mut doc: serde_json::Value = serde_json::from_str(LEARNING).unwrap();
        doc[key] = value;
        doc.to_string()
    }

    #[test]
    fn test_parses_reference_documents() {
        let config = RunConfig::from_json_strs(PARAMS, LEARNING).unwrap();
        assert_eq!(config.env.population, 4);
        assert_eq!(config.learner_ids(), 4..6);
        assert_eq!(config.learning.train_log_every, 2);
        assert_eq!(config.learning.decay_mode, DecayMode::Multiplicative);
        assert_eq!(config.env.extra["grid_size"], 20);
        assert_eq!(config.test_epsilon(), 0.9);
    }

    #[test]
    fn test_report_order_names() {
        let config = RunConfig::from_json_strs(PARAMS, LEARNING).unwrap();
        assert_eq!(
            config.report_action_names(),
            vec!["move-toward-chemical", "random-walk", "drop-chemical"]
        );
    }

    #[test]
    fn test_missing_parameter_is_configuration_error() {
        let mut doc: serde_json::Value = serde_json::from_str(LEARNING).unwrap();
        doc.as_object_mut().unwrap().remove("alpha");
        let err = RunConfig::from_json_strs(PARAMS, &doc.to_string()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_malformed_parameter_is_configuration_error() {
        let learning = with_learning("gamma", serde_json::json!("high"));
        let err = RunConfig::from_json_strs(PARAMS, &learning).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_out_of_range_parameters_are_rejected() {
        for (key, value) in [
            ("alpha", serde_json::json!(0.0)),
            ("gamma", serde_json::json!(1.5)),
            ("epsilon", serde_json::json!(-0.1)),
            ("decay", serde_json::json!(0.0)),
            ("TRAIN_LOG_EVERY", serde_json::json!(0)),
        ] {
            let learning = with_learning(key, value);
            assert!(
                RunConfig::from_json_strs(PARAMS, &learning).is_err(),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn test_decay_mode_names_match_parser() {
        for (name, expected) in [
            ("normal", DecayMode::Multiplicative),
            ("Multiplicative", DecayMode::Multiplicative),
            (" EXPONENTIAL ", DecayMode::Exponential),
        ] {
            let learning = with_learning("decay_mode", serde_json::json!(name));
            let config = RunConfig::from_json_strs(PARAMS, &learning).unwrap();
            assert_eq!(config.learning.decay_mode, expected, "{name}");
        }
        let learning = with_learning("decay_mode", serde_json::json!("linear"));
        let err = RunConfig::from_json_strs(PARAMS, &learning).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_exponential_mode() {
        let mut doc: serde_json::Value = serde_json::from_str(LEARNING).unwrap();
        doc["decay_mode"] = serde_json::json!("exponential");
        doc["decay"] = serde_json::json!(0.01);
        doc["epsilon_floor"] = serde_json::json!(0.05);
        let config = RunConfig::from_json_strs(PARAMS, &doc.to_string()).unwrap();
        assert_eq!(
            config.decay_schedule(),
            DecaySchedule::Exponential {
                rate: 0.01,
                floor: 0.05
            }
        );
    }

    #[test]
    fn test_requires_three_actions() {
        let learning = with_learning("actions", serde_json::json!(["walk", "lay"]));
        assert!(RunConfig::from_json_strs(PARAMS, &learning).is_err());
    }
}
