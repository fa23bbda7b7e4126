//! Episode orchestration for independent learners in a shared environment

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::stats::{EpisodeReport, StatsAggregator};
use crate::{
    Error, Result,
    app::config::{REPORT_ORDER, RunConfig},
    ports::{Environment, Observer},
    q_learning::{
        EpsilonScheduler, PendingUpdate, PolicyEngine, QTable, QTableStore, StateEncoder,
        TdLearner,
    },
    types::{AgentId, RunPhase},
};

/// Dimensions and logging cadence of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSettings {
    /// Non-learning agents; learner ids start here
    pub population: usize,
    pub learner_population: usize,
    pub episode_ticks: usize,
    pub num_actions: usize,
    pub observation_features: usize,
    pub train_log_every: usize,
    pub test_log_every: usize,
    /// Seed for the policy's random source
    pub seed: Option<u64>,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            population: 0,
            learner_population: 1,
            episode_ticks: 100,
            num_actions: 3,
            observation_features: 2,
            train_log_every: 1,
            test_log_every: 1,
            seed: None,
        }
    }
}

impl EpisodeSettings {
    pub fn from_config(config: &RunConfig, seed: Option<u64>) -> Self {
        Self {
            population: config.env.population,
            learner_population: config.env.learner_population,
            episode_ticks: config.env.episode_ticks,
            num_actions: config.num_actions(),
            observation_features: config.learning.observation_features,
            train_log_every: config.learning.train_log_every,
            test_log_every: config.learning.test_log_every,
            seed,
        }
    }

    fn first_learner(&self) -> AgentId {
        AgentId::new(self.population)
    }
}

/// Where the orchestrator is in its episode/tick cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    Idle,
    EpisodeRunning { episode: usize },
    TickRunning { episode: usize, tick: usize },
    EpisodeDone { episode: usize },
    RunDone,
}

/// Outcome of a training or evaluation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub phase: RunPhase,
    pub episodes: usize,
    /// Rounded cluster metric per episode, in episode order
    pub cluster_by_episode: Vec<f64>,
    /// Exploration rate after the last episode
    pub final_epsilon: f64,
    /// Number of summary rows emitted
    pub summaries: usize,
}

impl RunResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

enum Tables<'a> {
    Learning(&'a mut QTableStore),
    Frozen(&'a QTableStore),
}

impl Tables<'_> {
    fn store(&self) -> &QTableStore {
        match self {
            Tables::Learning(store) => store,
            Tables::Frozen(store) => store,
        }
    }
}

/// Drives ticks and agent turns, composing encoder, policy, learner, epsilon
/// schedule and statistics around an [`Environment`].
///
/// Within a tick every learner acts once, in ascending id order, and each
/// action reaches the environment before the next agent observes. The reward
/// an agent observes at the start of its turn is credited to the (state,
/// action) it chose on its previous turn, which is carried across tick and
/// episode boundaries as a [`PendingUpdate`].
pub struct EpisodeOrchestrator {
    settings: EpisodeSettings,
    encoder: StateEncoder,
    learner: TdLearner,
    policy: PolicyEngine,
    epsilon: EpsilonScheduler,
    pending: Vec<Option<PendingUpdate>>,
    observers: Vec<Box<dyn Observer>>,
    state: OrchestratorState,
}

impl EpisodeOrchestrator {
    /// Create an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an empty learner
    /// population, zero ticks, an action space other than walk, lay and
    /// follow, a zero log interval or an unsupported observation width.
    pub fn new(
        settings: EpisodeSettings,
        learner: TdLearner,
        epsilon: EpsilonScheduler,
    ) -> Result<Self> {
        if settings.learner_population == 0 {
            return Err(Error::config("learner_population must be at least 1"));
        }
        if settings.episode_ticks == 0 {
            return Err(Error::config("episode_ticks must be at least 1"));
        }
        if settings.num_actions != REPORT_ORDER.len() {
            return Err(Error::config(format!(
                "expected {} actions (walk, lay_pheromone, follow_pheromone), got {}",
                REPORT_ORDER.len(),
                settings.num_actions
            )));
        }
        if settings.train_log_every == 0 || settings.test_log_every == 0 {
            return Err(Error::config("log intervals must be at least 1"));
        }
        let encoder = StateEncoder::new(settings.observation_features)?;
        Ok(Self {
            encoder,
            learner,
            policy: PolicyEngine::new(settings.num_actions, settings.seed),
            epsilon,
            pending: vec![None; settings.learner_population],
            observers: Vec::new(),
            state: OrchestratorState::Idle,
            settings,
        })
    }

    /// Build from a validated configuration.
    pub fn from_config(config: &RunConfig, seed: Option<u64>) -> Result<Self> {
        Self::new(
            EpisodeSettings::from_config(config, seed),
            config.learner()?,
            config.epsilon_scheduler()?,
        )
    }

    /// Add an observer to the orchestrator
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn settings(&self) -> &EpisodeSettings {
        &self.settings
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn epsilon(&self) -> &EpsilonScheduler {
        &self.epsilon
    }

    /// The (state, action) awaiting credit for `agent`, if it has acted.
    pub fn pending(&self, agent: AgentId) -> Option<PendingUpdate> {
        self.pending[self.learner_offset(agent)]
    }

    /// Zeroed tables sized for this run.
    pub fn create_store(&self) -> QTableStore {
        QTableStore::new(
            self.settings.population,
            self.settings.learner_population,
            self.encoder.num_states(),
            self.settings.num_actions,
        )
    }

    /// Run `episodes` training episodes, updating `store` in place.
    pub fn train<E>(
        &mut self,
        env: &mut E,
        store: &mut QTableStore,
        episodes: usize,
    ) -> Result<RunResult>
    where
        E: Environment + ?Sized,
    {
        self.run_phase(env, Tables::Learning(store), episodes, None)
    }

    /// Run `episodes` evaluation episodes with a frozen policy.
    ///
    /// Uses the same loop and ε-greedy selection as training at a fixed
    /// `epsilon`; no value update is ever applied.
    pub fn evaluate<E>(
        &mut self,
        env: &mut E,
        store: &QTableStore,
        episodes: usize,
        epsilon: f64,
    ) -> Result<RunResult>
    where
        E: Environment + ?Sized,
    {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(Error::config(format!(
                "evaluation epsilon must be in [0, 1], got {epsilon}"
            )));
        }
        self.run_phase(env, Tables::Frozen(store), episodes, Some(epsilon))
    }

    fn learner_offset(&self, agent: AgentId) -> usize {
        let first = self.settings.population;
        assert!(
            agent.value() >= first && agent.value() < first + self.settings.learner_population,
            "agent {agent} is not a learner"
        );
        agent.value() - first
    }

    fn check_store(&self, store: &QTableStore) -> Result<()> {
        let expected = self.create_store();
        let shape_matches = store.len() == expected.len()
            && store.agents().next() == expected.agents().next()
            && store.agents().all(|agent| {
                let table: &QTable = store.table(agent);
                table.num_states() == self.encoder.num_states()
                    && table.num_actions() == self.settings.num_actions
            });
        if shape_matches {
            Ok(())
        } else {
            Err(Error::config(format!(
                "Q-table store does not match run dimensions ({} learners from id {}, {} states, {} actions)",
                self.settings.learner_population,
                self.settings.population,
                self.encoder.num_states(),
                self.settings.num_actions
            )))
        }
    }

    fn check_turn_order(&self, order: &[AgentId]) -> Result<()> {
        let first = self.settings.population;
        let expected = first..first + self.settings.learner_population;
        if order.len() != self.settings.learner_population
            || !order
                .iter()
                .zip(expected.clone())
                .all(|(agent, id)| agent.value() == id)
        {
            let got: Vec<usize> = order.iter().map(AgentId::value).collect();
            return Err(Error::InvalidTurnOrder {
                message: format!("expected learners {expected:?} ascending, got {got:?}"),
            });
        }
        Ok(())
    }

    fn run_phase<E>(
        &mut self,
        env: &mut E,
        mut tables: Tables<'_>,
        episodes: usize,
        fixed_epsilon: Option<f64>,
    ) -> Result<RunResult>
    where
        E: Environment + ?Sized,
    {
        self.check_store(tables.store())?;

        let phase = match tables {
            Tables::Learning(_) => RunPhase::Training,
            Tables::Frozen(_) => RunPhase::Evaluation,
        };
        let log_interval = match phase {
            RunPhase::Training => self.settings.train_log_every,
            RunPhase::Evaluation => self.settings.test_log_every,
        };
        let mut stats = StatsAggregator::new(
            self.settings.first_learner(),
            self.settings.learner_population,
            self.settings.num_actions,
            self.settings.episode_ticks,
            log_interval,
        );

        info!(%phase, episodes, learners = self.settings.learner_population, "run started");
        for observer in &mut self.observers {
            observer.on_run_start(phase, episodes)?;
        }

        let mut cluster_by_episode = Vec::with_capacity(episodes);
        let mut summaries = 0;

        for episode in 1..=episodes {
            self.state = OrchestratorState::EpisodeRunning { episode };
            env.reset()?;
            stats.begin_episode(episode);
            for observer in &mut self.observers {
                observer.on_episode_start(phase, episode)?;
            }

            for tick in 1..=self.settings.episode_ticks {
                self.state = OrchestratorState::TickRunning { episode, tick };
                let epsilon = fixed_epsilon.unwrap_or_else(|| self.epsilon.current());

                let order = env.turn_order(self.settings.learner_population)?;
                self.check_turn_order(&order)?;

                for agent in order {
                    let perceived = env.observe(agent)?;
                    let state = self.encoder.encode(&perceived.observation)?;
                    let offset = self.learner_offset(agent);

                    let action = match &mut tables {
                        Tables::Learning(store) => match self.pending[offset] {
                            Some(previous) => {
                                self.learner
                                    .update(store, agent, previous, perceived.reward, state);
                                self.policy.select_action(store.table(agent), state, epsilon)
                            }
                            // First decision of the run: nothing to credit yet.
                            None => self.policy.random_action(),
                        },
                        Tables::Frozen(store) => {
                            self.policy.select_action(store.table(agent), state, epsilon)
                        }
                    };

                    env.step(action)?;
                    stats.record_decision(episode, agent, action, perceived.reward);

                    if phase == RunPhase::Training {
                        self.pending[offset] = Some(PendingUpdate { state, action });
                    }
                }

                env.finalize_tick()?;
            }

            self.state = OrchestratorState::EpisodeDone { episode };
            let epsilon = match fixed_epsilon {
                Some(epsilon) => epsilon,
                None => self.epsilon.decay(episode),
            };
            let cluster_metric = stats.record_episode_end(episode, env.cluster_metric()?);
            cluster_by_episode.push(cluster_metric);

            let report = EpisodeReport {
                phase,
                episode,
                epsilon,
                cluster_metric,
            };
            for observer in &mut self.observers {
                observer.on_episode_end(&report)?;
            }

            match stats.emit_summary(episode) {
                Some(row) => {
                    info!(%phase, episode, epsilon, cluster = cluster_metric, avg_reward = row.avg_reward, "episode");
                    for observer in &mut self.observers {
                        observer.on_summary(phase, &row)?;
                    }
                    summaries += 1;
                }
                None => debug!(%phase, episode, epsilon, cluster = cluster_metric, "episode"),
            }
        }

        self.state = OrchestratorState::RunDone;
        for observer in &mut self.observers {
            observer.on_run_end(phase)?;
        }
        info!(%phase, episodes, "run finished");

        Ok(RunResult {
            phase,
            episodes,
            cluster_by_episode,
            final_epsilon: fixed_epsilon.unwrap_or_else(|| self.epsilon.current()),
            summaries,
        })
    }
}
