//! Per-episode action histograms, rewards and summary rows

use serde::{Deserialize, Serialize};

use crate::{
    app::config::REPORT_ORDER,
    types::{ActionId, AgentId, RunPhase},
};

/// Round to two decimal places, as recorded in the run log.
///
/// Rounds the exact stored value, so `2.675` (stored just below the half)
/// gives `2.67`, and exact halves go to the even digit.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Counters for one episode, sized once from the run's dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episode: usize,
    /// Decisions per action across all learners
    pub global_counts: Vec<u64>,
    /// Decisions per (learner offset, action), row-major
    pub agent_counts: Vec<u64>,
    /// Rounded reward accumulated per learner offset
    pub agent_rewards: Vec<f64>,
    pub cluster_metric: f64,
}

impl EpisodeStats {
    fn new(episode: usize, learners: usize, num_actions: usize) -> Self {
        Self {
            episode,
            global_counts: vec![0; num_actions],
            agent_counts: vec![0; learners * num_actions],
            agent_rewards: vec![0.0; learners],
            cluster_metric: 0.0,
        }
    }

    /// Total decisions recorded this episode.
    pub fn total_decisions(&self) -> u64 {
        self.global_counts.iter().sum()
    }
}

/// One emitted log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub episode: usize,
    /// Absolute tick count at the end of the episode
    pub tick: usize,
    pub cluster_metric: f64,
    /// Global counts in report order
    pub global_counts: [u64; 3],
    /// Per-learner counts in report order, learners ascending
    pub learner_counts: Vec<(AgentId, [u64; 3])>,
    /// Mean over learners of reward per tick
    pub avg_reward: f64,
}

impl SummaryRow {
    /// Text fields in log column order.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.episode.to_string(),
            self.tick.to_string(),
            format!("{:?}", self.cluster_metric),
        ];
        record.extend(self.global_counts.iter().map(u64::to_string));
        for (_, counts) in &self.learner_counts {
            record.extend(counts.iter().map(u64::to_string));
        }
        record.push(format!("{:?}", self.avg_reward));
        record
    }
}

/// End-of-episode notification passed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub phase: RunPhase,
    pub episode: usize,
    /// Exploration rate in effect for the next episode
    pub epsilon: f64,
    /// Rounded cluster metric
    pub cluster_metric: f64,
}

/// Accumulates decisions for the running episode and builds summary rows.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    first_learner: usize,
    learners: usize,
    num_actions: usize,
    episode_ticks: usize,
    log_interval: usize,
    current: EpisodeStats,
}

impl StatsAggregator {
    pub fn new(
        first_learner: AgentId,
        learners: usize,
        num_actions: usize,
        episode_ticks: usize,
        log_interval: usize,
    ) -> Self {
        assert!(
            num_actions >= REPORT_ORDER.len(),
            "summary rows need at least {} actions",
            REPORT_ORDER.len()
        );
        assert!(log_interval > 0, "log interval must be positive");
        Self {
            first_learner: first_learner.value(),
            learners,
            num_actions,
            episode_ticks,
            log_interval,
            current: EpisodeStats::new(0, learners, num_actions),
        }
    }

    /// Discard the previous episode's counters and start `episode`.
    pub fn begin_episode(&mut self, episode: usize) {
        self.current = EpisodeStats::new(episode, self.learners, self.num_actions);
    }

    pub fn current(&self) -> &EpisodeStats {
        &self.current
    }

    fn offset(&self, agent: AgentId) -> usize {
        assert!(
            agent.value() >= self.first_learner
                && agent.value() < self.first_learner + self.learners,
            "agent {agent} is not a learner"
        );
        agent.value() - self.first_learner
    }

    fn check_episode(&self, episode: usize) {
        assert_eq!(
            episode, self.current.episode,
            "stats recorded for episode {episode} while episode {} is open",
            self.current.episode
        );
    }

    /// Count one decision and add its rounded reward.
    pub fn record_decision(&mut self, episode: usize, agent: AgentId, action: ActionId, reward: f64) {
        self.check_episode(episode);
        let offset = self.offset(agent);
        assert!(
            action.value() < self.num_actions,
            "action {action} out of range"
        );
        self.current.global_counts[action.value()] += 1;
        self.current.agent_counts[offset * self.num_actions + action.value()] += 1;
        self.current.agent_rewards[offset] += round2(reward);
    }

    /// Store the episode's cluster metric, rounded, and return it.
    pub fn record_episode_end(&mut self, episode: usize, cluster_metric: f64) -> f64 {
        self.check_episode(episode);
        self.current.cluster_metric = round2(cluster_metric);
        self.current.cluster_metric
    }

    pub fn should_emit(&self, episode: usize) -> bool {
        episode % self.log_interval == 0
    }

    /// Build the summary row for `episode` when it falls on the log interval.
    pub fn emit_summary(&self, episode: usize) -> Option<SummaryRow> {
        if !self.should_emit(episode) {
            return None;
        }
        self.check_episode(episode);

        let stats = &self.current;
        let reorder = |counts: &[u64]| REPORT_ORDER.map(|action| counts[action.value()]);

        let learner_counts = (0..self.learners)
            .map(|offset| {
                let start = offset * self.num_actions;
                (
                    AgentId::new(self.first_learner + offset),
                    reorder(&stats.agent_counts[start..start + self.num_actions]),
                )
            })
            .collect();

        let per_tick_sum: f64 = stats
            .agent_rewards
            .iter()
            .map(|total| total / self.episode_ticks as f64)
            .sum();
        let avg_reward = per_tick_sum / self.learners as f64;

        Some(SummaryRow {
            episode,
            tick: episode * self.episode_ticks,
            cluster_metric: stats.cluster_metric,
            global_counts: reorder(&stats.global_counts),
            learner_counts,
            avg_reward,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator(log_interval: usize) -> StatsAggregator {
        StatsAggregator::new(AgentId::new(5), 2, 3, 4, log_interval)
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(-0.004), -0.0);
    }

    #[test]
    fn test_round2_uses_stored_value_and_even_halves() {
        for (value, expected) in [
            (0.125, 0.12),
            (2.675, 2.67),
            (0.045, 0.04),
            (4.355, 4.36),
            (-0.125, -0.12),
            (0.615, 0.61),
            (1.115, 1.11),
        ] {
            assert_eq!(round2(value), expected, "round2({value})");
        }
    }

    #[test]
    fn test_counts_and_rewards() {
        let mut stats = aggregator(1);
        stats.begin_episode(1);
        stats.record_decision(1, AgentId::new(5), ActionId::new(0), 0.123);
        stats.record_decision(1, AgentId::new(6), ActionId::new(2), 1.0);
        stats.record_decision(1, AgentId::new(5), ActionId::new(2), 0.456);

        let current = stats.current();
        assert_eq!(current.global_counts, vec![1, 0, 2]);
        assert_eq!(current.agent_counts, vec![1, 0, 1, 0, 0, 1]);
        assert!((current.agent_rewards[0] - 0.58).abs() < 1e-12);
        assert_eq!(current.total_decisions(), 3);
    }

    #[test]
    fn test_summary_row_uses_report_order() {
        let mut stats = aggregator(2);
        stats.begin_episode(2);
        // Agent 5: walk x2, lay x1, follow x1; agent 6: follow x4
        for action in [0, 0, 1, 2] {
            stats.record_decision(2, AgentId::new(5), ActionId::new(action), 1.0);
        }
        for _ in 0..4 {
            stats.record_decision(2, AgentId::new(6), ActionId::new(2), 0.5);
        }
        stats.record_episode_end(2, 3.14159);

        let row = stats.emit_summary(2).unwrap();
        assert_eq!(row.tick, 8);
        assert_eq!(row.cluster_metric, 3.14);
        assert_eq!(row.global_counts, [5, 2, 1]);
        assert_eq!(row.learner_counts[0], (AgentId::new(5), [1, 2, 1]));
        assert_eq!(row.learner_counts[1], (AgentId::new(6), [4, 0, 0]));
        // (4.0 / 4 + 2.0 / 4) / 2
        assert!((row.avg_reward - 0.75).abs() < 1e-12);
        assert_eq!(
            row.to_record(),
            vec!["2", "8", "3.14", "5", "2", "1", "1", "2", "1", "4", "0", "0", "0.75"]
        );
    }

    #[test]
    fn test_record_keeps_decimal_point_on_whole_numbers() {
        let row = SummaryRow {
            episode: 1,
            tick: 4,
            cluster_metric: 3.0,
            global_counts: [4, 0, 0],
            learner_counts: vec![(AgentId::new(5), [4, 0, 0])],
            avg_reward: 1.0,
        };
        assert_eq!(
            row.to_record(),
            vec!["1", "4", "3.0", "4", "0", "0", "4", "0", "0", "1.0"]
        );
    }

    #[test]
    fn test_emit_respects_interval() {
        let mut stats = aggregator(3);
        stats.begin_episode(2);
        stats.record_episode_end(2, 1.0);
        assert!(stats.emit_summary(2).is_none());
        stats.begin_episode(3);
        stats.record_episode_end(3, 1.0);
        assert!(stats.emit_summary(3).is_some());
    }

    #[test]
    fn test_begin_episode_resets_counters() {
        let mut stats = aggregator(1);
        stats.begin_episode(1);
        stats.record_decision(1, AgentId::new(5), ActionId::new(1), 1.0);
        stats.begin_episode(2);
        assert_eq!(stats.current().total_decisions(), 0);
        assert_eq!(stats.current().agent_rewards, vec![0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "is not a learner")]
    fn test_rejects_non_learner() {
        let mut stats = aggregator(1);
        stats.begin_episode(1);
        stats.record_decision(1, AgentId::new(4), ActionId::new(0), 0.0);
    }
}
