//! Statistics collected during a training run.

use crate::discretization::DiscretizationSpec;
use crate::schedule::Hyperparameters;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// Summary of one finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Number of steps taken.
    pub length: usize,
    /// Mean signal over the episode.
    pub average_reward: f64,
    /// Smallest signal observed.
    pub min_reward: f64,
    /// Safety outcome of the whole trajectory.
    pub outcome: f64,
    /// Hyperparameters in effect when the episode ended.
    pub hyperparameters: Hyperparameters,
}

impl EpisodeSummary {
    /// Summarizes a non-empty signal sequence.
    pub fn from_signals(signals: &[f64], outcome: f64, hyperparameters: Hyperparameters) -> Self {
        let length = signals.len();
        let (sum, min) = signals
            .iter()
            .fold((0.0, f64::INFINITY), |(sum, min), &s| (sum + s, min.min(s)));
        let average_reward = if length == 0 {
            0.0
        } else {
            sum / length as f64
        };
        Self {
            length,
            average_reward,
            min_reward: if length == 0 { 0.0 } else { min },
            outcome,
            hyperparameters,
        }
    }
}

/// Per-episode and per-(state, action) statistics of one run.
///
/// Episode vectors are allocated to `max_episodes` up front and filled in
/// order; `episode` is the index of the last completed episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub start_time: String,
    pub episode_lengths: Vec<usize>,
    pub average_episode_rewards: Vec<f64>,
    pub true_min: Vec<f64>,
    pub episode_outcomes: Vec<f64>,
    pub state_action_visits: ArrayD<u64>,
    pub epsilon: Vec<f64>,
    pub learning_rate: Vec<f64>,
    pub gamma: Vec<f64>,
    pub state_bounds: Vec<(f64, f64)>,
    pub buckets: Vec<usize>,
    #[serde(rename = "type")]
    pub kind: String,
    pub environment: String,
    pub seed: u64,
    /// Schedule offset of the run; `0` unless it continued a warm start.
    #[serde(default)]
    pub start_episode: usize,
    pub episode: usize,
    episodes_completed: usize,
    pub time_elapsed: Option<f64>,
}

impl TrainingStats {
    /// Allocates statistics for a run over `spec` with `num_actions` actions.
    pub fn new(
        max_episodes: usize,
        spec: &DiscretizationSpec,
        num_actions: usize,
        environment: &str,
        seed: u64,
    ) -> Self {
        Self {
            start_time: chrono::Local::now().format("%b_%d_%y %H:%M:%S").to_string(),
            episode_lengths: vec![0; max_episodes],
            average_episode_rewards: vec![0.0; max_episodes],
            true_min: vec![0.0; max_episodes],
            episode_outcomes: vec![0.0; max_episodes],
            state_action_visits: ArrayD::zeros(IxDyn(&spec.table_shape(num_actions))),
            epsilon: vec![0.0; max_episodes],
            learning_rate: vec![0.0; max_episodes],
            gamma: vec![0.0; max_episodes],
            state_bounds: spec.state_bounds().to_vec(),
            buckets: spec.buckets().to_vec(),
            kind: "tabular q-learning".to_string(),
            environment: environment.to_string(),
            seed,
            start_episode: 0,
            episode: 0,
            episodes_completed: 0,
            time_elapsed: None,
        }
    }

    /// Records the schedule offset of a continued run.
    pub fn with_start_episode(mut self, start_episode: usize) -> Self {
        self.start_episode = start_episode;
        self
    }

    /// Index of the last recorded episode counted across resumed runs.
    pub fn global_episode(&self) -> usize {
        self.start_episode + self.episode
    }

    /// Number of episodes the statistics were allocated for.
    pub fn max_episodes(&self) -> usize {
        self.episode_lengths.len()
    }

    /// Number of episodes recorded so far.
    pub fn episodes_completed(&self) -> usize {
        self.episodes_completed
    }

    /// Increments and returns the visit count of a full `state ++ [action]` index.
    pub fn record_visit(&mut self, state_action: &[usize]) -> u64 {
        let count = &mut self.state_action_visits[state_action];
        *count += 1;
        *count
    }

    /// Visit count of a full `state ++ [action]` index.
    pub fn visits(&self, state_action: &[usize]) -> u64 {
        self.state_action_visits[state_action]
    }

    /// Stores the summary of episode `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= max_episodes()`.
    pub fn record_episode(&mut self, index: usize, summary: &EpisodeSummary) {
        self.episode_lengths[index] = summary.length;
        self.average_episode_rewards[index] = summary.average_reward;
        self.true_min[index] = summary.min_reward;
        self.episode_outcomes[index] = summary.outcome;
        self.learning_rate[index] = summary.hyperparameters.learning_rate;
        self.epsilon[index] = summary.hyperparameters.epsilon;
        self.gamma[index] = summary.hyperparameters.gamma;
        self.episode = index;
        self.episodes_completed = self.episodes_completed.max(index + 1);
    }

    /// Records the run's elapsed time in seconds.
    pub fn finish(&mut self, elapsed_secs: f64) {
        self.time_elapsed = Some(elapsed_secs);
    }

    /// Fraction of recorded episodes whose outcome is strictly above `threshold`.
    pub fn success_rate(&self, threshold: f64) -> f64 {
        let completed = &self.episode_outcomes[..self.episodes_completed];
        if completed.is_empty() {
            return 0.0;
        }
        let safe = completed.iter().filter(|&&o| o > threshold).count();
        safe as f64 / completed.len() as f64
    }

    /// Compares everything except the wall-clock fields.
    pub fn same_learning_record(&self, other: &Self) -> bool {
        Self {
            start_time: String::new(),
            time_elapsed: None,
            ..self.clone()
        } == Self {
            start_time: String::new(),
            time_elapsed: None,
            ..other.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Hyperparameters {
        Hyperparameters {
            learning_rate: 0.5,
            epsilon: 0.1,
            gamma: 0.9,
        }
    }

    fn stats(max_episodes: usize) -> TrainingStats {
        let spec = DiscretizationSpec::new(vec![3, 2], vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
        TrainingStats::new(max_episodes, &spec, 4, "test-env", 42)
    }

    #[test]
    fn test_preallocated() {
        let stats = stats(5);
        assert_eq!(stats.max_episodes(), 5);
        assert_eq!(stats.true_min.len(), 5);
        assert_eq!(stats.gamma.len(), 5);
        assert_eq!(stats.state_action_visits.shape(), &[3, 2, 4]);
        assert_eq!(stats.episodes_completed(), 0);
        assert_eq!(stats.kind, "tabular q-learning");
    }

    #[test]
    fn test_visit_counts_are_per_pair() {
        let mut stats = stats(1);
        for _ in 0..3 {
            stats.record_visit(&[0, 1, 2]);
            stats.record_visit(&[2, 0, 0]);
        }
        assert_eq!(stats.record_visit(&[0, 1, 2]), 4);
        assert_eq!(stats.visits(&[0, 1, 2]), 4);
        assert_eq!(stats.visits(&[2, 0, 0]), 3);
        assert_eq!(stats.visits(&[1, 1, 1]), 0);
    }

    #[test]
    fn test_episode_summary_from_signals() {
        let summary = EpisodeSummary::from_signals(&[1.0, -2.0, 4.0], -2.0, params());
        assert_eq!(summary.length, 3);
        assert_eq!(summary.average_reward, 1.0);
        assert_eq!(summary.min_reward, -2.0);
        assert_eq!(summary.outcome, -2.0);
    }

    #[test]
    fn test_record_episode() {
        let mut stats = stats(3);
        let summary = EpisodeSummary::from_signals(&[2.0, 4.0], 1.5, params());
        stats.record_episode(1, &summary);
        assert_eq!(stats.episode_lengths, vec![0, 2, 0]);
        assert_eq!(stats.average_episode_rewards[1], 3.0);
        assert_eq!(stats.true_min[1], 2.0);
        assert_eq!(stats.episode_outcomes[1], 1.5);
        assert_eq!(stats.learning_rate[1], 0.5);
        assert_eq!(stats.epsilon[1], 0.1);
        assert_eq!(stats.gamma[1], 0.9);
        assert_eq!(stats.episode, 1);
        assert_eq!(stats.episodes_completed(), 2);
    }

    #[test]
    fn test_global_episode_includes_offset() {
        assert_eq!(stats(1).global_episode(), 0);

        let mut resumed = stats(3).with_start_episode(10);
        let summary = EpisodeSummary::from_signals(&[1.0], 1.0, params());
        resumed.record_episode(2, &summary);
        assert_eq!(resumed.episode, 2);
        assert_eq!(resumed.global_episode(), 12);
    }

    #[test]
    fn test_success_rate() {
        let mut stats = stats(4);
        assert_eq!(stats.success_rate(0.0), 0.0);
        for (i, outcome) in [0.5, -0.1, 0.2].into_iter().enumerate() {
            let summary = EpisodeSummary::from_signals(&[outcome], outcome, params());
            stats.record_episode(i, &summary);
        }
        assert!((stats.success_rate(0.0) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_learning_record_ignores_clock() {
        let mut a = stats(2);
        let mut b = a.clone();
        b.start_time = "Jan_01_00 00:00:00".into();
        a.finish(1.0);
        b.finish(2.0);
        assert!(a.same_learning_record(&b));

        b.record_visit(&[0, 0, 0]);
        assert!(!a.same_learning_record(&b));
    }

    #[test]
    fn test_serializes_type_field() {
        let json = serde_json::to_string(&stats(1)).unwrap();
        assert!(json.contains("\"type\":\"tabular q-learning\""));
        assert!(json.contains("\"environment\":\"test-env\""));
        let restored: TrainingStats = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.buckets, vec![3, 2]);
    }
}
