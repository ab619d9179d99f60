//! Configuration for training runs and experiments.

use crate::backup::{Backup, BackupMode};
use crate::discretization::DiscretizationSpec;
use crate::envs::DoubleIntegratorConfig;
use crate::error::{Error, Result};
use crate::schedule::ScheduleSetConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings of a single tabular learning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of episodes to run.
    pub max_episodes: usize,
    /// Step cap per episode. `None` runs until the environment reports `done`.
    pub max_episode_length: Option<usize>,
    /// Episode offset for the schedules when continuing from a warm start.
    pub start_episode: Option<usize>,
    /// Seed of the run's random number generator.
    pub seed: u64,
    /// Value assumed for every terminal transition, if any.
    pub fictitious_terminal_val: Option<f64>,
    /// Use the Safety Bellman Equation backup instead of discounted rewards.
    pub use_sbe: bool,
    /// Checkpoint every `save_freq` episodes (episode 0 included).
    pub save_freq: Option<usize>,
    /// Silence per-episode progress logging.
    pub suppress_print: bool,
    /// Episodes between progress log lines.
    pub progress_interval: usize,
    /// State discretization; fixes the leading shape of the value table.
    pub discretization: DiscretizationSpec,
}

impl TrainerConfig {
    /// Creates a configuration with defaults for everything but the discretization.
    pub fn new(discretization: DiscretizationSpec) -> Self {
        Self {
            max_episodes: 1_000,
            discretization,
            max_episode_length: Some(1_000),
            start_episode: None,
            seed: 0,
            fictitious_terminal_val: None,
            use_sbe: true,
            save_freq: None,
            suppress_print: false,
            progress_interval: 100,
        }
    }

    /// Sets the number of episodes.
    pub fn with_max_episodes(mut self, episodes: usize) -> Self {
        self.max_episodes = episodes;
        self
    }

    /// Sets (or removes) the per-episode step cap.
    pub fn with_max_episode_length(mut self, length: Option<usize>) -> Self {
        self.max_episode_length = length;
        self
    }

    /// Sets the schedule offset for a warm-started run.
    pub fn with_start_episode(mut self, episode: usize) -> Self {
        self.start_episode = Some(episode);
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the fictitious terminal value.
    pub fn with_fictitious_terminal(mut self, value: f64) -> Self {
        self.fictitious_terminal_val = Some(value);
        self
    }

    /// Chooses between the safety and the standard backup.
    pub fn with_sbe(mut self, enabled: bool) -> Self {
        self.use_sbe = enabled;
        self
    }

    /// Sets the checkpoint interval.
    pub fn with_save_freq(mut self, episodes: usize) -> Self {
        self.save_freq = Some(episodes);
        self
    }

    /// Silences progress logging.
    pub fn quiet(mut self) -> Self {
        self.suppress_print = true;
        self
    }

    /// The backup operator described by this configuration.
    pub fn backup(&self) -> Backup {
        let mode = if self.use_sbe {
            BackupMode::Safety
        } else {
            BackupMode::Standard
        };
        Backup {
            mode,
            fictitious_terminal_val: self.fictitious_terminal_val,
        }
    }

    /// Checks the settings that do not depend on the environment.
    pub fn validate(&self) -> Result<()> {
        if self.save_freq == Some(0) {
            return Err(Error::Config("save_freq must be positive".into()));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config("progress_interval must be positive".into()));
        }
        if let Some(value) = self.fictitious_terminal_val {
            if !value.is_finite() {
                return Err(Error::Config(format!(
                    "fictitious_terminal_val must be finite, got {}",
                    value
                )));
            }
        }
        Ok(())
    }
}

/// A complete experiment: trainer settings, schedules, environment and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Directory for checkpoints; `None` disables checkpointing.
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,
    /// Checkpoint files to keep; `None` keeps all of them.
    #[serde(default)]
    pub max_checkpoints: Option<usize>,
    pub trainer: TrainerConfig,
    #[serde(default)]
    pub schedules: ScheduleSetConfig,
    #[serde(default)]
    pub environment: DoubleIntegratorConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let environment = DoubleIntegratorConfig::default();
        let discretization = DiscretizationSpec::new(vec![41, 41], environment.state_bounds())
            .unwrap_or_else(|_| unreachable!("default double integrator bounds are valid"));
        Self {
            checkpoint_dir: None,
            max_checkpoints: None,
            trainer: TrainerConfig::new(discretization)
                .with_max_episodes(20_000)
                .with_max_episode_length(Some(200)),
            schedules: ScheduleSetConfig::default(),
            environment,
        }
    }
}

impl ExperimentConfig {
    /// Load configuration from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.trainer.validate()?;
        self.environment.validate()?;
        if self.trainer.discretization.dims() != 2 {
            return Err(Error::Config(format!(
                "the double integrator has 2 state dimensions, discretization has {}",
                self.trainer.discretization.dims()
            )));
        }
        if self.max_checkpoints == Some(0) {
            return Err(Error::Config("max_checkpoints must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DiscretizationSpec {
        DiscretizationSpec::new(vec![5], vec![(0.0, 1.0)]).unwrap()
    }

    #[test]
    fn test_trainer_defaults() {
        let config = TrainerConfig::new(spec());
        assert!(config.use_sbe);
        assert_eq!(config.start_episode, None);
        assert_eq!(config.progress_interval, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = TrainerConfig::new(spec())
            .with_max_episodes(10)
            .with_max_episode_length(None)
            .with_start_episode(3)
            .with_seed(9)
            .with_fictitious_terminal(-1.0)
            .with_sbe(false)
            .with_save_freq(2)
            .quiet();
        assert_eq!(config.max_episodes, 10);
        assert_eq!(config.max_episode_length, None);
        assert_eq!(config.start_episode, Some(3));
        assert_eq!(config.seed, 9);
        assert_eq!(config.save_freq, Some(2));
        assert!(config.suppress_print);

        let backup = config.backup();
        assert_eq!(backup.mode, BackupMode::Standard);
        assert_eq!(backup.fictitious_terminal_val, Some(-1.0));
    }

    #[test]
    fn test_validate_rejects_zero_save_freq() {
        let config = TrainerConfig::new(spec()).with_save_freq(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_nan_terminal_value() {
        let config = TrainerConfig::new(spec()).with_fictitious_terminal(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_experiment_is_valid() {
        let config = ExperimentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trainer.discretization.buckets(), &[41, 41]);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ExperimentConfig::default();
        let toml = config.to_toml().unwrap();
        let parsed = ExperimentConfig::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_toml_minimal() {
        let text = r#"
            [trainer]
            max_episodes = 50
            seed = 3
            use_sbe = true
            suppress_print = true
            progress_interval = 10
            max_episode_length = 100

            [trainer.discretization]
            buckets = [11, 11]
            state_bounds = [[-2.0, 2.0], [-2.0, 2.0]]
        "#;
        let config = ExperimentConfig::from_toml(text).unwrap();
        assert_eq!(config.trainer.max_episodes, 50);
        assert_eq!(config.trainer.fictitious_terminal_val, None);
        assert_eq!(config.checkpoint_dir, None);
    }

    #[test]
    fn test_toml_rejects_bad_bounds() {
        let text = r#"
            [trainer]
            max_episodes = 5
            seed = 0
            use_sbe = true
            suppress_print = true
            progress_interval = 1

            [trainer.discretization]
            buckets = [4, 4]
            state_bounds = [[1.0, -1.0], [0.0, 1.0]]
        "#;
        assert!(ExperimentConfig::from_toml(text).is_err());
    }
}
