//! # Safety Q - Tabular Q-learning for reachability
//!
//! Learns safe sets and safety controllers of continuous-state systems with
//! discrete actions, using tabular Q-learning and the Safety Bellman Equation.
//!
//! ## Overview
//!
//! In the safety setting the environment reports a signed margin `l(x)`
//! instead of a reward: positive while the state is safe, negative once a
//! constraint is violated. The value of a state is then the worst margin the
//! system will ever see under the best policy, and the backup becomes
//!
//! ```text
//! Q(s, a) ← (1 - α) Q(s, a) + α [ (1 - γ) l + γ min(l, max_a' Q(s', a')) ]
//! ```
//!
//! With `use_sbe = false` the learner falls back to the usual discounted-sum
//! backup `r + γ max_a' Q(s', a')`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          QLearner                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
//! │  │ Environment  │  │  Discretizer │  │    Schedules     │    │
//! │  │              │─►│              │  │                  │    │
//! │  │ • reset/step │  │ • bin edges  │  │ • α(ep, visits)  │    │
//! │  │ • margin l(x)│  │ • centers    │  │ • ε(ep, visits)  │    │
//! │  └──────▲───────┘  └──────┬───────┘  │ • γ(ep, visits)  │    │
//! │         │                 │          └────────┬─────────┘    │
//! │  ┌──────┴───────┐  ┌──────▼───────┐  ┌────────▼─────────┐    │
//! │  │  ε-greedy    │◄─│ Value table  │◄─│     Backup       │    │
//! │  │  selection   │  │ buckets ++ A │  │  SBE / standard  │    │
//! │  └──────────────┘  └──────┬───────┘  └──────────────────┘    │
//! │                           │                                  │
//! │                    ┌──────▼───────┐                          │
//! │                    │ Stats and    │                          │
//! │                    │ checkpoints  │                          │
//! │                    └──────────────┘                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use safety_q::envs::{DoubleIntegrator, DoubleIntegratorConfig};
//! use safety_q::{DiscretizationSpec, GreedyPlayer, QLearner, Schedules, ScheduleSetConfig, TrainerConfig};
//!
//! let env_config = DoubleIntegratorConfig::default();
//! let spec = DiscretizationSpec::new(vec![41, 41], env_config.state_bounds())?;
//! let mut env = DoubleIntegrator::new(env_config)?;
//!
//! let config = TrainerConfig::new(spec.clone())
//!     .with_max_episodes(20_000)
//!     .with_max_episode_length(Some(200))
//!     .with_seed(7);
//! let mut learner = QLearner::new(config, Schedules::from(&ScheduleSetConfig::default()));
//! let (q_values, stats) = learner.learn(&mut env)?;
//!
//! println!("safe episodes: {:.1}%", 100.0 * stats.success_rate(0.0));
//! GreedyPlayer::new(&q_values, &spec).with_episode_length(200).play(&mut env, 5)?;
//! ```
//!
//! ### Warm start
//!
//! ```rust,ignore
//! use safety_q::persistence::load_checkpoint;
//!
//! let mut checkpoint = load_checkpoint("runs/double_integrator_reachability-v0_episode_19999.json")?;
//! let config = config.with_start_episode(20_000);
//! let stats = QLearner::new(config, schedules).learn_from(&mut env, &mut checkpoint.q_values)?;
//! ```

pub mod backup;
pub mod config;
pub mod discretization;
pub mod env;
pub mod envs;
pub mod error;
pub mod outcome;
pub mod persistence;
pub mod player;
pub mod policy;
pub mod schedule;
pub mod stats;
pub mod table;
pub mod trainer;

pub use backup::{incremental_update, Backup, BackupMode, Transition};
pub use config::{ExperimentConfig, TrainerConfig};
pub use discretization::{DiscretizationSpec, StateIndex};
pub use env::{Environment, Step};
pub use error::{EnvError, Error, Result};
pub use outcome::{OutcomeReducer, SbeOutcome};
pub use persistence::{
    load_checkpoint, Checkpoint, Checkpointer, JsonCheckpointer, NoCheckpoint, PersistenceOptions,
};
pub use player::GreedyPlayer;
pub use policy::{greedy_action, select_action};
pub use schedule::{
    Constant, ExponentialDecay, Hyperparameters, Schedule, ScheduleConfig, ScheduleSetConfig,
    Schedules, SteppedGamma, VisitDecay,
};
pub use stats::{EpisodeSummary, TrainingStats};
pub use table::ValueTable;
pub use trainer::QLearner;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_experiment_builds_learner() {
        let experiment = ExperimentConfig::default();
        let learner = QLearner::new(
            experiment.trainer.clone(),
            Schedules::from(&experiment.schedules),
        );
        assert_eq!(learner.backup().mode, BackupMode::Safety);
        assert_eq!(learner.config().discretization.num_states(), 41 * 41);
    }
}
