//! The environment interface the learner and player drive.

use crate::discretization::DiscretizationSpec;
use crate::error::EnvError;
use rand::{Rng, RngCore};
use std::collections::HashMap;

/// The outcome of one environment step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    /// Real-valued next state.
    pub observation: Vec<f64>,
    /// Reward, or safety margin when learning with the safety backup.
    pub signal: f64,
    /// Whether the trajectory has terminated.
    pub done: bool,
    /// Diagnostic values; never read by the learner.
    pub info: HashMap<String, f64>,
}

impl Step {
    /// Creates a step with empty `info`.
    pub fn new(observation: Vec<f64>, signal: f64, done: bool) -> Self {
        Self {
            observation,
            signal,
            done,
            info: HashMap::new(),
        }
    }

    /// Attaches a diagnostic value.
    pub fn with_info(mut self, key: &str, value: f64) -> Self {
        self.info.insert(key.to_string(), value);
        self
    }
}

/// A continuous-state, discrete-action control environment.
///
/// Calls are synchronous; the learner completes each step, including the table
/// update, before issuing the next.
pub trait Environment {
    /// Identifier used to tag statistics and checkpoints.
    fn id(&self) -> &str;

    /// Number of discrete actions; actions are `0..num_actions()`.
    fn num_actions(&self) -> usize;

    /// Starts a new trajectory and returns its initial state.
    fn reset(&mut self) -> Result<Vec<f64>, EnvError>;

    /// Applies `action`.
    fn step(&mut self, action: usize) -> Result<Step, EnvError>;

    /// Samples a uniformly random action for exploration.
    ///
    /// `rng` is the learner's seeded generator, so the default keeps a run
    /// reproducible.
    fn sample_action(&mut self, rng: &mut dyn RngCore) -> usize {
        rng.random_range(0..self.num_actions())
    }

    /// Safety margin `l(x)` at a real-valued state; positive means safe.
    ///
    /// Used to warm-fill a fresh value table.
    fn margin(&self, state: &[f64]) -> f64;

    /// Informs the environment of the discretization in use.
    fn set_discretization(&mut self, _spec: &DiscretizationSpec) {}

    /// Draws the current state.
    fn render(&mut self) {}

    /// Releases the environment's resources.
    fn close(&mut self) {}
}
