//! Bellman backup operators.
//!
//! Two targets are supported:
//!
//! - **Standard**: the sum of discounted rewards,
//!   `r + γ · max_a' Q(s', a')`.
//! - **Safety** (Safety Bellman Equation): the discounted running minimum of
//!   the margin signal, `(1 - γ) · r + γ · min(r, max_a' Q(s', a'))`.
//!
//! When a trajectory terminates, the bootstrap term is replaced by the
//! fictitious terminal value if one is configured; otherwise the target is
//! the signal itself.

use crate::discretization::StateIndex;
use serde::{Deserialize, Serialize};

/// Selects the backup operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackupMode {
    /// Safety Bellman Equation backup.
    #[default]
    Safety,
    /// Sum of discounted rewards backup.
    Standard,
}

/// One environment transition, consumed by a single update.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: StateIndex,
    pub action: usize,
    /// Reward in standard mode, margin in safety mode.
    pub signal: f64,
    pub next_state: StateIndex,
    pub done: bool,
}

/// A configured backup operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub mode: BackupMode,
    pub fictitious_terminal_val: Option<f64>,
}

impl Backup {
    /// Creates a backup without a fictitious terminal value.
    pub fn new(mode: BackupMode) -> Self {
        Self {
            mode,
            fictitious_terminal_val: None,
        }
    }

    /// Sets the value assumed for every terminal transition.
    pub fn with_fictitious_terminal(mut self, value: f64) -> Self {
        self.fictitious_terminal_val = Some(value);
        self
    }

    /// Target for a transition that ended the trajectory.
    pub fn terminal_target(&self, signal: f64, gamma: f64) -> f64 {
        match (self.mode, self.fictitious_terminal_val) {
            (BackupMode::Safety, Some(terminal)) => {
                (1.0 - gamma) * signal + gamma * signal.min(terminal)
            }
            (BackupMode::Standard, Some(terminal)) => signal + gamma * terminal,
            (_, None) => signal,
        }
    }

    /// Target for a transition that bootstraps from the next state.
    pub fn non_terminal_target(&self, signal: f64, gamma: f64, next_value_max: f64) -> f64 {
        match self.mode {
            BackupMode::Safety => (1.0 - gamma) * signal + gamma * signal.min(next_value_max),
            BackupMode::Standard => signal + gamma * next_value_max,
        }
    }

    /// Target for a transition; `next_value_max` is read from the table before
    /// the update is applied and is ignored when `done`.
    pub fn target(&self, signal: f64, gamma: f64, done: bool, next_value_max: f64) -> f64 {
        if done {
            self.terminal_target(signal, gamma)
        } else {
            self.non_terminal_target(signal, gamma, next_value_max)
        }
    }
}

impl Default for Backup {
    fn default() -> Self {
        Self::new(BackupMode::default())
    }
}

/// `(1 - α) · old + α · target`.
pub fn incremental_update(old: f64, target: f64, learning_rate: f64) -> f64 {
    (1.0 - learning_rate) * old + learning_rate * target
}
