//! Hyperparameter schedules.
//!
//! The learner asks three schedules for the learning rate, the exploration
//! rate and the discount factor. Each is a pure function of the episode index
//! and the visit count of the (state, action) pair just updated, so a schedule
//! may anneal per cell as well as per episode.
//!
//! Any `Fn(usize, u64) -> f64` is a [`Schedule`]; the structs below cover the
//! schedules used in practice and can be built from configuration through
//! [`ScheduleConfig`].

use serde::{Deserialize, Serialize};

/// A deterministic function of `(episode, visits)` producing one hyperparameter.
pub trait Schedule {
    /// Evaluates the schedule.
    fn value(&self, episode: usize, visits: u64) -> f64;
}

impl<F> Schedule for F
where
    F: Fn(usize, u64) -> f64,
{
    fn value(&self, episode: usize, visits: u64) -> f64 {
        self(episode, visits)
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constant(pub f64);

impl Schedule for Constant {
    fn value(&self, _episode: usize, _visits: u64) -> f64 {
        self.0
    }
}

/// `max(initial * decay^episode, minimum)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    pub initial: f64,
    pub decay: f64,
    pub minimum: f64,
}

impl Schedule for ExponentialDecay {
    fn value(&self, episode: usize, _visits: u64) -> f64 {
        let exponent = i32::try_from(episode).unwrap_or(i32::MAX);
        (self.initial * self.decay.powi(exponent)).max(self.minimum)
    }
}

/// `max(initial / visits^power, minimum)`, the visit-adaptive learning rate.
///
/// A visit count of zero is treated as one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisitDecay {
    pub initial: f64,
    pub power: f64,
    pub minimum: f64,
}

impl Schedule for VisitDecay {
    fn value(&self, _episode: usize, visits: u64) -> f64 {
        let visits = visits.max(1) as f64;
        (self.initial / visits.powf(self.power)).max(self.minimum)
    }
}

/// Stepped discount schedule.
///
/// The gap `1 - gamma` starts at `1 - initial` and halves every `half_life`
/// episodes; the result never exceeds `final_gamma`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteppedGamma {
    pub initial: f64,
    pub final_gamma: f64,
    pub half_life: usize,
}

impl Schedule for SteppedGamma {
    fn value(&self, episode: usize, _visits: u64) -> f64 {
        let halvings = episode / self.half_life.max(1);
        let exponent = i32::try_from(halvings).unwrap_or(i32::MAX);
        let gap = (1.0 - self.initial) * 0.5_f64.powi(exponent);
        (1.0 - gap).min(self.final_gamma)
    }
}

/// Serializable description of one of the built-in schedules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleConfig {
    Constant { value: f64 },
    ExponentialDecay { initial: f64, decay: f64, minimum: f64 },
    VisitDecay { initial: f64, power: f64, minimum: f64 },
    Stepped { initial: f64, final_gamma: f64, half_life: usize },
}

impl ScheduleConfig {
    /// Boxes the described schedule.
    pub fn build(&self) -> Box<dyn Schedule> {
        match *self {
            ScheduleConfig::Constant { value } => Box::new(Constant(value)),
            ScheduleConfig::ExponentialDecay {
                initial,
                decay,
                minimum,
            } => Box::new(ExponentialDecay {
                initial,
                decay,
                minimum,
            }),
            ScheduleConfig::VisitDecay {
                initial,
                power,
                minimum,
            } => Box::new(VisitDecay {
                initial,
                power,
                minimum,
            }),
            ScheduleConfig::Stepped {
                initial,
                final_gamma,
                half_life,
            } => Box::new(SteppedGamma {
                initial,
                final_gamma,
                half_life,
            }),
        }
    }
}

impl Schedule for ScheduleConfig {
    fn value(&self, episode: usize, visits: u64) -> f64 {
        match *self {
            ScheduleConfig::Constant { value } => Constant(value).value(episode, visits),
            ScheduleConfig::ExponentialDecay {
                initial,
                decay,
                minimum,
            } => ExponentialDecay {
                initial,
                decay,
                minimum,
            }
            .value(episode, visits),
            ScheduleConfig::VisitDecay {
                initial,
                power,
                minimum,
            } => VisitDecay {
                initial,
                power,
                minimum,
            }
            .value(episode, visits),
            ScheduleConfig::Stepped {
                initial,
                final_gamma,
                half_life,
            } => SteppedGamma {
                initial,
                final_gamma,
                half_life,
            }
            .value(episode, visits),
        }
    }
}

/// Schedule configs for the three hyperparameters, as read from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSetConfig {
    pub learning_rate: ScheduleConfig,
    pub epsilon: ScheduleConfig,
    pub gamma: ScheduleConfig,
}

impl Default for ScheduleSetConfig {
    fn default() -> Self {
        Self {
            learning_rate: ScheduleConfig::VisitDecay {
                initial: 1.0,
                power: 0.6,
                minimum: 0.01,
            },
            epsilon: ScheduleConfig::ExponentialDecay {
                initial: 0.9,
                decay: 0.999,
                minimum: 0.05,
            },
            gamma: ScheduleConfig::Stepped {
                initial: 0.7,
                final_gamma: 0.999_999,
                half_life: 5_000,
            },
        }
    }
}

/// The learning rate, exploration and discount schedules of one run.
pub struct Schedules {
    pub learning_rate: Box<dyn Schedule>,
    pub epsilon: Box<dyn Schedule>,
    pub gamma: Box<dyn Schedule>,
}

impl Schedules {
    /// Bundles three schedules.
    pub fn new(
        learning_rate: impl Schedule + 'static,
        epsilon: impl Schedule + 'static,
        gamma: impl Schedule + 'static,
    ) -> Self {
        Self {
            learning_rate: Box::new(learning_rate),
            epsilon: Box::new(epsilon),
            gamma: Box::new(gamma),
        }
    }

    /// Evaluates all three at `(episode, visits)`.
    pub fn evaluate(&self, episode: usize, visits: u64) -> Hyperparameters {
        Hyperparameters {
            learning_rate: self.learning_rate.value(episode, visits),
            epsilon: self.epsilon.value(episode, visits),
            gamma: self.gamma.value(episode, visits),
        }
    }
}

impl From<&ScheduleSetConfig> for Schedules {
    fn from(config: &ScheduleSetConfig) -> Self {
        Self {
            learning_rate: config.learning_rate.build(),
            epsilon: config.epsilon.build(),
            gamma: config.gamma.build(),
        }
    }
}

impl std::fmt::Debug for Schedules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedules").finish_non_exhaustive()
    }
}

/// One evaluation of the three schedules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// alpha
    pub learning_rate: f64,
    /// epsilon
    pub epsilon: f64,
    /// gamma
    pub gamma: f64,
}
