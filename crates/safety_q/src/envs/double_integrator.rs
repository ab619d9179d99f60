//! Double-integrator reachability problem.
//!
//! A point mass on a line with position `x` and velocity `v`, driven by one of
//! three accelerations. The safe set is an interval of positions; the margin
//! `l(x, v)` is the signed distance to its nearest end. A trajectory ends when
//! the state leaves the simulated box.

use crate::discretization::DiscretizationSpec;
use crate::env::{Environment, Step};
use crate::error::{EnvError, Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Parameters of the [`DoubleIntegrator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleIntegratorConfig {
    /// Integration step.
    pub dt: f64,
    /// Magnitude of the applied acceleration.
    pub acceleration: f64,
    /// Safe interval of positions.
    pub safe_position: (f64, f64),
    /// Simulated position range.
    pub position_bounds: (f64, f64),
    /// Simulated velocity range.
    pub velocity_bounds: (f64, f64),
    /// Seed of the reset distribution.
    pub seed: u64,
}

impl Default for DoubleIntegratorConfig {
    fn default() -> Self {
        Self {
            dt: 0.05,
            acceleration: 1.0,
            safe_position: (-1.0, 1.0),
            position_bounds: (-2.0, 2.0),
            velocity_bounds: (-2.0, 2.0),
            seed: 0,
        }
    }
}

impl DoubleIntegratorConfig {
    /// `[position_bounds, velocity_bounds]`, the natural discretization bounds.
    pub fn state_bounds(&self) -> Vec<(f64, f64)> {
        vec![self.position_bounds, self.velocity_bounds]
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let ordered = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && lo < hi;
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(Error::Config(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.acceleration > 0.0 && self.acceleration.is_finite()) {
            return Err(Error::Config(format!(
                "acceleration must be positive, got {}",
                self.acceleration
            )));
        }
        if !ordered(self.safe_position)
            || !ordered(self.position_bounds)
            || !ordered(self.velocity_bounds)
        {
            return Err(Error::Config("double integrator bounds must be ordered".into()));
        }
        Ok(())
    }
}

/// The double-integrator environment.
#[derive(Debug, Clone)]
pub struct DoubleIntegrator {
    config: DoubleIntegratorConfig,
    state: [f64; 2],
    rng: StdRng,
    discretization: Option<DiscretizationSpec>,
}

impl DoubleIntegrator {
    /// Accelerations applied by actions 0, 1 and 2, in units of `acceleration`.
    pub const ACTIONS: [f64; 3] = [-1.0, 0.0, 1.0];

    /// Creates the environment after validating `config`.
    pub fn new(config: DoubleIntegratorConfig) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            state: [0.0, 0.0],
            rng,
            discretization: None,
        })
    }

    /// Current `(x, v)`.
    pub fn state(&self) -> [f64; 2] {
        self.state
    }

    /// Places the system at a given state.
    pub fn set_state(&mut self, state: [f64; 2]) {
        self.state = state;
    }

    /// The discretization announced by the learner, if any.
    pub fn discretization(&self) -> Option<&DiscretizationSpec> {
        self.discretization.as_ref()
    }

    fn in_bounds(&self, [x, v]: [f64; 2]) -> bool {
        let (x_lo, x_hi) = self.config.position_bounds;
        let (v_lo, v_hi) = self.config.velocity_bounds;
        (x_lo..=x_hi).contains(&x) && (v_lo..=v_hi).contains(&v)
    }
}

impl Environment for DoubleIntegrator {
    fn id(&self) -> &str {
        "double_integrator_reachability-v0"
    }

    fn num_actions(&self) -> usize {
        Self::ACTIONS.len()
    }

    fn reset(&mut self) -> std::result::Result<Vec<f64>, EnvError> {
        let (x_lo, x_hi) = self.config.position_bounds;
        let (v_lo, v_hi) = self.config.velocity_bounds;
        self.state = [
            self.rng.random_range(x_lo..x_hi),
            self.rng.random_range(v_lo..v_hi),
        ];
        Ok(self.state.to_vec())
    }

    fn step(&mut self, action: usize) -> std::result::Result<Step, EnvError> {
        let direction = Self::ACTIONS
            .get(action)
            .ok_or_else(|| format!("invalid action {} for double integrator", action))?;
        let [x, v] = self.state;
        let u = direction * self.config.acceleration;
        let next = [x + v * self.config.dt, v + u * self.config.dt];

        self.state = next;
        let margin = self.margin(&next);
        let done = !self.in_bounds(next);
        Ok(Step::new(next.to_vec(), margin, done).with_info("acceleration", u))
    }

    fn margin(&self, state: &[f64]) -> f64 {
        let (lo, hi) = self.config.safe_position;
        let x = state.first().copied().unwrap_or(0.0);
        (x - lo).min(hi - x)
    }

    fn set_discretization(&mut self, spec: &DiscretizationSpec) {
        self.discretization = Some(spec.clone());
    }

    fn render(&mut self) {
        trace!(x = self.state[0], v = self.state[1], "double integrator");
    }

    fn close(&mut self) {
        debug!("closing {}", self.id());
    }
}
