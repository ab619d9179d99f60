//! Reference environments.

mod double_integrator;

pub use double_integrator::{DoubleIntegrator, DoubleIntegratorConfig};
