//! Mapping between continuous states and discrete table indices.
//!
//! Each state dimension is split into a fixed number of equal-width buckets.
//! Values outside the configured bounds are clipped to the nearest edge
//! bucket, so [`DiscretizationSpec::discretize`] is total.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A discrete multi-index into the leading dimensions of a value table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateIndex(Vec<usize>);

impl StateIndex {
    /// Creates a `StateIndex` from raw bucket indices.
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Returns the bucket indices as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Returns the full table index of this state paired with `action`.
    pub fn with_action(&self, action: usize) -> Vec<usize> {
        let mut index = Vec::with_capacity(self.0.len() + 1);
        index.extend_from_slice(&self.0);
        index.push(action);
        index
    }

    /// Returns the number of state dimensions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the zero-dimensional state.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for StateIndex {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

/// Per-dimension bucket counts and bounds, fixed for a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpec", into = "RawSpec")]
pub struct DiscretizationSpec {
    buckets: Vec<usize>,
    state_bounds: Vec<(f64, f64)>,
    /// Interior edges per dimension, `buckets[i] - 1` of them, ascending.
    bin_edges: Vec<Vec<f64>>,
}

#[derive(Serialize, Deserialize)]
struct RawSpec {
    buckets: Vec<usize>,
    state_bounds: Vec<(f64, f64)>,
}

impl TryFrom<RawSpec> for DiscretizationSpec {
    type Error = Error;

    fn try_from(raw: RawSpec) -> Result<Self> {
        Self::new(raw.buckets, raw.state_bounds)
    }
}

impl From<DiscretizationSpec> for RawSpec {
    fn from(spec: DiscretizationSpec) -> Self {
        Self {
            buckets: spec.buckets,
            state_bounds: spec.state_bounds,
        }
    }
}

impl DiscretizationSpec {
    /// Creates a new spec after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the two lists differ in length, a bucket
    /// count is zero, or a dimension has `min >= max` (or a non-finite bound).
    pub fn new(buckets: Vec<usize>, state_bounds: Vec<(f64, f64)>) -> Result<Self> {
        if buckets.len() != state_bounds.len() {
            return Err(Error::Config(format!(
                "{} bucket counts given for {} state bounds",
                buckets.len(),
                state_bounds.len()
            )));
        }
        if buckets.is_empty() {
            return Err(Error::Config("discretization needs at least one dimension".into()));
        }
        for (dim, (&n, &(min, max))) in buckets.iter().zip(state_bounds.iter()).enumerate() {
            if n == 0 {
                return Err(Error::Config(format!("dimension {} has zero buckets", dim)));
            }
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(Error::Config(format!(
                    "dimension {} has invalid bounds ({}, {})",
                    dim, min, max
                )));
            }
        }

        let bin_edges = buckets
            .iter()
            .zip(state_bounds.iter())
            .map(|(&n, &(min, max))| {
                (1..n)
                    .map(|k| min + (max - min) * k as f64 / n as f64)
                    .collect()
            })
            .collect();

        Ok(Self {
            buckets,
            state_bounds,
            bin_edges,
        })
    }

    /// Bucket count per dimension.
    pub fn buckets(&self) -> &[usize] {
        &self.buckets
    }

    /// `(min, max)` per dimension.
    pub fn state_bounds(&self) -> &[(f64, f64)] {
        &self.state_bounds
    }

    /// Interior bucket edges per dimension.
    pub fn bin_edges(&self) -> &[Vec<f64>] {
        &self.bin_edges
    }

    /// Number of state dimensions.
    pub fn dims(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of discrete states.
    pub fn num_states(&self) -> usize {
        self.buckets.iter().product()
    }

    /// Shape of a value table over this discretization with `num_actions` actions.
    pub fn table_shape(&self, num_actions: usize) -> Vec<usize> {
        let mut shape = self.buckets.clone();
        shape.push(num_actions);
        shape
    }

    /// Maps a real-valued state to its bucket multi-index.
    ///
    /// Values are clipped to the bounds first. A value lying exactly on an
    /// interior edge belongs to the bucket above it; `max` belongs to the last
    /// bucket. NaN maps to bucket 0. Extra or missing dimensions are ignored
    /// (see [`try_discretize`](Self::try_discretize) for the checked form).
    pub fn discretize(&self, real_state: &[f64]) -> StateIndex {
        let indices = self
            .bin_edges
            .iter()
            .zip(self.state_bounds.iter())
            .zip(real_state.iter())
            .map(|((edges, &(min, max)), &value)| {
                let clipped = value.clamp(min, max);
                edges.partition_point(|edge| *edge <= clipped)
            })
            .collect();
        StateIndex(indices)
    }

    /// Like [`discretize`](Self::discretize) but rejects states of the wrong dimension.
    pub fn try_discretize(&self, real_state: &[f64]) -> Result<StateIndex> {
        if real_state.len() != self.dims() {
            return Err(Error::Config(format!(
                "state has {} dimensions, discretization expects {}",
                real_state.len(),
                self.dims()
            )));
        }
        Ok(self.discretize(real_state))
    }

    /// Returns the center point of the bucket at `index`.
    ///
    /// Only used to warm-fill a fresh value table from a margin function.
    pub fn discrete_to_real(&self, index: &[usize]) -> Vec<f64> {
        self.buckets
            .iter()
            .zip(self.state_bounds.iter())
            .zip(index.iter())
            .map(|((&n, &(min, max)), &k)| {
                let width = (max - min) / n as f64;
                min + (k as f64 + 0.5) * width
            })
            .collect()
    }
}
