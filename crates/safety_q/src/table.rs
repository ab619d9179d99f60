//! Dense value tables indexed by `state ++ [action]`.

use crate::discretization::{DiscretizationSpec, StateIndex};
use crate::error::{Error, Result};
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Axis, Dimension, IxDyn};

/// Action values over a discretized state space, shape `buckets ++ [num_actions]`.
pub type ValueTable = ArrayD<f64>;

/// Returns the action values of `state` as a one-dimensional view.
pub fn state_values<'a>(q_values: &'a ValueTable, state: &StateIndex) -> ArrayViewD<'a, f64> {
    let mut view = q_values.view();
    for &bucket in state.as_slice() {
        view = view.index_axis_move(Axis(0), bucket);
    }
    view
}

/// Mutable view of the action values of `state`.
pub fn state_values_mut<'a>(
    q_values: &'a mut ValueTable,
    state: &StateIndex,
) -> ArrayViewMutD<'a, f64> {
    let mut view = q_values.view_mut();
    for &bucket in state.as_slice() {
        view = view.index_axis_move(Axis(0), bucket);
    }
    view
}

/// Largest action value at `state`.
pub fn max_value(q_values: &ValueTable, state: &StateIndex) -> f64 {
    state_values(q_values, state)
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Fails with [`Error::ShapeMismatch`] unless the table is `buckets ++ [num_actions]`.
pub fn check_shape(
    q_values: &ValueTable,
    spec: &DiscretizationSpec,
    num_actions: usize,
) -> Result<()> {
    let expected = spec.table_shape(num_actions);
    if q_values.shape() != expected.as_slice() {
        return Err(Error::ShapeMismatch {
            expected,
            found: q_values.shape().to_vec(),
        });
    }
    Ok(())
}

/// Allocates a table whose every action value at a state is `margin` evaluated
/// at that state's bucket center.
pub fn warm_filled<F>(spec: &DiscretizationSpec, num_actions: usize, margin: F) -> ValueTable
where
    F: Fn(&[f64]) -> f64,
{
    let mut q_values = ArrayD::zeros(IxDyn(&spec.table_shape(num_actions)));
    for index in ndarray::indices(IxDyn(spec.buckets())) {
        let state = StateIndex::new(index.slice().to_vec());
        let value = margin(&spec.discrete_to_real(state.as_slice()));
        state_values_mut(&mut q_values, &state).fill(value);
    }
    q_values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DiscretizationSpec {
        DiscretizationSpec::new(vec![2, 3], vec![(0.0, 2.0), (0.0, 3.0)]).unwrap()
    }

    #[test]
    fn test_state_values_views_row() {
        let mut table: ValueTable = ArrayD::zeros(IxDyn(&[2, 3, 2]));
        table[[1, 2, 0].as_slice()] = 4.0;
        table[[1, 2, 1].as_slice()] = -1.0;
        let state = StateIndex::new(vec![1, 2]);

        let row: Vec<f64> = state_values(&table, &state).iter().copied().collect();
        assert_eq!(row, vec![4.0, -1.0]);
        assert_eq!(max_value(&table, &state), 4.0);
        assert_eq!(max_value(&table, &StateIndex::new(vec![0, 0])), 0.0);
    }

    #[test]
    fn test_state_values_mut_writes_through() {
        let mut table: ValueTable = ArrayD::zeros(IxDyn(&[2, 3, 2]));
        let state = StateIndex::new(vec![0, 1]);
        state_values_mut(&mut table, &state).fill(7.0);
        assert_eq!(table[[0, 1, 0].as_slice()], 7.0);
        assert_eq!(table[[0, 1, 1].as_slice()], 7.0);
        assert_eq!(table.sum(), 14.0);
    }

    #[test]
    fn test_check_shape() {
        let spec = spec();
        let good: ValueTable = ArrayD::zeros(IxDyn(&[2, 3, 4]));
        assert!(check_shape(&good, &spec, 4).is_ok());

        let wrong_buckets: ValueTable = ArrayD::zeros(IxDyn(&[3, 2, 4]));
        match check_shape(&wrong_buckets, &spec, 4) {
            Err(Error::ShapeMismatch { expected, found }) => {
                assert_eq!(expected, vec![2, 3, 4]);
                assert_eq!(found, vec![3, 2, 4]);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(check_shape(&good, &spec, 5).is_err());
        let wrong_rank: ValueTable = ArrayD::zeros(IxDyn(&[2, 4]));
        assert!(check_shape(&wrong_rank, &spec, 4).is_err());
    }

    #[test]
    fn test_warm_filled_uses_bucket_centers() {
        let spec = spec();
        let table = warm_filled(&spec, 2, |state| state[0] * 10.0 + state[1]);
        assert_eq!(table.shape(), &[2, 3, 2]);
        // Centers are 0.5/1.5 and 0.5/1.5/2.5.
        assert_eq!(table[[0, 0, 0].as_slice()], 5.5);
        assert_eq!(table[[0, 0, 1].as_slice()], 5.5);
        assert_eq!(table[[1, 2, 1].as_slice()], 17.5);
    }

    #[test]
    fn test_warm_filled_calls_margin_once_per_state() {
        let spec = spec();
        let calls = std::cell::Cell::new(0);
        let _ = warm_filled(&spec, 5, |_| {
            calls.set(calls.get() + 1);
            0.0
        });
        assert_eq!(calls.get(), spec.num_states());
    }
}
