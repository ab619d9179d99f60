//! Epsilon-greedy action selection over a value table.

use crate::discretization::StateIndex;
use crate::env::Environment;
use crate::table::{state_values, ValueTable};
use rand::Rng;

/// The action with the largest value; ties go to the lowest action index.
pub fn greedy_action(q_values: &ValueTable, state: &StateIndex) -> usize {
    let mut best_action = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (action, &value) in state_values(q_values, state).iter().enumerate() {
        if action == 0 || value > best_value {
            best_action = action;
            best_value = value;
        }
    }
    best_action
}

/// Epsilon-greedy selection.
///
/// One uniform draw is taken from `rng` on every call, whatever `epsilon` is.
/// Below `epsilon` the environment samples a random action (from the same
/// `rng`); otherwise the greedy action is returned.
pub fn select_action<E, R>(
    q_values: &ValueTable,
    state: &StateIndex,
    epsilon: f64,
    env: &mut E,
    rng: &mut R,
) -> usize
where
    E: Environment + ?Sized,
    R: Rng,
{
    if rng.random::<f64>() < epsilon {
        env.sample_action(rng)
    } else {
        greedy_action(q_values, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Step;
    use crate::error::EnvError;
    use ndarray::{ArrayD, IxDyn};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct ThreeActions;

    impl Environment for ThreeActions {
        fn id(&self) -> &str {
            "three-actions"
        }
        fn num_actions(&self) -> usize {
            3
        }
        fn reset(&mut self) -> Result<Vec<f64>, EnvError> {
            Ok(vec![0.0])
        }
        fn step(&mut self, _action: usize) -> Result<Step, EnvError> {
            Ok(Step::new(vec![0.0], 0.0, true))
        }
        fn margin(&self, _state: &[f64]) -> f64 {
            0.0
        }
    }

    fn table_with_row(row: &[f64]) -> ValueTable {
        let mut table = ArrayD::zeros(IxDyn(&[2, row.len()]));
        for (action, &value) in row.iter().enumerate() {
            table[[1, action].as_slice()] = value;
        }
        table
    }

    #[test]
    fn test_greedy_ties_go_to_lowest_index() {
        let table = table_with_row(&[0.5, 0.5, 0.2]);
        let state = StateIndex::new(vec![1]);
        let mut env = ThreeActions;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(select_action(&table, &state, 0.0, &mut env, &mut rng), 0);
        }
    }

    #[test]
    fn test_greedy_picks_strict_max() {
        let table = table_with_row(&[0.1, -0.3, 0.9]);
        assert_eq!(greedy_action(&table, &StateIndex::new(vec![1])), 2);
    }

    #[test]
    fn test_greedy_handles_all_negative_infinity() {
        let table = table_with_row(&[f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY]);
        assert_eq!(greedy_action(&table, &StateIndex::new(vec![1])), 0);
    }

    #[test]
    fn test_full_exploration_covers_all_actions() {
        let table = table_with_row(&[1.0, 0.0, 0.0]);
        let state = StateIndex::new(vec![1]);
        let mut env = ThreeActions;
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[select_action(&table, &state, 1.0, &mut env, &mut rng)] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_selection_is_reproducible_for_a_seed() {
        let table = table_with_row(&[1.0, 0.0, 0.0]);
        let state = StateIndex::new(vec![1]);
        let run = |seed: u64| {
            let mut env = ThreeActions;
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| select_action(&table, &state, 0.5, &mut env, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }
}
