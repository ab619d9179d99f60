//! Post-hoc safety outcome of a finished episode.

/// Reduces an episode's signal sequence to per-step outcomes.
pub trait OutcomeReducer {
    /// Returns one outcome per step; element 0 summarizes the whole episode.
    fn outcomes(&self, signals: &[f64], gamma: f64) -> Vec<f64>;
}

/// The discounted running minimum used by the Safety Bellman Equation.
///
/// Computed backwards from the last step:
/// `o[T-1] = r[T-1]`, `o[t] = (1 - γ) r[t] + γ min(r[t], o[t+1])`.
/// With `γ = 1` this is the plain minimum of the suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct SbeOutcome;

impl OutcomeReducer for SbeOutcome {
    fn outcomes(&self, signals: &[f64], gamma: f64) -> Vec<f64> {
        let mut outcomes = vec![0.0; signals.len()];
        let Some((&last, rest)) = signals.split_last() else {
            return outcomes;
        };
        outcomes[rest.len()] = last;
        for (t, &signal) in rest.iter().enumerate().rev() {
            outcomes[t] = (1.0 - gamma) * signal + gamma * signal.min(outcomes[t + 1]);
        }
        outcomes
    }
}

impl<F> OutcomeReducer for F
where
    F: Fn(&[f64], f64) -> Vec<f64>,
{
    fn outcomes(&self, signals: &[f64], gamma: f64) -> Vec<f64> {
        self(signals, gamma)
    }
}
