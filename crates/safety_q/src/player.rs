//! Greedy rollouts of a learned value table.

use crate::discretization::DiscretizationSpec;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::policy::greedy_action;
use crate::table::{self, ValueTable};
use std::ops::{Deref, DerefMut};
use tracing::info;

/// Plays episodes with the greedy policy of a value table, without exploring
/// or learning.
#[derive(Debug, Clone, Copy)]
pub struct GreedyPlayer<'a> {
    q_values: &'a ValueTable,
    discretization: &'a DiscretizationSpec,
    episode_length: Option<usize>,
    suppress_print: bool,
}

impl<'a> GreedyPlayer<'a> {
    pub fn new(q_values: &'a ValueTable, discretization: &'a DiscretizationSpec) -> Self {
        Self {
            q_values,
            discretization,
            episode_length: None,
            suppress_print: false,
        }
    }

    /// Caps every episode at `steps` steps.
    pub fn with_episode_length(mut self, steps: usize) -> Self {
        self.episode_length = Some(steps);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.suppress_print = true;
        self
    }

    /// Plays `num_episodes` episodes and returns their lengths.
    ///
    /// The step cap is checked before each step, so a cap of zero yields empty
    /// episodes. The environment is rendered after every step and closed
    /// exactly once when play ends, including on error.
    pub fn play<E>(&self, env: &mut E, num_episodes: usize) -> Result<Vec<usize>>
    where
        E: Environment + ?Sized,
    {
        let mut env = CloseOnDrop(env);
        table::check_shape(self.q_values, self.discretization, env.num_actions())?;
        let mut lengths = Vec::with_capacity(num_episodes);

        for episode in 0..num_episodes {
            let observation = env.reset().map_err(Error::Environment)?;
            let mut state = self.discretization.try_discretize(&observation)?;
            let mut length = 0;
            let mut done = false;

            while !done && self.episode_length.is_none_or(|max| length < max) {
                let action = greedy_action(self.q_values, &state);
                let step = env.step(action).map_err(Error::Environment)?;
                env.render();
                state = self.discretization.try_discretize(&step.observation)?;
                done = step.done;
                length += 1;
            }

            if !self.suppress_print {
                info!("Episode {} length: {}", episode, length);
            }
            lengths.push(length);
        }
        Ok(lengths)
    }
}

/// Closes the wrapped environment when dropped.
struct CloseOnDrop<'e, E: Environment + ?Sized>(&'e mut E);

impl<E: Environment + ?Sized> Deref for CloseOnDrop<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.0
    }
}

impl<E: Environment + ?Sized> DerefMut for CloseOnDrop<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.0
    }
}

impl<E: Environment + ?Sized> Drop for CloseOnDrop<'_, E> {
    fn drop(&mut self) {
        self.0.close();
    }
}
