//! The tabular Q-learning loop.
//!
//! [`QLearner`] runs epsilon-greedy episodes against an [`Environment`],
//! backing every transition up into a dense [`ValueTable`] with either the
//! Safety Bellman Equation or the standard discounted backup. Hyperparameters
//! come from [`Schedules`] evaluated after each step at
//! `(episode + start_episode, visits)`, where `visits` is the post-increment
//! count of the pair just taken.
//!
//! A fresh run ([`QLearner::learn`]) allocates the table and warm-fills it
//! with the environment's margin at each bucket center. A warm start
//! ([`QLearner::learn_from`]) keeps training a caller-supplied table in place.
//!
//! Runs are deterministic for a given seed, configuration and deterministic
//! environment: every random draw comes from one generator seeded at the start
//! of the run.

use crate::backup::{incremental_update, Backup, Transition};
use crate::config::TrainerConfig;
use crate::discretization::DiscretizationSpec;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::outcome::{OutcomeReducer, SbeOutcome};
use crate::persistence::{Checkpointer, NoCheckpoint};
use crate::policy::select_action;
use crate::schedule::{Hyperparameters, Schedules};
use crate::stats::{EpisodeSummary, TrainingStats};
use crate::table::{self, ValueTable};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tabular Q-learner.
pub struct QLearner {
    config: TrainerConfig,
    schedules: Schedules,
    backup: Backup,
    outcome: Box<dyn OutcomeReducer>,
    checkpointer: Box<dyn Checkpointer>,
}

impl QLearner {
    /// Creates a learner that never checkpoints and scores episodes with [`SbeOutcome`].
    pub fn new(config: TrainerConfig, schedules: Schedules) -> Self {
        let backup = config.backup();
        Self {
            config,
            schedules,
            backup,
            outcome: Box::new(SbeOutcome),
            checkpointer: Box::new(NoCheckpoint),
        }
    }

    /// Hands checkpoints to `checkpointer`.
    pub fn with_checkpointer(mut self, checkpointer: impl Checkpointer + 'static) -> Self {
        self.checkpointer = Box::new(checkpointer);
        self
    }

    /// Replaces the per-episode outcome reducer.
    pub fn with_outcome_reducer(mut self, reducer: impl OutcomeReducer + 'static) -> Self {
        self.outcome = Box::new(reducer);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn backup(&self) -> &Backup {
        &self.backup
    }

    /// Trains a freshly allocated, warm-filled table.
    ///
    /// Fails with [`Error::Config`] if `start_episode` is set, since an offset
    /// only makes sense when continuing from an existing table.
    pub fn learn<E>(&mut self, env: &mut E) -> Result<(ValueTable, TrainingStats)>
    where
        E: Environment + ?Sized,
    {
        self.check_common(&*env)?;
        if let Some(start) = self.config.start_episode {
            return Err(Error::Config(format!(
                "start_episode ({}) requires a warm-start value table",
                start
            )));
        }
        self.warn_unbounded();

        let spec = &self.config.discretization;
        let mut q_values = table::warm_filled(spec, env.num_actions(), |state| env.margin(state));
        let stats = self.run(env, &mut q_values, 0)?;
        Ok((q_values, stats))
    }

    /// Continues training `q_values` in place.
    ///
    /// The table must have shape `buckets ++ [num_actions]`; otherwise
    /// [`Error::ShapeMismatch`] is returned before the environment is touched.
    pub fn learn_from<E>(&mut self, env: &mut E, q_values: &mut ValueTable) -> Result<TrainingStats>
    where
        E: Environment + ?Sized,
    {
        self.check_common(&*env)?;
        table::check_shape(q_values, &self.config.discretization, env.num_actions())?;
        if self.config.start_episode.is_none() {
            warn!(
                "warm start without start_episode: schedules restart from episode 0 \
                 and may produce undesired hyperparameters"
            );
        }
        self.warn_unbounded();

        let start = self.config.start_episode.unwrap_or(0);
        self.run(env, q_values, start)
    }

    fn check_common<E>(&self, env: &E) -> Result<()>
    where
        E: Environment + ?Sized,
    {
        self.config.validate()?;
        if env.num_actions() == 0 {
            return Err(Error::Config(format!(
                "environment {} has no actions",
                env.id()
            )));
        }
        Ok(())
    }

    fn warn_unbounded(&self) {
        if self.config.max_episode_length.is_none() {
            warn!("max_episode_length is not set, episodes run until the environment ends them");
        }
    }

    fn run<E>(
        &mut self,
        env: &mut E,
        q_values: &mut ValueTable,
        start_episode: usize,
    ) -> Result<TrainingStats>
    where
        E: Environment + ?Sized,
    {
        let started = Instant::now();
        let spec = self.config.discretization.clone();
        let max_episodes = self.config.max_episodes;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut stats = TrainingStats::new(
            max_episodes,
            &spec,
            env.num_actions(),
            env.id(),
            self.config.seed,
        )
        .with_start_episode(start_episode);
        env.set_discretization(&spec);

        info!(
            environment = env.id(),
            episodes = max_episodes,
            start_episode,
            backup = ?self.backup.mode,
            "starting training"
        );

        // Carried across episode boundaries: the first action of an episode
        // uses the epsilon left by the previous one.
        let mut params = self.schedules.evaluate(start_episode, 1);

        for episode in 0..max_episodes {
            if !self.config.suppress_print && (episode + 1) % self.config.progress_interval == 0 {
                info!(
                    "Episode {}/{} alpha:{:.4} gamma:{:.6} epsilon:{:.4}",
                    episode + 1,
                    max_episodes,
                    params.learning_rate,
                    params.gamma,
                    params.epsilon
                );
            }

            let summary = self.run_episode(
                env,
                q_values,
                &spec,
                &mut stats,
                &mut rng,
                &mut params,
                episode + start_episode,
            )?;
            stats.record_episode(episode, &summary);
            debug!(
                episode,
                length = summary.length,
                outcome = summary.outcome,
                "episode finished"
            );

            if let Some(freq) = self.config.save_freq {
                if episode % freq == 0 {
                    self.checkpointer.save(q_values, &stats, env.id())?;
                }
            }
        }

        stats.finish(started.elapsed().as_secs_f64());
        self.checkpointer.save(q_values, &stats, env.id())?;
        info!(
            elapsed = ?stats.time_elapsed,
            "finished {} episodes",
            stats.episodes_completed()
        );
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_episode<E>(
        &self,
        env: &mut E,
        q_values: &mut ValueTable,
        spec: &DiscretizationSpec,
        stats: &mut TrainingStats,
        rng: &mut StdRng,
        params: &mut Hyperparameters,
        schedule_episode: usize,
    ) -> Result<EpisodeSummary>
    where
        E: Environment + ?Sized,
    {
        let observation = env.reset().map_err(Error::Environment)?;
        let mut state = spec.try_discretize(&observation)?;
        let mut signals = Vec::new();

        loop {
            let action = select_action(q_values, &state, params.epsilon, env, rng);
            let step = env.step(action).map_err(Error::Environment)?;
            let next_state = spec.try_discretize(&step.observation)?;
            signals.push(step.signal);

            let visits = stats.record_visit(&state.with_action(action));
            *params = self.schedules.evaluate(schedule_episode, visits);

            let transition = Transition {
                state,
                action,
                signal: step.signal,
                next_state,
                done: step.done,
            };
            self.update(q_values, &transition, params);
            state = transition.next_state;

            let truncated = self
                .config
                .max_episode_length
                .is_some_and(|max| signals.len() >= max);
            if transition.done || truncated {
                break;
            }
        }

        let outcome = self
            .outcome
            .outcomes(&signals, params.gamma)
            .first()
            .copied()
            .unwrap_or(0.0);
        Ok(EpisodeSummary::from_signals(&signals, outcome, *params))
    }

    /// Backs one transition up into `q_values`.
    fn update(&self, q_values: &mut ValueTable, transition: &Transition, params: &Hyperparameters) {
        // Read before write: the target sees the table as it was before this step.
        let next_value_max = table::max_value(q_values, &transition.next_state);
        let target = self.backup.target(
            transition.signal,
            params.gamma,
            transition.done,
            next_value_max,
        );
        let cell = &mut q_values[transition.state.with_action(transition.action).as_slice()];
        *cell = incremental_update(*cell, target, params.learning_rate);
    }
}

impl std::fmt::Debug for QLearner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QLearner")
            .field("config", &self.config)
            .field("schedules", &self.schedules)
            .field("backup", &self.backup)
            .finish_non_exhaustive()
    }
}
