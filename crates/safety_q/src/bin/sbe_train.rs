//! Safety Q trainer
//!
//! Trains a tabular safety value function on the double integrator and
//! optionally rolls out the greedy policy.

use clap::Parser;
use safety_q::envs::DoubleIntegrator;
use safety_q::{
    ExperimentConfig, GreedyPlayer, JsonCheckpointer, PersistenceOptions, QLearner, Result,
    Schedules,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tabular Q-learning with the Safety Bellman Equation
#[derive(Parser, Debug)]
#[command(name = "sbe-train")]
#[command(version)]
#[command(about = "Learn a safe set of the double integrator", long_about = None)]
struct Args {
    /// Experiment configuration (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of training episodes
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Override the random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write checkpoints into this directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Greedy episodes to play after training
    #[arg(long, default_value_t = 0)]
    play: usize,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => "safety_q=info",
        1 => "safety_q=debug",
        _ => "safety_q=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut experiment = match &args.config {
        Some(path) => ExperimentConfig::from_toml(&std::fs::read_to_string(path)?)?,
        None => ExperimentConfig::default(),
    };
    if let Some(episodes) = args.episodes {
        experiment.trainer.max_episodes = episodes;
    }
    if let Some(seed) = args.seed {
        experiment.trainer.seed = seed;
        experiment.environment.seed = seed;
    }
    if args.checkpoint_dir.is_some() {
        experiment.checkpoint_dir = args.checkpoint_dir;
    }
    experiment.validate()?;

    if args.print_config {
        print!("{}", experiment.to_toml()?);
        return Ok(());
    }

    let mut env = DoubleIntegrator::new(experiment.environment.clone())?;
    let mut learner = QLearner::new(
        experiment.trainer.clone(),
        Schedules::from(&experiment.schedules),
    );
    if let Some(dir) = &experiment.checkpoint_dir {
        let mut checkpointer =
            JsonCheckpointer::new(dir).with_options(PersistenceOptions::readable());
        if let Some(max) = experiment.max_checkpoints {
            checkpointer = checkpointer.with_max_checkpoints(max);
        }
        learner = learner.with_checkpointer(checkpointer);
    }

    let (q_values, stats) = learner.learn(&mut env)?;
    tracing::info!(
        "Safe episodes: {:.1}% over {} episodes",
        100.0 * stats.success_rate(0.0),
        stats.episodes_completed()
    );

    if args.play > 0 {
        let mut player = GreedyPlayer::new(&q_values, &experiment.trainer.discretization);
        if let Some(length) = experiment.trainer.max_episode_length {
            player = player.with_episode_length(length);
        }
        let lengths = player.play(&mut env, args.play)?;
        let mean = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        tracing::info!("Greedy rollouts: mean length {:.1}", mean);
    }

    Ok(())
}
