//! Checkpointing of value tables and training statistics.
//!
//! The learner hands its table and statistics to a [`Checkpointer`] every
//! `save_freq` episodes and once more when the run ends. [`JsonCheckpointer`]
//! writes one JSON file per checkpoint; [`load_checkpoint`] reads one back so
//! a later run can warm start from it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use safety_q::persistence::{load_checkpoint, JsonCheckpointer};
//!
//! let checkpointer = JsonCheckpointer::new("runs/double_integrator").with_max_checkpoints(5);
//! let mut learner = QLearner::new(config, schedules).with_checkpointer(checkpointer);
//! learner.learn(&mut env)?;
//!
//! // Later, resume
//! let mut checkpoint = load_checkpoint(path)?;
//! learner.learn_from(&mut env, &mut checkpoint.q_values)?;
//! ```

use crate::error::{Error, Result};
use crate::stats::TrainingStats;
use crate::ValueTable;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Receives the value table and statistics at checkpoint time.
pub trait Checkpointer {
    /// Persists one checkpoint.
    fn save(
        &mut self,
        q_values: &ValueTable,
        stats: &TrainingStats,
        environment_id: &str,
    ) -> Result<()>;
}

/// Discards every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheckpoint;

impl Checkpointer for NoCheckpoint {
    fn save(&mut self, _: &ValueTable, _: &TrainingStats, _: &str) -> Result<()> {
        Ok(())
    }
}

/// A value table together with the statistics of the run that produced it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Checkpoint {
    pub q_values: ValueTable,
    pub stats: TrainingStats,
}

#[derive(Serialize)]
struct CheckpointRef<'a> {
    q_values: &'a ValueTable,
    stats: &'a TrainingStats,
}

/// Options for writing checkpoint files.
#[derive(Debug, Clone, Default)]
pub struct PersistenceOptions {
    /// If `true`, pretty-prints JSON output to be more human-readable.
    pub pretty: bool,
}

impl PersistenceOptions {
    /// Returns options optimized for human-readability (pretty-printed JSON).
    pub fn readable() -> Self {
        Self { pretty: true }
    }
}

/// Writes checkpoints as JSON files under a directory.
///
/// Files are named `<environment>_episode_<n>.json`, where `n` counts episodes
/// across resumed runs (`start_episode + episode`). When a retention limit is
/// set, the oldest files written by this checkpointer are deleted once the
/// limit is exceeded.
#[derive(Debug, Clone)]
pub struct JsonCheckpointer {
    /// The directory where checkpoint files are stored.
    checkpoint_dir: PathBuf,
    /// The maximum number of checkpoint files to keep.
    max_checkpoints: Option<usize>,
    options: PersistenceOptions,
    written: VecDeque<PathBuf>,
}

impl JsonCheckpointer {
    /// Creates a checkpointer writing into `checkpoint_dir`.
    pub fn new(checkpoint_dir: impl AsRef<Path>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.as_ref().to_path_buf(),
            max_checkpoints: None,
            options: PersistenceOptions::default(),
            written: VecDeque::new(),
        }
    }

    /// Keeps at most `max` checkpoint files.
    pub fn with_max_checkpoints(mut self, max: usize) -> Self {
        self.max_checkpoints = Some(max.max(1));
        self
    }

    /// Sets the output options.
    pub fn with_options(mut self, options: PersistenceOptions) -> Self {
        self.options = options;
        self
    }

    /// The directory checkpoints are written to.
    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    /// Paths written so far, oldest first, after retention.
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.written.iter().map(PathBuf::as_path)
    }

    /// Path of the checkpoint for `environment_id` after `episode`.
    pub fn checkpoint_path(&self, environment_id: &str, episode: usize) -> PathBuf {
        let name: String = environment_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.checkpoint_dir
            .join(format!("{}_episode_{}.json", name, episode))
    }

    fn prune(&mut self) -> Result<()> {
        let Some(max) = self.max_checkpoints else {
            return Ok(());
        };
        while self.written.len() > max {
            if let Some(oldest) = self.written.pop_front() {
                match fs::remove_file(&oldest) {
                    Ok(()) => debug!("removed old checkpoint {:?}", oldest),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }
}

impl Checkpointer for JsonCheckpointer {
    fn save(
        &mut self,
        q_values: &ValueTable,
        stats: &TrainingStats,
        environment_id: &str,
    ) -> Result<()> {
        fs::create_dir_all(&self.checkpoint_dir)?;
        let path = self.checkpoint_path(environment_id, stats.global_episode());
        let checkpoint = CheckpointRef { q_values, stats };
        let bytes = if self.options.pretty {
            serde_json::to_vec_pretty(&checkpoint)?
        } else {
            serde_json::to_vec(&checkpoint)?
        };

        // Write then rename so a crash never leaves a truncated checkpoint.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        info!("Saved checkpoint to {:?}", path);

        if !self.written.contains(&path) {
            self.written.push_back(path);
        }
        self.prune()
    }
}

/// Reads a checkpoint written by [`JsonCheckpointer`].
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Checkpoint> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let checkpoint: Checkpoint = serde_json::from_slice(&bytes)?;

    let expected = {
        let mut shape = checkpoint.stats.buckets.clone();
        shape.push(checkpoint.q_values.shape().last().copied().unwrap_or(0));
        shape
    };
    if checkpoint.q_values.shape() != expected.as_slice() {
        return Err(Error::Persistence(format!(
            "checkpoint {:?} has table shape {:?} but buckets {:?}",
            path,
            checkpoint.q_values.shape(),
            checkpoint.stats.buckets
        )));
    }

    info!("Loaded checkpoint from {:?}", path);
    Ok(checkpoint)
}
