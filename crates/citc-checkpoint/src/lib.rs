//! Checkpointing for resumable install/destroy runs.
//!
//! Progress is recorded as sentinel files (`checkpoint_<stage>.txt`) in
//! the working directory, plus `checkpoint_input.json` holding the
//! resolved input parameters so a resumed run replays with identical
//! settings.

pub mod store;
pub mod types;

pub use store::{InputStore, StoreError};
pub use types::ClusterInput;

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("failed to write checkpoint {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Tracks which stages of a run have completed.
///
/// A stage is complete when its sentinel file exists. Querying a new
/// stage writes the sentinel for the *previously* queried stage: control
/// only reaches stage N+1 once stage N has finished, so the arrival at
/// N+1 is what proves N's completion. The final [`StageLog::finish`]
/// call flushes the last real stage's sentinel.
#[derive(Debug)]
pub struct StageLog {
    dir: Utf8PathBuf,
    last_stage: Option<String>,
}

impl StageLog {
    /// Track stages in the given directory.
    ///
    /// The directory is resolved lazily, so a log created for `"."`
    /// follows the process's working directory as the flows `cd` around.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_stage: None,
        }
    }

    fn sentinel_path(&self, stage: &str) -> Utf8PathBuf {
        self.dir
            .join(format!("checkpoint_{}.txt", stage.replace(' ', "_")))
    }

    /// Has `stage` completed in a previous run?
    ///
    /// Returns `true` if its sentinel exists. Otherwise marks the
    /// previously queried stage complete and returns `false`, meaning the
    /// caller must run the stage now.
    pub fn has_completed(&mut self, stage: &str) -> Result<bool, CheckpointError> {
        if self.sentinel_path(stage).exists() {
            tracing::debug!(stage, "stage already completed, skipping");
            return Ok(true);
        }

        if let Some(last) = self.last_stage.take() {
            self.write_sentinel(&last)?;
        }

        self.last_stage = Some(stage.to_string());
        Ok(false)
    }

    /// Flush the final stage's sentinel.
    ///
    /// Equivalent to querying a terminal pseudo-stage: the sentinel for
    /// the last real stage gets written, while no `checkpoint_everything`
    /// file ever appears.
    pub fn finish(&mut self) -> Result<(), CheckpointError> {
        self.has_completed("everything").map(|_| ())
    }

    fn write_sentinel(&self, stage: &str) -> Result<(), CheckpointError> {
        let path = self.sentinel_path(stage);
        std::fs::write(&path, "completed\n").map_err(|source| CheckpointError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(stage, %path, "stage completed");
        Ok(())
    }
}
