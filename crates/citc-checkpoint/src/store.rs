use crate::types::ClusterInput;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File name used both for the saved checkpoint input and when packaging
/// the working directory for upload to the management node.
pub const INPUT_FILE_NAME: &str = "checkpoint_input.json";

/// Persistent storage for the resolved run input.
pub struct InputStore {
    path: Utf8PathBuf,
}

impl InputStore {
    /// Create a store for the given working directory.
    ///
    /// Input is stored at `checkpoint_input.json` within it.
    pub fn new(working_dir: &Utf8Path) -> Self {
        Self {
            path: working_dir.join(INPUT_FILE_NAME),
        }
    }

    /// Open a store at an explicit file path (used after unpacking a
    /// recovered archive during destroy).
    pub fn at(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the saved input from disk.
    pub fn load(&self) -> Result<ClusterInput, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the resolved input to disk.
    ///
    /// Only written once per run directory: a file that already exists
    /// belongs to the run being resumed and stays authoritative.
    pub fn save_if_absent(&self, input: &ClusterInput) -> Result<bool, StoreError> {
        if self.exists() {
            return Ok(false);
        }
        let content = serde_json::to_string(input)?;
        fs::write(&self.path, content)?;
        Ok(true)
    }
}
