//! Snapshot store
//!
//! Durable home of the single most-recent delta snapshot, used as the
//! comparison baseline for the next cycle. Writes go to a temp file and are
//! renamed over the existing record so a reader never observes a partial
//! snapshot. No locking: only sequential cycles of one process touch it.

use crate::delta::DeltaSnapshot;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store file locked or inaccessible
    #[error("store access failed: {0}")]
    Io(#[from] std::io::Error),
    /// Stored record could not be decoded
    #[error("store record corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// File-backed store for the latest delta snapshot
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last committed snapshot, or `None` if none was ever written
    pub fn load(&self) -> Result<Option<DeltaSnapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let snapshot: DeltaSnapshot = serde_json::from_str(&contents)?;
        Ok(Some(snapshot))
    }

    /// Atomically replace the stored snapshot: write to temp, rename over
    pub fn save(&self, snapshot: &DeltaSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(snapshot)?;
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
