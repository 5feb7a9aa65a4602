//! JSON-file checkpoint store

use crate::state::Progress;
use crate::storage::atomic::{read_json, remove_if_exists, write_json_atomic};
use crate::storage::traits::{CheckpointStore, StorageResult};
use std::path::{Path, PathBuf};

/// Checkpoint persisted as a single JSON object
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Option<Progress> {
        match read_json::<Progress>(&self.path) {
            Ok(Some(progress)) => {
                tracing::info!(
                    processed = progress.processed,
                    total = progress.total,
                    "Loaded checkpoint from {}",
                    self.path.display()
                );
                Some(progress)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn save(&self, progress: &Progress) -> StorageResult<()> {
        write_json_atomic(&self.path, progress)
    }

    fn clear(&self) -> StorageResult<()> {
        remove_if_exists(&self.path)?;
        Ok(())
    }
}
