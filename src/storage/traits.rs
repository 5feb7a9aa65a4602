//! Storage traits and error types
//!
//! This module defines the trait interface for the two durable stores the
//! orchestrator writes to, and their associated error type.

use crate::graph::ForwardEdge;
use crate::state::Progress;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to promote {path}: {message}")]
    Promotion { path: PathBuf, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Counts of records written to the final artifacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    pub edges: usize,
    pub raw_items: usize,
}

/// Durable record of crawl progress
pub trait CheckpointStore {
    /// Reads the last saved progress
    ///
    /// Returns `None` if no checkpoint exists. An unreadable checkpoint is
    /// logged and also reported as `None`.
    fn load(&self) -> Option<Progress>;

    /// Overwrites the checkpoint
    ///
    /// Must only be called once the matching records have been flushed.
    fn save(&self, progress: &Progress) -> StorageResult<()>;

    /// Deletes the checkpoint if it exists
    fn clear(&self) -> StorageResult<()>;
}

/// Incremental storage for discovered edges and raw page items
pub trait RecordStore {
    /// Reads whatever was flushed previously
    ///
    /// Missing or unreadable artifacts are treated as empty.
    fn load(&self) -> (Vec<ForwardEdge>, Vec<Value>);

    /// Replaces the temporary artifacts with a snapshot of the accumulators
    fn flush(&self, edges: &[ForwardEdge], raw_items: &[Value], channel: &str)
        -> StorageResult<()>;

    /// Writes the temporary artifacts to their final paths
    ///
    /// Temporary artifacts are left in place either way; the caller removes
    /// them with [`RecordStore::clear_temporary`] once the checkpoint is gone.
    fn finalize(&self) -> StorageResult<FinalizeReport>;

    /// Deletes temporary artifacts
    fn clear_temporary(&self) -> StorageResult<()>;
}
