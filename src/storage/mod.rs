//! Storage module for persisting crawl data
//!
//! This module handles everything the crawl writes to disk:
//! - The checkpoint recording how far through the seed list the crawl is
//! - Temporary snapshots of discovered edges and raw page items
//! - Promotion of those snapshots to final artifacts once the crawl completes
//!
//! Every file is written with write-then-rename semantics, so a crash never
//! leaves a half-written checkpoint or record file behind.

mod atomic;
mod checkpoint;
mod records;
mod traits;

pub use atomic::{read_json, staging_path, write_json_atomic};
pub use checkpoint::JsonCheckpointStore;
pub use records::{load_array, JsonRecordStore};
pub use traits::{CheckpointStore, FinalizeReport, RecordStore, StorageError, StorageResult};
