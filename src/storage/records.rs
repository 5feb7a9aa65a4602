//! JSON-file record store for edges and raw page items

use crate::config::OutputConfig;
use crate::graph::ForwardEdge;
use crate::storage::atomic::{read_json, remove_if_exists, write_json_atomic};
use crate::storage::traits::{FinalizeReport, RecordStore, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Edges and raw items stored as two JSON arrays, temporary and final
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    temp_edges: PathBuf,
    temp_items: PathBuf,
    edges: PathBuf,
    items: PathBuf,
}

impl JsonRecordStore {
    pub fn new(
        temp_edges: impl Into<PathBuf>,
        temp_items: impl Into<PathBuf>,
        edges: impl Into<PathBuf>,
        items: impl Into<PathBuf>,
    ) -> Self {
        Self {
            temp_edges: temp_edges.into(),
            temp_items: temp_items.into(),
            edges: edges.into(),
            items: items.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(
            config.temp_edges_path(),
            config.temp_items_path(),
            config.edges_path(),
            config.items_path(),
        )
    }

    pub fn temp_edges_path(&self) -> &Path {
        &self.temp_edges
    }

    pub fn edges_path(&self) -> &Path {
        &self.edges
    }

    pub fn items_path(&self) -> &Path {
        &self.items
    }
}

/// Reads a JSON array, treating a missing or unreadable file as empty
pub fn load_array<T: DeserializeOwned>(path: &Path, what: &str) -> Vec<T> {
    match read_json::<Vec<T>>(path) {
        Ok(Some(records)) => {
            tracing::info!(
                "Loaded {} {} from {}",
                records.len(),
                what,
                path.display()
            );
            records
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!("Treating unreadable {} as empty: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Reads a temporary array for promotion; an unreadable file aborts promotion
fn read_for_promotion<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    read_json::<Vec<T>>(path)
        .map(Option::unwrap_or_default)
        .map_err(|e| StorageError::Promotion {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn write_final<T: Serialize>(path: &Path, records: &[T]) -> StorageResult<()> {
    write_json_atomic(path, records).map_err(|e| StorageError::Promotion {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl RecordStore for JsonRecordStore {
    fn load(&self) -> (Vec<ForwardEdge>, Vec<Value>) {
        let edges = load_array(&self.temp_edges, "edges");
        let items = load_array(&self.temp_items, "raw items");
        (edges, items)
    }

    fn flush(
        &self,
        edges: &[ForwardEdge],
        raw_items: &[Value],
        channel: &str,
    ) -> StorageResult<()> {
        write_json_atomic(&self.temp_edges, edges)?;
        write_json_atomic(&self.temp_items, raw_items)?;

        tracing::info!(
            channel,
            edges = edges.len(),
            raw_items = raw_items.len(),
            "Flushed records after channel @{}",
            channel
        );
        Ok(())
    }

    fn finalize(&self) -> StorageResult<FinalizeReport> {
        let edges: Vec<ForwardEdge> = read_for_promotion(&self.temp_edges)?;
        let items: Vec<Value> = read_for_promotion(&self.temp_items)?;

        write_final(&self.edges, &edges)?;
        write_final(&self.items, &items)?;
        tracing::info!(
            "Wrote {} edges to {} and {} raw items to {}",
            edges.len(),
            self.edges.display(),
            items.len(),
            self.items.display()
        );

        Ok(FinalizeReport {
            edges: edges.len(),
            raw_items: items.len(),
        })
    }

    fn clear_temporary(&self) -> StorageResult<()> {
        remove_if_exists(&self.temp_edges)?;
        remove_if_exists(&self.temp_items)?;
        Ok(())
    }
}
