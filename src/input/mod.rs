//! Seed list loading
//!
//! The seed list is the ordered list of source channels to crawl. Its order
//! defines the resume cursor, so it is read once from a static file and
//! fingerprinted; a changed list invalidates an existing checkpoint.

use crate::config::compute_hash;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading the seed list
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse seed CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Seed CSV {path} has no column named '{column}'")]
    MissingColumn { path: PathBuf, column: String },
}

/// The normalized, ordered list of seed channel usernames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedList {
    pub channels: Vec<String>,
    pub fingerprint: String,
}

impl SeedList {
    /// Builds a seed list from raw values, dropping blanks and duplicates
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let channels: Vec<String> = values
            .into_iter()
            .filter_map(|v| normalize_username(v.as_ref()))
            .filter(|username| seen.insert(username.clone()))
            .collect();

        let fingerprint = compute_hash(channels.join("\n").as_bytes());
        Self {
            channels,
            fingerprint,
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Trims a raw value and strips a leading `@`; blank values yield `None`
fn normalize_username(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let username = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if username.is_empty() {
        None
    } else {
        Some(username.to_string())
    }
}

/// Loads the seed list from a CSV file (by column name) or a plain text file
///
/// # Arguments
///
/// * `path` - Path to the seed file; a `.csv` extension selects CSV parsing
/// * `column` - Header of the column holding usernames in CSV files
pub fn load_seeds(path: &Path, column: &str) -> Result<SeedList, SeedError> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let values = if is_csv {
        read_csv_column(path, column)?
    } else {
        read_lines(path)?
    };

    let seeds = SeedList::from_values(values);
    tracing::info!(
        "Loaded {} seed channels from {}",
        seeds.len(),
        path.display()
    );
    Ok(seeds)
}

fn read_csv_column(path: &Path, column: &str) -> Result<Vec<String>, SeedError> {
    let csv_err = |source: csv::Error| SeedError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let index = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| SeedError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if let Some(value) = record.get(index) {
            values.push(value.to_string());
        }
    }
    Ok(values)
}

fn read_lines(path: &Path) -> Result<Vec<String>, SeedError> {
    let content = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(str::to_string)
        .collect())
}
