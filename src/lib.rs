//! Forward-Graph: a resumable crawler for channel forwarding graphs
//!
//! This crate pages through a channel analytics API to reconstruct which posts
//! were forwarded from a set of seed channels to other channels, persisting
//! incremental progress so an interrupted crawl can resume where it stopped.

pub mod api;
pub mod config;
pub mod crawler;
pub mod graph;
pub mod input;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only failures that halt the crawl end up here. Per-request and per-item
/// failures are absorbed inside the crawler and never reach the orchestrator.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed list error: {0}")]
    Seeds(#[from] input::SeedError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(
        "Seed list changed since the checkpoint was written (checkpoint {expected}, current {found}); rerun with --fresh"
    )]
    SeedListChanged { expected: String, found: String },

    #[error("Halting after {failures} consecutive record flush failures")]
    PersistenceHalted { failures: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use graph::ForwardEdge;
pub use state::{ChannelState, CrawlState, Progress};
