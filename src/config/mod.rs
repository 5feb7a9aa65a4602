//! Configuration module for Forward-Graph
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use forward_graph::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Detail lookups in flight: {}", config.crawler.detail_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, CrawlerConfig, InputConfig, OutputConfig, RetryConfig};

// Re-export parser functions
pub use parser::{compute_file_hash, compute_hash, load_config};
