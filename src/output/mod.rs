//! Output module for run summaries and record statistics
//!
//! This module handles:
//! - Printing the end-of-run summary
//! - Computing and printing statistics over collected records

mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, rank_targets, RecordSource, RecordStatistics};
pub use summary::{print_summary, CrawlSummary};
