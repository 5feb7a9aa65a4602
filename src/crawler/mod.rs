//! Crawler module for paging through the forwards API
//!
//! This module contains the core crawling logic, including:
//! - API calls with retry and backoff
//! - Bounded fan-out of post lookups and pagination pacing
//! - The per-channel crawl state machine
//! - Overall crawl coordination and persistence ordering

mod channel;
mod coordinator;
mod fetcher;
mod governor;
mod retry;

pub use channel::{ChannelCrawler, ChannelOutcome};
pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, ApiClient, FailureKind, FetchError, FetchFailure};
pub use governor::{DetailGovernor, Pacer};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::input::SeedList;
use crate::output::CrawlSummary;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the API client and the JSON stores
/// 2. Optionally discard previous progress
/// 3. Resume from the checkpoint and crawl the remaining channels
/// 4. Promote the records to their final paths
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seeds` - The ordered seed channel list
/// * `fresh` - Whether to discard the checkpoint and temporary records first
pub async fn crawl(config: Config, seeds: &SeedList, fresh: bool) -> Result<CrawlSummary, CrawlError> {
    let coordinator = Coordinator::new(config)?;
    if fresh {
        coordinator.prepare_fresh()?;
    }
    coordinator.run(seeds).await
}
