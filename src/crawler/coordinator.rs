//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the outer crawl loop, which:
//! - Restores the accumulators and cursor from the record and checkpoint stores
//! - Drives each remaining seed channel through the [`ChannelCrawler`]
//! - Flushes records and advances the checkpoint after every channel
//! - Promotes the records to final artifacts once the list is exhausted
//!
//! Channels are processed strictly one after another. Only post lookups
//! within a page run concurrently.

use crate::config::Config;
use crate::crawler::channel::{ChannelCrawler, ChannelOutcome};
use crate::crawler::fetcher::ApiClient;
use crate::crawler::governor::DetailGovernor;
use crate::input::SeedList;
use crate::output::CrawlSummary;
use crate::state::{CrawlState, Progress};
use crate::storage::{CheckpointStore, JsonCheckpointStore, JsonRecordStore, RecordStore};
use crate::CrawlError;
use std::time::Instant;

/// Main crawl coordinator
pub struct Coordinator<C = JsonCheckpointStore, R = JsonRecordStore> {
    config: Config,
    api: ApiClient,
    governor: DetailGovernor,
    checkpoint: C,
    records: R,
}

impl Coordinator {
    /// Creates a coordinator backed by the JSON stores named in the config
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        let api = ApiClient::from_config(&config)?;
        let checkpoint = JsonCheckpointStore::new(config.output.checkpoint_path());
        let records = JsonRecordStore::from_config(&config.output);
        Ok(Self::with_stores(config, api, checkpoint, records))
    }
}

impl<C: CheckpointStore, R: RecordStore> Coordinator<C, R> {
    /// Creates a coordinator around explicit stores and API client
    pub fn with_stores(config: Config, api: ApiClient, checkpoint: C, records: R) -> Self {
        let governor = DetailGovernor::new(config.crawler.detail_concurrency);
        Self {
            config,
            api,
            governor,
            checkpoint,
            records,
        }
    }

    /// Discards the checkpoint and temporary records so the next run starts over
    pub fn prepare_fresh(&self) -> Result<(), CrawlError> {
        tracing::info!("Discarding checkpoint and temporary records");
        self.checkpoint.clear()?;
        self.records.clear_temporary()?;
        Ok(())
    }

    /// Rebuilds the crawl state from the stores without writing anything
    ///
    /// Fails with [`CrawlError::SeedListChanged`] if the checkpoint was written
    /// for a different seed list, since its cursor would point at the wrong
    /// channel.
    pub fn resume_state(&self, seeds: &SeedList) -> Result<CrawlState, CrawlError> {
        let progress = match self.checkpoint.load() {
            Some(progress) => check_seed_list(progress, seeds)?,
            None => {
                let mut progress = Progress::new(seeds.len(), Some(seeds.fingerprint.clone()));
                // Without a checkpoint no flushed record is accounted for
                progress.record_flushed(0, 0);
                progress
            }
        };

        let (edges, raw_items) = self.records.load();
        let mut state = CrawlState::new(edges, raw_items, progress);

        let (edges_dropped, items_dropped) = state.trim_to_checkpoint();
        if edges_dropped > 0 || items_dropped > 0 {
            tracing::warn!(
                "Dropped {} edge(s) and {} raw item(s) flushed after the last checkpoint",
                edges_dropped,
                items_dropped
            );
        }

        Ok(state)
    }

    /// Runs the crawl to completion, resuming from the checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Every seed channel was processed and the records promoted
    /// * `Err(CrawlError)` - The crawl halted; flushed records remain resumable
    pub async fn run(&self, seeds: &SeedList) -> Result<CrawlSummary, CrawlError> {
        let started = Instant::now();
        let mut state = self.resume_state(seeds)?;
        let total = seeds.len();
        let start_index = state.progress.processed;

        tracing::info!(
            "Starting from channel #{} of {} ({} edge(s) already collected)",
            start_index + 1,
            total,
            state.edges.len()
        );

        let crawler = ChannelCrawler::new(&self.api, &self.governor, &self.config.crawler);

        if self.config.crawler.retry_skipped {
            self.retry_skipped(&crawler, &mut state).await?;
        }

        for (position, username) in seeds.channels.iter().enumerate().skip(start_index) {
            let index = position + 1;
            tracing::info!("[{}/{}] Crawling channel @{}...", index, total, username);

            let outcome = crawler.crawl(username).await;
            self.complete_channel(&mut state, outcome, Some(index))?;

            tracing::info!("Total edges so far: {}", state.edges.len());
        }

        self.finish(&mut state, seeds)?;

        Ok(CrawlSummary {
            total_channels: total,
            processed: state.progress.processed,
            channels_this_run: state.channels_this_run,
            skipped_this_run: state.skipped_this_run,
            skipped: state.progress.skipped.clone(),
            edges_this_run: state.edges_this_run,
            total_edges: state.edges.len(),
            raw_items: state.raw_items.len(),
            elapsed: started.elapsed(),
        })
    }

    /// Re-attempts channels a previous run skipped
    async fn retry_skipped(
        &self,
        crawler: &ChannelCrawler<'_>,
        state: &mut CrawlState,
    ) -> Result<(), CrawlError> {
        let pending = state.progress.skipped.clone();
        if pending.is_empty() {
            return Ok(());
        }

        tracing::info!("Re-attempting {} previously skipped channel(s)", pending.len());
        for username in pending {
            let outcome = crawler.crawl(&username).await;
            self.complete_channel(state, outcome, None)?;
        }
        Ok(())
    }

    /// Absorbs a channel's outcome, flushes records, then advances the checkpoint
    ///
    /// `cursor` is the 1-based seed index the checkpoint moves to, or `None`
    /// when the channel is outside the cursor (a skipped channel being retried).
    fn complete_channel(
        &self,
        state: &mut CrawlState,
        outcome: ChannelOutcome,
        cursor: Option<usize>,
    ) -> Result<(), CrawlError> {
        let ChannelOutcome {
            username,
            state: channel_state,
            edges,
            raw_items,
            ..
        } = outcome;
        debug_assert!(channel_state.is_terminal());

        state.channels_this_run += 1;
        if channel_state.is_success() {
            state.progress.clear_skip(&username);
        } else {
            state.skipped_this_run += 1;
            state.progress.record_skip(&username);
        }
        state.absorb(edges, raw_items);

        match self
            .records
            .flush(&state.edges, &state.raw_items, &username)
        {
            Ok(()) => {
                state.consecutive_flush_failures = 0;
                state
                    .progress
                    .record_flushed(state.edges.len(), state.raw_items.len());
                if let Some(index) = cursor {
                    state.progress.advance(index, &username);
                }
                self.save_checkpoint(&state.progress);
                Ok(())
            }
            Err(e) => {
                state.consecutive_flush_failures += 1;
                tracing::warn!(
                    "Failed to flush records after @{} ({}/{}): {}",
                    username,
                    state.consecutive_flush_failures,
                    self.config.output.max_flush_failures,
                    e
                );
                if state.consecutive_flush_failures >= self.config.output.max_flush_failures {
                    tracing::error!("Record store keeps failing; halting crawl");
                    return Err(CrawlError::PersistenceHalted {
                        failures: state.consecutive_flush_failures,
                    });
                }
                Ok(())
            }
        }
    }

    /// Saves the checkpoint; a failure only costs redoing one channel on resume
    fn save_checkpoint(&self, progress: &Progress) {
        if let Err(e) = self.checkpoint.save(progress) {
            tracing::warn!("Failed to save checkpoint: {}", e);
        }
    }

    /// Promotes records to their final paths and removes resume artifacts
    fn finish(&self, state: &mut CrawlState, seeds: &SeedList) -> Result<(), CrawlError> {
        if state.consecutive_flush_failures > 0 {
            tracing::info!("Retrying record flush before finalizing");
            let last = seeds.channels.last().map(String::as_str).unwrap_or_default();
            if let Err(e) = self.records.flush(&state.edges, &state.raw_items, last) {
                tracing::error!("Final record flush failed: {}", e);
                return Err(CrawlError::PersistenceHalted {
                    failures: state.consecutive_flush_failures + 1,
                });
            }
            state.consecutive_flush_failures = 0;
            state
                .progress
                .record_flushed(state.edges.len(), state.raw_items.len());
            state.progress.advance(seeds.len(), last);
            self.save_checkpoint(&state.progress);
        }

        let report = self.records.finalize()?;
        self.checkpoint.clear()?;
        if let Err(e) = self.records.clear_temporary() {
            tracing::warn!(
                "Final records written but temporary files remain ({}); a rerun will crawl every channel again",
                e
            );
            return Err(e.into());
        }

        tracing::info!(
            "Crawl finalized: {} edge(s), {} raw item(s)",
            report.edges,
            report.raw_items
        );
        Ok(())
    }
}

/// Accepts a loaded checkpoint only if it refers to the current seed list
fn check_seed_list(mut progress: Progress, seeds: &SeedList) -> Result<Progress, CrawlError> {
    match progress.seeds_fingerprint.as_deref() {
        Some(expected) if expected != seeds.fingerprint => {
            return Err(CrawlError::SeedListChanged {
                expected: expected.to_string(),
                found: seeds.fingerprint.clone(),
            });
        }
        Some(_) => {}
        None if progress.total != seeds.len() => {
            return Err(CrawlError::SeedListChanged {
                expected: format!("{} channels", progress.total),
                found: format!("{} channels", seeds.len()),
            });
        }
        None => {
            tracing::info!("Checkpoint has no seed fingerprint; adopting the current list");
            progress.seeds_fingerprint = Some(seeds.fingerprint.clone());
        }
    }

    progress.total = seeds.len();
    progress.processed = progress.processed.min(progress.total);
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApiConfig, CrawlerConfig, InputConfig, OutputConfig, RetryConfig,
    };
    use crate::crawler::fetcher::build_http_client;
    use crate::crawler::retry::RetryPolicy;
    use crate::graph::ForwardEdge;
    use crate::storage::{FinalizeReport, StorageError, StorageResult};
    use serde_json::Value;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct MemoryCheckpoint {
        saved: RefCell<Option<Progress>>,
        history: RefCell<Vec<usize>>,
    }

    impl CheckpointStore for MemoryCheckpoint {
        fn load(&self) -> Option<Progress> {
            self.saved.borrow().clone()
        }

        fn save(&self, progress: &Progress) -> StorageResult<()> {
            self.history.borrow_mut().push(progress.processed);
            *self.saved.borrow_mut() = Some(progress.clone());
            Ok(())
        }

        fn clear(&self) -> StorageResult<()> {
            *self.saved.borrow_mut() = None;
            Ok(())
        }
    }

    /// Record store whose flushes fail while `failing` is set
    #[derive(Default)]
    struct MemoryRecords {
        edges: RefCell<Vec<ForwardEdge>>,
        items: RefCell<Vec<Value>>,
        failing: Cell<bool>,
        finalized: Cell<bool>,
        stuck_temporary: Cell<bool>,
    }

    impl RecordStore for MemoryRecords {
        fn load(&self) -> (Vec<ForwardEdge>, Vec<Value>) {
            (self.edges.borrow().clone(), self.items.borrow().clone())
        }

        fn flush(&self, edges: &[ForwardEdge], raw_items: &[Value], _: &str) -> StorageResult<()> {
            if self.failing.get() {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            *self.edges.borrow_mut() = edges.to_vec();
            *self.items.borrow_mut() = raw_items.to_vec();
            Ok(())
        }

        fn finalize(&self) -> StorageResult<FinalizeReport> {
            self.finalized.set(true);
            Ok(FinalizeReport {
                edges: self.edges.borrow().len(),
                raw_items: self.items.borrow().len(),
            })
        }

        fn clear_temporary(&self) -> StorageResult<()> {
            if self.stuck_temporary.get() {
                return Err(StorageError::Io(std::io::Error::other("permission denied")));
            }
            self.edges.borrow_mut().clear();
            self.items.borrow_mut().clear();
            Ok(())
        }
    }

    fn test_config(base_url: &str) -> Config {
        Config {
            api: ApiConfig {
                base_url: base_url.to_string(),
                token: "t".to_string(),
                request_timeout_secs: 2,
                connect_timeout_secs: 2,
            },
            crawler: CrawlerConfig {
                page_size: 20,
                page_delay_ms: 0,
                detail_concurrency: 3,
                retry_skipped: false,
            },
            retry: RetryConfig {
                max_attempts: 1,
                base_delay_ms: 1,
                jitter_ms: 0,
            },
            input: InputConfig {
                seeds_path: PathBuf::from("seeds.txt"),
                column: "Target Channel".to_string(),
            },
            output: OutputConfig {
                max_flush_failures: 2,
                ..OutputConfig::default()
            },
        }
    }

    fn coordinator(
        config: Config,
    ) -> Coordinator<MemoryCheckpoint, MemoryRecords> {
        let client = build_http_client(Duration::from_secs(2), Duration::from_secs(2)).unwrap();
        let retry = RetryPolicy::from_config(&config.retry);
        let api = ApiClient::with_client(client, &config.api, retry).unwrap();
        Coordinator::with_stores(config, api, MemoryCheckpoint::default(), MemoryRecords::default())
    }

    /// Every channel lookup fails, so every channel is skipped
    async fn unreachable_api() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/get"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_check_seed_list_rejects_other_fingerprint() {
        let seeds = SeedList::from_values(["alpha", "beta"]);
        let progress = Progress::new(2, Some("other".to_string()));

        let result = check_seed_list(progress, &seeds);
        assert!(matches!(result, Err(CrawlError::SeedListChanged { .. })));
    }

    #[test]
    fn test_check_seed_list_adopts_legacy_checkpoint() {
        let seeds = SeedList::from_values(["alpha", "beta"]);
        let mut progress = Progress::new(2, None);
        progress.processed = 1;

        let progress = check_seed_list(progress, &seeds).unwrap();
        assert_eq!(progress.seeds_fingerprint.as_ref(), Some(&seeds.fingerprint));
        assert_eq!(progress.processed, 1);

        let legacy = Progress::new(5, None);
        assert!(check_seed_list(legacy, &seeds).is_err());
    }

    #[test]
    fn test_resume_without_checkpoint_drops_unaccounted_records() {
        let coordinator = coordinator(test_config("http://127.0.0.1:9"));
        coordinator
            .records
            .items
            .borrow_mut()
            .push(serde_json::json!({"orphan": true}));

        let seeds = SeedList::from_values(["alpha"]);
        let state = coordinator.resume_state(&seeds).unwrap();
        assert_eq!(state.progress.processed, 0);
        assert!(state.raw_items.is_empty());
    }

    #[tokio::test]
    async fn test_skipped_channels_still_advance() {
        let server = unreachable_api().await;
        let coordinator = coordinator(test_config(&server.uri()));
        let seeds = SeedList::from_values(["alpha", "beta"]);

        let summary = coordinator.run(&seeds).await.unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped_this_run, 2);
        assert_eq!(summary.skipped, vec!["alpha".to_string(), "beta".to_string()]);
        assert_eq!(*coordinator.checkpoint.history.borrow(), vec![1, 2]);
        assert!(coordinator.records.finalized.get());
        assert!(coordinator.checkpoint.load().is_none());
    }

    #[tokio::test]
    async fn test_flush_failures_hold_checkpoint_then_halt() {
        let server = unreachable_api().await;
        let coordinator = coordinator(test_config(&server.uri()));
        coordinator.records.failing.set(true);
        let seeds = SeedList::from_values(["alpha", "beta", "gamma"]);

        let result = coordinator.run(&seeds).await;

        assert!(matches!(
            result,
            Err(CrawlError::PersistenceHalted { failures: 2 })
        ));
        assert!(coordinator.checkpoint.history.borrow().is_empty());
        assert!(!coordinator.records.finalized.get());
    }

    #[tokio::test]
    async fn test_completed_checkpoint_only_finalizes() {
        let coordinator = coordinator(test_config("http://127.0.0.1:9"));
        let seeds = SeedList::from_values(["alpha"]);
        let mut progress = Progress::new(1, Some(seeds.fingerprint.clone()));
        progress.advance(1, "alpha");
        coordinator.checkpoint.save(&progress).unwrap();

        let summary = coordinator.run(&seeds).await.unwrap();
        assert_eq!(summary.channels_this_run, 0);
        assert!(coordinator.records.finalized.get());
    }

    #[tokio::test]
    async fn test_leftover_temporary_files_lead_to_full_recrawl() {
        let server = unreachable_api().await;
        let coordinator = coordinator(test_config(&server.uri()));
        coordinator.records.stuck_temporary.set(true);
        let seeds = SeedList::from_values(["alpha", "beta"]);

        let result = coordinator.run(&seeds).await;
        assert!(matches!(result, Err(CrawlError::Storage(_))));
        assert!(coordinator.records.finalized.get());
        assert!(coordinator.checkpoint.load().is_none());

        coordinator
            .records
            .items
            .borrow_mut()
            .push(serde_json::json!({"stale": true}));
        let state = coordinator.resume_state(&seeds).unwrap();
        assert_eq!(state.progress.processed, 0);
        assert!(state.raw_items.is_empty());
    }
}
