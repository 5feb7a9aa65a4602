use crate::graph::ForwardEdge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Durable record of how far through the seed list the crawl has got
///
/// `processed` counts seed channels from the start of the list whose work has
/// been flushed. It never decreases and never exceeds `total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub last_channel: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,

    /// Fingerprint of the seed list the cursor refers to
    #[serde(default)]
    pub seeds_fingerprint: Option<String>,

    /// Channels marked processed although their metadata lookup failed
    #[serde(default)]
    pub skipped: Vec<String>,

    /// Number of edges in the record store when this checkpoint was written
    #[serde(default)]
    pub flushed_edges: Option<usize>,

    /// Number of raw items in the record store when this checkpoint was written
    #[serde(default)]
    pub flushed_items: Option<usize>,
}

impl Progress {
    /// Creates a zeroed progress record for a seed list
    pub fn new(total: usize, seeds_fingerprint: Option<String>) -> Self {
        Self {
            processed: 0,
            total,
            last_channel: None,
            timestamp: None,
            seeds_fingerprint,
            skipped: Vec::new(),
            flushed_edges: None,
            flushed_items: None,
        }
    }

    /// Moves the cursor to `processed`, clamped to `total`; never moves it backwards
    pub fn advance(&mut self, processed: usize, channel: &str) {
        self.processed = self.processed.max(processed.min(self.total));
        self.last_channel = Some(channel.to_string());
        self.timestamp = Some(Utc::now());
    }

    /// Notes how many records the store held when the cursor last moved
    pub fn record_flushed(&mut self, edges: usize, items: usize) {
        self.flushed_edges = Some(edges);
        self.flushed_items = Some(items);
    }

    /// Returns true once every seed channel has been processed
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    pub fn record_skip(&mut self, channel: &str) {
        if !self.skipped.iter().any(|c| c == channel) {
            self.skipped.push(channel.to_string());
        }
    }

    pub fn clear_skip(&mut self, channel: &str) {
        self.skipped.retain(|c| c != channel);
    }
}

/// In-memory accumulators for a crawl, owned by the orchestrator
///
/// The edge and raw item lists are the source of truth; the temporary record
/// files are snapshots of them.
#[derive(Debug, Clone)]
pub struct CrawlState {
    pub edges: Vec<ForwardEdge>,
    pub raw_items: Vec<Value>,
    pub progress: Progress,

    /// Record flushes that failed since the last successful one
    pub consecutive_flush_failures: u32,

    /// Edges added during this process's run
    pub edges_this_run: usize,

    /// Channels driven to a terminal state during this process's run
    pub channels_this_run: usize,

    /// Channels skipped during this process's run
    pub skipped_this_run: usize,
}

impl CrawlState {
    /// Creates crawl state from previously flushed records and a loaded checkpoint
    pub fn new(edges: Vec<ForwardEdge>, raw_items: Vec<Value>, progress: Progress) -> Self {
        Self {
            edges,
            raw_items,
            progress,
            consecutive_flush_failures: 0,
            edges_this_run: 0,
            channels_this_run: 0,
            skipped_this_run: 0,
        }
    }

    /// Drops records flushed after the last checkpoint
    ///
    /// Those records belong to a channel the cursor does not count as done,
    /// so that channel will be crawled again and would otherwise duplicate them.
    /// Returns the number of edges and raw items dropped.
    pub fn trim_to_checkpoint(&mut self) -> (usize, usize) {
        let edges = trim(&mut self.edges, self.progress.flushed_edges);
        let items = trim(&mut self.raw_items, self.progress.flushed_items);
        (edges, items)
    }

    /// Appends a channel's output to the accumulators
    pub fn absorb(&mut self, edges: Vec<ForwardEdge>, raw_items: Vec<Value>) {
        self.edges_this_run += edges.len();
        self.edges.extend(edges);
        self.raw_items.extend(raw_items);
    }
}

fn trim<T>(records: &mut Vec<T>, keep: Option<usize>) -> usize {
    match keep {
        Some(keep) if records.len() > keep => {
            let dropped = records.len() - keep;
            records.truncate(keep);
            dropped
        }
        _ => 0,
    }
}
