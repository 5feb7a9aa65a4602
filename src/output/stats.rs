//! Statistics over collected records
//!
//! This module backs the `--stats` mode: it reads the checkpoint and whichever
//! record artifacts exist and summarizes the forwarding graph collected so far.

use crate::config::OutputConfig;
use crate::graph::ForwardEdge;
use crate::state::Progress;
use crate::storage::{load_array, CheckpointStore, JsonCheckpointStore};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// Which artifacts the statistics were read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// An unfinished crawl's temporary files
    Temporary(PathBuf),
    /// A finished crawl's final files
    Final(PathBuf),
    /// Nothing has been written yet
    Missing,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporary(path) => write!(f, "{} (in progress)", path.display()),
            Self::Final(path) => write!(f, "{} (final)", path.display()),
            Self::Missing => write!(f, "no records yet"),
        }
    }
}

/// Record statistics summary
#[derive(Debug, Clone)]
pub struct RecordStatistics {
    pub source: RecordSource,
    pub progress: Option<Progress>,
    pub edges: usize,
    pub raw_items: usize,
    pub unique_sources: usize,
    pub unique_targets: usize,

    /// Most forwarded-to targets, by edge count (descending)
    pub top_targets: Vec<(String, usize)>,
}

/// Counts distinct endpoints and ranks targets by edge count
///
/// Ties are broken by target name so the ranking is stable.
pub fn rank_targets(edges: &[ForwardEdge], top: usize) -> (usize, usize, Vec<(String, usize)>) {
    let sources: HashSet<&str> = edges.iter().map(|e| e.source.as_str()).collect();

    let mut per_target: HashMap<&str, usize> = HashMap::new();
    for edge in edges {
        *per_target.entry(edge.target.as_str()).or_default() += 1;
    }
    let unique_targets = per_target.len();

    let mut ranked: Vec<(String, usize)> = per_target
        .into_iter()
        .map(|(target, count)| (target.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top);

    (sources.len(), unique_targets, ranked)
}

/// Loads statistics from the artifacts named in the output config
///
/// Temporary artifacts win over final ones, since they belong to a crawl
/// that has not finished yet.
pub fn load_statistics(output: &OutputConfig, top: usize) -> RecordStatistics {
    let progress = JsonCheckpointStore::new(output.checkpoint_path()).load();

    let temp_edges = output.temp_edges_path();
    let final_edges = output.edges_path();
    let (source, items_path) = if temp_edges.exists() {
        (RecordSource::Temporary(temp_edges), output.temp_items_path())
    } else if final_edges.exists() {
        (RecordSource::Final(final_edges), output.items_path())
    } else {
        (RecordSource::Missing, output.items_path())
    };

    let edges: Vec<ForwardEdge> = match &source {
        RecordSource::Temporary(path) | RecordSource::Final(path) => load_array(path, "edges"),
        RecordSource::Missing => Vec::new(),
    };
    let raw_items = load_array::<Value>(&items_path, "raw items").len();

    let (unique_sources, unique_targets, top_targets) = rank_targets(&edges, top);

    RecordStatistics {
        source,
        progress,
        edges: edges.len(),
        raw_items,
        unique_sources,
        unique_targets,
        top_targets,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RecordStatistics) {
    println!("=== Forward Graph Statistics ===\n");

    println!("Checkpoint:");
    match &stats.progress {
        Some(progress) => {
            println!("  Processed: {} / {}", progress.processed, progress.total);
            if let Some(channel) = &progress.last_channel {
                println!("  Last channel: @{}", channel);
            }
            if let Some(timestamp) = progress.timestamp {
                println!("  Saved at: {}", timestamp.to_rfc3339());
            }
            if !progress.skipped.is_empty() {
                println!("  Skipped: {}", progress.skipped.join(", "));
            }
        }
        None => println!("  none"),
    }
    println!();

    println!("Records: {}", stats.source);
    println!("  Edges: {}", stats.edges);
    println!("  Raw items: {}", stats.raw_items);
    println!("  Unique sources: {}", stats.unique_sources);
    println!("  Unique targets: {}", stats.unique_targets);

    if !stats.top_targets.is_empty() {
        println!("\nTop Targets:");
        for (target, count) in &stats.top_targets {
            println!("  @{}: {}", target, count);
        }
    }
}
