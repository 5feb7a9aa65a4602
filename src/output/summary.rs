//! End-of-run summary

use std::time::Duration;

/// What a completed run did
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    /// Number of seed channels
    pub total_channels: usize,

    /// Seed channels covered by the checkpoint cursor
    pub processed: usize,

    /// Channels crawled by this process, including retried skips
    pub channels_this_run: usize,

    /// Channels skipped by this process
    pub skipped_this_run: usize,

    /// Every channel still marked as skipped
    pub skipped: Vec<String>,

    pub edges_this_run: usize,
    pub total_edges: usize,
    pub raw_items: usize,
    pub elapsed: Duration,
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    let rule = "=".repeat(50);
    let secs = summary.elapsed.as_secs_f64();

    println!("\n{}", rule);
    println!("All data collected and saved");
    println!(
        "Channels processed: {} / {} ({} this run)",
        summary.processed, summary.total_channels, summary.channels_this_run
    );
    println!("Edges found: {} ({} this run)", summary.total_edges, summary.edges_this_run);
    println!("Raw items: {}", summary.raw_items);
    println!("Elapsed: {:.2} s ({:.2} min)", secs, secs / 60.0);

    if !summary.skipped.is_empty() {
        println!(
            "\nSkipped channels ({}, {} this run):",
            summary.skipped.len(),
            summary.skipped_this_run
        );
        for channel in &summary.skipped {
            println!("  - @{}", channel);
        }
    }
    println!("{}", rule);
}
