//! Forward-Graph main entry point
//!
//! This is the command-line interface for the forwarding graph crawler.

use anyhow::Context;
use clap::Parser;
use forward_graph::config::{compute_file_hash, load_config, Config};
use forward_graph::crawler::{crawl, Coordinator};
use forward_graph::input::{load_seeds, SeedList};
use forward_graph::output::{load_statistics, print_statistics, print_summary};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Number of targets listed by --stats
const TOP_TARGETS: usize = 10;

/// Forward-Graph: a resumable crawler for channel forwarding graphs
///
/// Forward-Graph pages through a channel analytics API to find where posts
/// of a list of seed channels were forwarded to. Progress is checkpointed
/// after every channel, so an interrupted crawl picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "forward-graph")]
#[command(version)]
#[command(about = "A resumable crawler for channel forwarding graphs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the checkpoint and temporary records before crawling
    #[arg(long)]
    fresh: bool,

    /// Validate config and seeds and show the resume point without crawling
    #[arg(long, conflicts_with_all = ["stats", "fresh"])]
    dry_run: bool,

    /// Show statistics of the collected records and exit
    #[arg(long, conflicts_with_all = ["dry_run", "fresh"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config).inspect_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
    })?;

    if cli.stats {
        let stats = load_statistics(&config.output, TOP_TARGETS);
        print_statistics(&stats);
        return Ok(());
    }

    let seeds = load_seeds(&config.input.seeds_path, &config.input.column)
        .with_context(|| format!("loading seeds from {}", config.input.seeds_path.display()))?;

    if cli.dry_run {
        handle_dry_run(&cli, config, &seeds)
    } else {
        handle_crawl(config, &seeds, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forward_graph=info,warn"),
            1 => EnvFilter::new("forward_graph=debug,info"),
            2 => EnvFilter::new("forward_graph=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the configuration and the resume point
fn handle_dry_run(cli: &Cli, config: Config, seeds: &SeedList) -> anyhow::Result<()> {
    println!("=== Forward-Graph Dry Run ===\n");

    println!("Configuration: {}", cli.config.display());
    println!("  SHA-256: {}", compute_file_hash(&cli.config)?);

    println!("\nAPI:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Request timeout: {}s", config.api.request_timeout_secs);

    println!("\nCrawler:");
    println!("  Page size: {}", config.crawler.page_size);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Post lookup concurrency: {}", config.crawler.detail_concurrency);
    println!(
        "  Retries: {} attempt(s), base delay {}ms",
        config.retry.max_attempts, config.retry.base_delay_ms
    );
    println!("  Retry skipped channels: {}", config.crawler.retry_skipped);

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.checkpoint_path().display());
    println!("  Edges: {}", config.output.edges_path().display());
    println!("  Raw items: {}", config.output.items_path().display());

    println!("\nSeeds ({}):", seeds.len());
    println!("  Fingerprint: {}", seeds.fingerprint);

    let coordinator = Coordinator::new(config)?;
    let state = coordinator.resume_state(seeds)?;
    let start = state.progress.processed;

    println!("\n✓ Configuration is valid");
    match seeds.channels.get(start) {
        Some(next) => println!(
            "✓ Would resume at channel #{} of {} (@{}) with {} edge(s) already collected",
            start + 1,
            seeds.len(),
            next,
            state.edges.len()
        ),
        None => println!("✓ All channels processed; a run would only finalize the records"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seeds: &SeedList, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous progress)");
    } else {
        tracing::info!("Starting crawl (will resume from checkpoint if present)");
    }

    match crawl(config, seeds, fresh).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl halted: {}", e);
            eprintln!("Crawl stopped; all flushed data is kept and the crawl can be resumed.");
            Err(e.into())
        }
    }
}
