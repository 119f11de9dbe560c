//! UCI Crawler main entry point
//!
//! This is the command-line interface for the domain-partitioned crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uci_crawler::config::{load_config_with_hash, Config};
use uci_crawler::crawler::{regenerate_report, run_with_recovery};
use uci_crawler::storage::{open_storage, UrlStore};
use uci_crawler::url::{assign_partition, normalize_url, partitions_from_domains};

/// UCI Crawler: a polite, domain-partitioned web crawler
///
/// Crawls the configured domains with one worker per domain, respecting
/// robots.txt and a per-partition politeness delay. Progress survives
/// restarts through a durable URL store, and near-duplicate pages are
/// filtered before they count towards the report.
#[derive(Parser, Debug)]
#[command(name = "uci-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite, domain-partitioned web crawler", long_about = None)]
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

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, discarding the URL store and statistics
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show the partition of every seed without crawling
    #[arg(long, conflicts_with_all = ["stats", "report"])]
    dry_run: bool,

    /// Show URL store totals and exit
    #[arg(long, conflicts_with_all = ["dry_run", "report"])]
    stats: bool,

    /// Regenerate the report from the statistics logs and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.report {
        handle_report(&config)
    } else {
        handle_crawl(&config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("uci_crawler=info,warn"),
            1 => EnvFilter::new("uci_crawler=debug,info"),
            2 => EnvFilter::new("uci_crawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows seed partitions
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== UCI Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!("  Speculative delay: {}ms", config.crawler.speculative_delay);
    println!(
        "  Max content length: {} bytes",
        config.crawler.max_content_length
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nOutput:");
    println!("  URL store: {}", config.frontier.save_file);
    println!("  Statistics: {}", config.output.directory);
    println!("  Duplicate threshold: {}", config.dedup.threshold);

    let partitions = partitions_from_domains(&config.frontier.domains);
    println!("\nPartitions ({}):", partitions.len());
    for (index, partition) in partitions.iter().enumerate() {
        println!("  {}. {}", index, partition);
    }

    println!("\nSeeds ({}):", config.frontier.seeds.len());
    for seed in &config.frontier.seeds {
        let assignment = normalize_url(seed)
            .ok()
            .and_then(|url| assign_partition(&url, &partitions))
            .and_then(|index| partitions.get(index))
            .map(|partition| partition.to_string())
            .unwrap_or_else(|| "no partition".to_string());
        println!("  * {} -> {}", seed, assignment);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows URL store totals
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("URL store: {}\n", config.frontier.save_file);

    let storage = open_storage(Path::new(&config.frontier.save_file), false)?;
    let total = storage.count()?;
    let completed = storage.count_completed()?;

    println!("=== Crawl Statistics ===\n");
    println!("  Records:   {}", total);
    println!("  Completed: {}", completed);
    println!("  Pending:   {}", total.saturating_sub(completed));

    Ok(())
}

/// Handles the --report mode: rewrites report.md from the statistics logs
fn handle_report(config: &Config) -> anyhow::Result<()> {
    let report = regenerate_report(config).context("Failed to regenerate report")?;

    println!("✓ Report written to: {}/report.md", config.output.directory);
    println!("  Unique links: {}", report.unique_links);
    println!(
        "  Longest page: {} ({} tokens)",
        report.longest_page.0, report.longest_page.1
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume from the URL store if present)");
    }

    tracing::info!(
        "Domains: {}, Seeds: {}, Workers: {}",
        config.frontier.domains.len(),
        config.frontier.seeds.len(),
        config.crawler.workers
    );

    let report = run_with_recovery(config, fresh).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    tracing::info!(
        "Crawl completed successfully: {} unique links, {} low-information pages",
        report.unique_links,
        report.low_info_pages
    );

    Ok(())
}
