//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Transport` trait
//! - HTML parsing, tokenization and link extraction
//! - Page classification and near-duplicate filtering
//! - Partition workers with speculative lanes
//! - Overall crawl coordination and restart after connectivity loss

mod coordinator;
mod fetcher;
mod parser;
mod pipeline;
mod sitemap;
mod worker;

pub use coordinator::{ConnectivityMonitor, Coordinator, CrawlContext};
pub use fetcher::{build_http_client, FetchResponse, HttpTransport, Transport};
pub use parser::{extract_links, parse_html, tokenize, ParsedPage};
pub use pipeline::{
    is_low_information, Extraction, ExtractionPipeline, PageOutcome, LOW_INFO_RATIO,
    MIN_INFORMATIVE_TOKENS,
};
pub use sitemap::{fetch_sitemap, parse_sitemap, sitemap_url};
pub use worker::PartitionWorker;

use crate::config::Config;
use crate::dedup::DuplicateDetector;
use crate::frontier::Frontier;
use crate::output::{CrawlReport, CrawlStatistics};
use crate::url::ValidityFilter;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Runs one crawl cycle over HTTP
///
/// This is the main entry point for a single crawl. It will:
/// 1. Open the URL store and fill the frontier
/// 2. Load or reset the statistics logs
/// 3. Build the HTTP transport
/// 4. Run one worker per partition until the frontier drains
/// 5. Write the final report
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Discard the previous store and statistics
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed and the report was written
/// * `Err(CrawlError)` - The store could not be opened, or connectivity was lost
pub async fn crawl(config: &Config, fresh: bool) -> Result<CrawlReport> {
    let filter = Arc::new(ValidityFilter::from_domains(&config.frontier.domains));
    let transport = Arc::new(HttpTransport::from_config(config, Arc::clone(&filter))?);
    crawl_with_transport(config, fresh, filter, transport).await
}

/// Runs one crawl cycle with the given transport
pub async fn crawl_with_transport(
    config: &Config,
    fresh: bool,
    filter: Arc<ValidityFilter>,
    transport: Arc<dyn Transport>,
) -> Result<CrawlReport> {
    let frontier = Arc::new(Frontier::initialize(config, fresh, Arc::clone(&filter))?);

    let (stats, fingerprints) = CrawlStatistics::from_config(config, fresh)?;
    let stats = Arc::new(stats);
    let detector = DuplicateDetector::with_retained(config.dedup.threshold, fingerprints);
    let pipeline = ExtractionPipeline::new(detector, Arc::clone(&stats), filter);

    let coordinator = Coordinator::new(CrawlContext::new(
        Arc::new(config.clone()),
        frontier,
        transport,
        pipeline,
        Arc::clone(&stats),
    ));

    if let Err(e) = coordinator.run().await {
        if let Err(flush_error) = stats.flush() {
            tracing::warn!("Failed to flush statistics: {}", flush_error);
        }
        return Err(e);
    }

    Ok(stats.finalize()?)
}

/// Runs crawl cycles until one finishes without losing connectivity
///
/// After a connectivity failure the driver waits `reconnect-delay` seconds
/// and resumes from the persisted store and statistics. Any other error is
/// returned.
pub async fn run_with_recovery(config: &Config, fresh: bool) -> Result<CrawlReport> {
    let mut fresh = fresh;

    loop {
        match crawl(config, fresh).await {
            Err(e) if e.is_connectivity() => {
                tracing::warn!(
                    "{}; restarting in {} seconds",
                    e,
                    config.crawler.reconnect_delay
                );
                tokio::time::sleep(Duration::from_secs(config.crawler.reconnect_delay)).await;
                fresh = false;
            }
            result => return result,
        }
    }
}

/// Rewrites the report from the persisted statistics logs
pub fn regenerate_report(config: &Config) -> Result<CrawlReport> {
    let (stats, _) = CrawlStatistics::from_config(config, false)?;
    Ok(stats.finalize()?)
}
