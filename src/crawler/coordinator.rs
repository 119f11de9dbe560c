//! Crawler coordinator - starts one worker per partition and joins them
//!
//! This module contains the state shared by every worker and the logic
//! that decides how a crawl cycle ends:
//! - Building the shared crawl context
//! - Spawning partition workers
//! - Detecting lost connectivity and aborting the cycle

use crate::config::Config;
use crate::crawler::fetcher::{FetchResponse, Transport};
use crate::crawler::pipeline::ExtractionPipeline;
use crate::crawler::worker::PartitionWorker;
use crate::frontier::Frontier;
use crate::output::CrawlStatistics;
use crate::robots::RobotsPolicy;
use crate::{CrawlError, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Counts consecutive connection failures across all partitions
///
/// Any response that reached the network resets the count. Reaching the
/// threshold shuts the frontier down so every worker stops.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    threshold: usize,
    consecutive: AtomicUsize,
    tripped: AtomicBool,
}

impl ConnectivityMonitor {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: AtomicUsize::new(0),
            tripped: AtomicBool::new(false),
        }
    }

    /// Records one fetch response
    pub fn observe(&self, response: &FetchResponse, frontier: &Frontier) {
        if !response.connection_failed {
            self.consecutive.store(0, Ordering::SeqCst);
            return;
        }

        let failures = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.threshold && !self.tripped.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                "{} consecutive connection failures, aborting crawl cycle",
                failures
            );
            frontier.shutdown();
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Current run of consecutive failures
    pub fn failures(&self) -> usize {
        self.consecutive.load(Ordering::SeqCst)
    }
}

/// Everything a worker needs, shared across partitions
pub struct CrawlContext {
    pub config: Arc<Config>,
    pub frontier: Arc<Frontier>,
    pub transport: Arc<dyn Transport>,
    pub robots: RobotsPolicy,
    pub pipeline: ExtractionPipeline,
    pub stats: Arc<CrawlStatistics>,
    pub connectivity: ConnectivityMonitor,
    sitemap_hosts: Mutex<HashSet<String>>,
}

impl CrawlContext {
    pub fn new(
        config: Arc<Config>,
        frontier: Arc<Frontier>,
        transport: Arc<dyn Transport>,
        pipeline: ExtractionPipeline,
        stats: Arc<CrawlStatistics>,
    ) -> Self {
        let robots = RobotsPolicy::new(config.user_agent.crawler_name.clone());
        let connectivity = ConnectivityMonitor::new(config.crawler.connectivity_failure_threshold);

        Self {
            config,
            frontier,
            transport,
            robots,
            pipeline,
            stats,
            connectivity,
            sitemap_hosts: Mutex::new(HashSet::new()),
        }
    }

    /// True once a host's sitemap has been fetched and parsed this cycle
    pub fn sitemap_read(&self, host: &str) -> bool {
        self.lock_sitemap_hosts().contains(host)
    }

    pub fn mark_sitemap_read(&self, host: &str) {
        self.lock_sitemap_hosts().insert(host.to_string());
    }

    fn lock_sitemap_hosts(&self) -> MutexGuard<'_, HashSet<String>> {
        self.sitemap_hosts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<CrawlContext>,
}

impl Coordinator {
    pub fn new(ctx: CrawlContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Runs every partition worker to completion
    ///
    /// Returns `CrawlError::Connectivity` if the cycle was aborted because
    /// the network went away.
    pub async fn run(&self) -> Result<()> {
        let worker_count = self.ctx.frontier.partition_count();
        let start_time = Instant::now();
        tracing::info!(
            "Starting {} worker(s), {} urls outstanding",
            worker_count,
            self.ctx.frontier.outstanding()
        );

        let handles: Vec<_> = (0..worker_count)
            .map(|id| tokio::spawn(PartitionWorker::new(id, Arc::clone(&self.ctx)).run()))
            .collect();

        let mut processed = 0;
        for handle in handles {
            match handle.await {
                Ok(count) => processed += count,
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        if self.ctx.connectivity.is_tripped() {
            return Err(CrawlError::Connectivity {
                failures: self.ctx.connectivity.failures(),
            });
        }

        tracing::info!(
            "Crawl completed: {} urls processed in {:?}",
            processed,
            start_time.elapsed()
        );

        Ok(())
    }
}
