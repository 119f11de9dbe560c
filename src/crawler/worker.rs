//! Partition workers
//!
//! One worker serves each partition's queue. While a fetch is slow, the
//! worker may start a single speculative lane that takes the next URL from
//! the same partition, so one stalled host does not idle the partition.
//! The partition's lane semaphore holds two permits: the worker keeps one
//! for its whole life and a lane needs the other.

use crate::crawler::coordinator::CrawlContext;
use crate::crawler::fetcher::FetchResponse;
use crate::crawler::sitemap::fetch_sitemap;
use crate::state::WorkerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;
use url::Url;

/// Concurrent fetches allowed per partition: the worker plus one lane
const PARTITION_FETCH_SLOTS: u32 = 2;

/// Drives one partition until it drains or the crawl is aborted
pub struct PartitionWorker {
    id: usize,
    ctx: Arc<CrawlContext>,
    lanes: Arc<Semaphore>,
    state: WorkerState,
    processed: usize,
}

impl PartitionWorker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>) -> Self {
        Self {
            id,
            ctx,
            lanes: Arc::new(Semaphore::new(PARTITION_FETCH_SLOTS as usize)),
            state: WorkerState::WaitingForWork,
            processed: 0,
        }
    }

    /// Runs the worker loop, returning the number of URLs it processed
    pub async fn run(self) -> usize {
        let partition = self
            .ctx
            .frontier
            .partition(self.id)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "*".to_string());
        let span = tracing::info_span!("worker", worker = self.id, partition = %partition);

        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> usize {
        let Ok(primary) = Arc::clone(&self.lanes).acquire_owned().await else {
            return 0;
        };

        loop {
            self.transition(WorkerState::WaitingForWork);
            let Some(url) = self.ctx.frontier.wait_for_work(self.id).await else {
                break;
            };

            self.transition(WorkerState::PolicyCheck);
            if !self
                .ctx
                .robots
                .can_fetch(self.ctx.transport.as_ref(), &url)
                .await
            {
                tracing::info!("{} is not allowed by robots.txt", url);
                discover_sitemap(&self.ctx, &url).await;
                self.ctx.frontier.release();
                self.pace().await;
                continue;
            }

            self.transition(WorkerState::Fetching);
            let response = self.fetch_with_watchdog(&url).await;

            self.transition(WorkerState::Extracting);
            process_response(&self.ctx, &url, &response);
            discover_sitemap(&self.ctx, &url).await;
            self.ctx.frontier.release();
            self.processed += 1;

            self.pace().await;
        }

        self.transition(WorkerState::Stopped);

        // Wait for a running lane to finish with its URL
        drop(primary);
        if self.lanes.acquire_many(PARTITION_FETCH_SLOTS).await.is_err() {
            tracing::warn!("Lane semaphore closed before lanes drained");
        }

        tracing::info!("Worker stopped after {} urls", self.processed);
        self.processed
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid worker transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("{} -> {}", self.state, next);
        self.state = next;
    }

    /// Fetches a URL, starting a speculative lane if the fetch is slow
    async fn fetch_with_watchdog(&self, url: &Url) -> FetchResponse {
        let fetch = self.ctx.transport.fetch_page(url);
        tokio::pin!(fetch);

        if self.ctx.frontier.is_single() {
            return fetch.await;
        }

        let delay = Duration::from_millis(self.ctx.config.crawler.speculative_delay);
        tokio::select! {
            response = &mut fetch => return response,
            _ = tokio::time::sleep(delay) => self.try_start_lane(),
        }

        fetch.await
    }

    fn try_start_lane(&self) {
        if !self.ctx.frontier.has_pending(self.id) {
            return;
        }
        let Ok(permit) = Arc::clone(&self.lanes).try_acquire_owned() else {
            return;
        };

        tracing::debug!("Fetch slow, starting speculative lane");
        let span = tracing::info_span!("lane", worker = self.id);
        tokio::spawn(
            speculative_lane(Arc::clone(&self.ctx), self.id, permit).instrument(span),
        );
    }

    async fn pace(&mut self) {
        self.transition(WorkerState::Pacing);
        if self.ctx.frontier.is_aborted() {
            return;
        }
        let delay = self.ctx.config.crawler.politeness_delay;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

/// Processes one URL from the partition's queue alongside the worker
///
/// The lane holds the partition's second permit until it is done, so at
/// most one lane runs per partition. Lanes do not pace; the worker's
/// politeness delay covers the partition.
async fn speculative_lane(
    ctx: Arc<CrawlContext>,
    partition: usize,
    permit: OwnedSemaphorePermit,
) {
    let _permit = permit;
    let Some(url) = ctx.frontier.dequeue_for(partition) else {
        return;
    };

    if ctx.robots.can_fetch(ctx.transport.as_ref(), &url).await {
        let response = ctx.transport.fetch_page(&url).await;
        process_response(&ctx, &url, &response);
    } else {
        tracing::info!("{} is not allowed by robots.txt", url);
    }
    discover_sitemap(&ctx, &url).await;

    ctx.frontier.release();
}

/// Extracts a fetched page and records its outcome
///
/// Discovered links are added before the URL is marked complete. Only a
/// successful response completes the URL; anything else leaves it pending
/// for the next run.
fn process_response(ctx: &CrawlContext, url: &Url, response: &FetchResponse) {
    tracing::info!("Downloaded {}, status <{}>", url, response.status);
    ctx.connectivity.observe(response, &ctx.frontier);

    let extraction = ctx.pipeline.extract(url, response);
    for link in &extraction.links {
        if let Err(e) = ctx.frontier.add_url(link) {
            tracing::warn!("Failed to add {}: {}", link, e);
        }
    }

    if response.is_success() {
        if let Err(e) = ctx.frontier.mark_complete(url) {
            tracing::error!("Failed to mark {} complete: {}", url, e);
        }
    } else if let Some(error) = &response.error {
        tracing::debug!("Leaving {} pending: {}", url, error);
    }
}

/// Queues the URLs listed in the host's sitemap
///
/// A host is skipped once its sitemap has been read this cycle. Failed or
/// missing sitemaps are tried again by the host's next URL.
async fn discover_sitemap(ctx: &CrawlContext, url: &Url) {
    let Some(host) = url.host_str() else {
        return;
    };
    if ctx.sitemap_read(host) {
        return;
    }

    match fetch_sitemap(ctx.transport.as_ref(), url).await {
        Ok(locs) => {
            ctx.mark_sitemap_read(host);
            for loc in locs {
                if !ctx.frontier.filter().is_valid_str(&loc) {
                    continue;
                }
                if let Err(e) = ctx.frontier.add_url(&loc) {
                    tracing::warn!("Failed to add sitemap url {}: {}", loc, e);
                }
            }
        }
        Err(e) => tracing::debug!("{}", e),
    }
}
