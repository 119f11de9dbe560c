//! Durable, domain-partitioned crawl frontier
//!
//! The frontier owns the persistent URL store and one pending queue per
//! partition. Every URL ever seen is recorded in the store; URLs whose host
//! matches a partition are also appended to that partition's queue. On a
//! non-fresh start, incomplete records are replayed into their queues.
//!
//! Termination is tracked with a single `outstanding` count of URLs that are
//! queued or being processed. A URL is counted from the moment it is
//! appended until `release` is called after its discovered links have been
//! added, so the count reaching zero means every partition is empty with
//! nothing in flight.

mod queue;

pub use queue::DomainQueue;

use crate::config::Config;
use crate::storage::{SqliteStorage, StorageError, UrlRecord, UrlStore};
use crate::url::{assign_partition, normalize_url, url_hash, Partition, ValidityFilter};
use crate::{CrawlError, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Outcome of recovering a previous crawl from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Incomplete, valid records appended to their queues
    pub pending: usize,
    /// Every record in the store
    pub total: usize,
}

/// The crawl frontier
pub struct Frontier {
    store: Mutex<SqliteStorage>,
    filter: Arc<ValidityFilter>,
    partitions: Vec<Partition>,
    queues: Vec<DomainQueue>,
    single: bool,
    outstanding: AtomicUsize,
    aborted: AtomicBool,
}

impl Frontier {
    /// Creates a frontier over an opened store
    ///
    /// In single mode every in-scope URL goes to one global FIFO queue and
    /// `wait_for_work` never blocks.
    pub fn new(store: SqliteStorage, filter: Arc<ValidityFilter>, single: bool) -> Self {
        let partitions = filter.partitions().to_vec();
        let queue_count = if single { 1 } else { partitions.len() };

        Self {
            store: Mutex::new(store),
            filter,
            partitions,
            queues: (0..queue_count).map(|_| DomainQueue::new()).collect(),
            single,
            outstanding: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
        }
    }

    /// Opens the store and fills the queues for a crawl cycle
    ///
    /// A fresh start discards any previous store and adds the seeds. Otherwise
    /// incomplete records are replayed, falling back to the seeds when nothing
    /// is pending.
    pub fn initialize(config: &Config, fresh: bool, filter: Arc<ValidityFilter>) -> Result<Self> {
        let store = SqliteStorage::open(Path::new(&config.frontier.save_file), fresh)?;
        let frontier = Self::new(store, filter, config.is_single_worker());

        if fresh {
            tracing::info!("Starting fresh crawl, discarding {}", config.frontier.save_file);
            frontier.add_seeds(&config.frontier.seeds);
            return Ok(frontier);
        }

        let summary = frontier.replay()?;
        tracing::info!(
            "Found {} urls to be downloaded from {} total urls discovered",
            summary.pending,
            summary.total
        );

        if summary.pending == 0 {
            frontier.add_seeds(&config.frontier.seeds);
        }

        Ok(frontier)
    }

    /// Replays every incomplete, valid record in the store into its queue
    pub fn replay(&self) -> Result<ReplaySummary> {
        let records = self.lock_store().all_records()?;
        let total = records.len();
        let mut pending = 0;

        for record in records.into_iter().filter(|r| !r.completed) {
            if !self.filter.is_valid_str(&record.url) {
                continue;
            }

            let url = match Url::parse(&record.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping unparseable stored url {}: {}", record.url, e);
                    continue;
                }
            };

            if let Some(queue) = self.queue_index_for(&url) {
                self.append(queue, url);
                pending += 1;
            }
        }

        Ok(ReplaySummary { pending, total })
    }

    /// Adds every seed URL, logging any that fail
    pub fn add_seeds<S: AsRef<str>>(&self, seeds: &[S]) {
        for seed in seeds {
            if let Err(e) = self.add_url(seed.as_ref()) {
                tracing::warn!("Failed to add seed {}: {}", seed.as_ref(), e);
            }
        }
    }

    /// Records a URL and queues it for its partition
    ///
    /// Returns `Ok(true)` when the URL was new. A URL already in the store is
    /// left untouched. A new URL matching no partition is recorded but never
    /// dispatched.
    pub fn add_url(&self, raw: &str) -> Result<bool> {
        let url = normalize_url(raw)?;
        let hash = url_hash(&url);

        {
            let mut store = self.lock_store();
            if store.contains(&hash)? {
                return Ok(false);
            }
            store.put(&UrlRecord::new(hash, url.as_str(), false))?;
        }

        match self.queue_index_for(&url) {
            Some(queue) => self.append(queue, url),
            None => tracing::debug!("Recorded out-of-scope url {}", url),
        }

        Ok(true)
    }

    /// Pops the head of a partition's queue without blocking
    pub fn dequeue_for(&self, partition: usize) -> Option<Url> {
        self.queues.get(partition).and_then(DomainQueue::pop)
    }

    /// Waits until the partition has a URL or the crawl is over
    ///
    /// Returns `None` once every partition is empty with nothing in flight,
    /// or after `shutdown`. In single mode this never blocks.
    pub async fn wait_for_work(&self, partition: usize) -> Option<Url> {
        let queue = self.queues.get(partition)?;

        if self.single {
            return if self.is_aborted() { None } else { queue.pop() };
        }

        loop {
            let notified = queue.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_aborted() {
                return None;
            }
            if let Some(url) = queue.pop() {
                return Some(url);
            }
            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return None;
            }

            notified.await;
        }
    }

    /// Marks a URL as completed in the store
    ///
    /// Completing a URL that was never added is logged as an anomaly and
    /// recorded anyway.
    pub fn mark_complete(&self, url: &Url) -> Result<()> {
        let hash = url_hash(url);
        let mut store = self.lock_store();

        if !store.contains(&hash)? {
            let anomaly = CrawlError::UnknownCompletionTarget {
                url: url.to_string(),
            };
            tracing::error!("{}", anomaly);
        }

        store.put(&UrlRecord::new(hash, url.as_str(), true))?;
        Ok(())
    }

    /// Signals that processing of one dequeued URL has finished
    ///
    /// Must be called exactly once per URL returned by `dequeue_for` or
    /// `wait_for_work`, after its links have been added.
    pub fn release(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);

        if previous == 1 {
            self.wake_all();
        }
    }

    /// Stops the crawl: waiters return `None` and no more work is handed out
    pub fn shutdown(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.wake_all();
    }

    /// Returns true if the partition's queue holds a URL
    pub fn has_pending(&self, partition: usize) -> bool {
        self.queues
            .get(partition)
            .map(|q| !q.is_empty())
            .unwrap_or(false)
    }

    /// Returns true if every partition's queue is empty
    pub fn all_partitions_empty(&self) -> bool {
        self.queues.iter().all(DomainQueue::is_empty)
    }

    /// URLs queued or currently being processed
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Number of queues, one per worker
    pub fn partition_count(&self) -> usize {
        self.queues.len()
    }

    /// The partition served by a queue; `None` for the global queue in single mode
    pub fn partition(&self, index: usize) -> Option<&Partition> {
        if self.single {
            None
        } else {
            self.partitions.get(index)
        }
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn filter(&self) -> &ValidityFilter {
        &self.filter
    }

    /// Looks up a URL's record by its normalized form
    pub fn record_for(&self, url: &Url) -> Result<Option<UrlRecord>> {
        Ok(self.lock_store().get(&url_hash(url))?)
    }

    /// Total and completed record counts
    pub fn store_counts(&self) -> std::result::Result<(u64, u64), StorageError> {
        let store = self.lock_store();
        Ok((store.count()?, store.count_completed()?))
    }

    fn queue_index_for(&self, url: &Url) -> Option<usize> {
        let partition = assign_partition(url, &self.partitions)?;
        Some(if self.single { 0 } else { partition })
    }

    fn append(&self, queue: usize, url: Url) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.queues[queue].push(url);
    }

    fn wake_all(&self) {
        for queue in &self.queues {
            queue.wake_all();
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, SqliteStorage> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
