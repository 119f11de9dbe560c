//! Per-partition pending URL queue
//!
//! Each queue pairs its own mutex with its own wake primitive. Appenders push
//! under the lock and wake one waiter. Waiters register for a wakeup before
//! checking the queue, so an append landing between the check and the wait
//! is never missed.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use url::Url;

/// FIFO queue of pending URLs for one partition
#[derive(Debug, Default)]
pub struct DomainQueue {
    pending: Mutex<VecDeque<Url>>,
    not_empty: Notify,
}

impl DomainQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL and wakes exactly one waiter
    pub fn push(&self, url: Url) {
        self.lock().push_back(url);
        self.not_empty.notify_one();
    }

    /// Removes the head of the queue without blocking
    pub fn pop(&self) -> Option<Url> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a wakeup registration for this queue
    ///
    /// Callers must `enable` the returned future before inspecting the queue.
    pub fn notified(&self) -> Notified<'_> {
        self.not_empty.notified()
    }

    /// Wakes every registered waiter so it can re-check termination
    pub fn wake_all(&self) {
        self.not_empty.notify_waiters();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Url>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
