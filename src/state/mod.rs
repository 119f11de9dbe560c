//! Worker lifecycle state
//!
//! Each partition worker cycles through waiting for a URL, checking the
//! host's crawl policy, fetching, extracting and pacing until its partition
//! drains or the crawl is aborted.

mod worker_state;

pub use worker_state::WorkerState;
