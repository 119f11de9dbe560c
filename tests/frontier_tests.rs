//! Frontier recovery tests against an on-disk URL store

mod common;

use common::{test_config, UCI_DOMAINS};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uci_crawler::storage::{open_storage, UrlRecord, UrlStore};
use uci_crawler::{normalize_url, url_hash, Frontier, ValidityFilter};

fn filter() -> Arc<ValidityFilter> {
    Arc::new(ValidityFilter::from_domains(UCI_DOMAINS))
}

fn record(url: &str, completed: bool) -> UrlRecord {
    let url = normalize_url(url).unwrap();
    UrlRecord::new(url_hash(&url), url.as_str(), completed)
}

/// Writes ten records, six of them pending, spread over three partitions
fn seed_store(path: &Path) {
    let mut store = open_storage(path, true).unwrap();
    let records = [
        ("https://www.ics.uci.edu/", true),
        ("https://www.ics.uci.edu/about", true),
        ("https://www.cs.uci.edu/", true),
        ("https://www.stat.uci.edu/", true),
        ("https://www.ics.uci.edu/people", false),
        ("https://vision.ics.uci.edu/", false),
        ("https://www.cs.uci.edu/research", false),
        ("https://www.cs.uci.edu/courses", false),
        ("https://www.stat.uci.edu/faculty", false),
        ("https://www.stat.uci.edu/news", false),
    ];
    for (url, completed) in records {
        store.put(&record(url, completed)).unwrap();
    }
}

#[test]
fn test_replay_queues_pending_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frontier.db");
    seed_store(&path);

    let frontier = Frontier::new(open_storage(&path, false).unwrap(), filter(), false);
    let summary = frontier.replay().unwrap();

    assert_eq!(summary.pending, 6);
    assert_eq!(summary.total, 10);
    assert_eq!(frontier.outstanding(), 6);

    // informatics, stat, ics, cs
    assert!(!frontier.has_pending(0));
    assert!(frontier.has_pending(1));
    assert!(frontier.has_pending(2));
    assert!(frontier.has_pending(3));

    // Replay never completes anything
    assert_eq!(frontier.store_counts().unwrap(), (10, 4));
}

#[test]
fn test_replay_preserves_store_order_per_partition() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frontier.db");
    seed_store(&path);

    let frontier = Frontier::new(open_storage(&path, false).unwrap(), filter(), false);
    frontier.replay().unwrap();

    let first = frontier.dequeue_for(3).unwrap();
    let second = frontier.dequeue_for(3).unwrap();
    assert_eq!(first.as_str(), "https://www.cs.uci.edu/research");
    assert_eq!(second.as_str(), "https://www.cs.uci.edu/courses");
    assert!(frontier.dequeue_for(3).is_none());
}

#[test]
fn test_replay_skips_invalid_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frontier.db");
    {
        let mut store = open_storage(&path, true).unwrap();
        store
            .put(&record("https://www.ics.uci.edu/slides.pdf", false))
            .unwrap();
        store.put(&record("https://example.com/", false)).unwrap();
        store
            .put(&record("https://www.ics.uci.edu/page", false))
            .unwrap();
    }

    let frontier = Frontier::new(open_storage(&path, false).unwrap(), filter(), false);
    let summary = frontier.replay().unwrap();

    assert_eq!(summary.pending, 1);
    assert_eq!(summary.total, 3);
}

#[test]
fn test_initialize_resumes_without_seeds() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["https://www.informatics.uci.edu"], 4);
    seed_store(Path::new(&config.frontier.save_file));

    let frontier = Frontier::initialize(&config, false, filter()).unwrap();

    assert_eq!(frontier.outstanding(), 6);
    // The seed is only used when nothing is pending
    assert!(!frontier.has_pending(0));
}

#[test]
fn test_initialize_falls_back_to_seeds_when_nothing_pending() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["https://www.informatics.uci.edu"], 4);
    {
        let mut store = open_storage(Path::new(&config.frontier.save_file), true).unwrap();
        store
            .put(&record("https://www.ics.uci.edu/", true))
            .unwrap();
    }

    let frontier = Frontier::initialize(&config, false, filter()).unwrap();

    assert_eq!(frontier.outstanding(), 1);
    assert!(frontier.has_pending(0));
}

#[test]
fn test_fresh_initialize_discards_store() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["https://www.cs.uci.edu"], 1);
    seed_store(Path::new(&config.frontier.save_file));

    let frontier = Frontier::initialize(&config, true, filter()).unwrap();

    assert_eq!(frontier.store_counts().unwrap(), (1, 0));
    assert_eq!(frontier.partition_count(), 1);
    assert_eq!(
        frontier.dequeue_for(0).unwrap().as_str(),
        "https://www.cs.uci.edu/"
    );
}

#[test]
fn test_completion_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frontier.db");
    let url = normalize_url("https://www.ics.uci.edu/people").unwrap();
    {
        let frontier = Frontier::new(open_storage(&path, true).unwrap(), filter(), false);
        assert!(frontier.add_url(url.as_str()).unwrap());
        frontier.mark_complete(&url).unwrap();
    }

    let frontier = Frontier::new(open_storage(&path, false).unwrap(), filter(), false);
    let summary = frontier.replay().unwrap();

    assert_eq!(summary.pending, 0);
    assert!(frontier.record_for(&url).unwrap().unwrap().completed);
}

#[tokio::test]
async fn test_unknown_completion_is_recorded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frontier.db");
    let frontier = Frontier::new(open_storage(&path, true).unwrap(), filter(), false);
    let url = normalize_url("https://www.ics.uci.edu/never-added").unwrap();

    frontier.mark_complete(&url).unwrap();

    assert!(frontier.record_for(&url).unwrap().unwrap().completed);
    assert!(frontier.wait_for_work(2).await.is_none());
}
