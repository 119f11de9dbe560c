//! Storage module for the persistent URL store
//!
//! This module handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - URL records keyed by the hash of the normalized URL
//! - Completion tracking that survives restarts

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{StorageError, StorageResult, UrlStore};

use crate::CrawlError;

use std::path::Path;

/// Opens the URL store, deleting any previous store first on a fresh start
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
/// * `fresh` - Whether to discard an existing store
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully opened storage
/// * `Err(CrawlError::StorageUnavailable)` - The store cannot be created or opened
pub fn open_storage(path: &Path, fresh: bool) -> Result<SqliteStorage, CrawlError> {
    SqliteStorage::open(path, fresh)
}

/// One URL ever seen by the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Hex SHA-256 of the normalized URL; the record's identity
    pub hash: String,
    /// The normalized URL
    pub url: String,
    /// Set once the URL has been fully processed; never reset
    pub completed: bool,
}

impl UrlRecord {
    pub fn new(hash: impl Into<String>, url: impl Into<String>, completed: bool) -> Self {
        Self {
            hash: hash.into(),
            url: url.into(),
            completed,
        }
    }
}
