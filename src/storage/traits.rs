//! Storage traits and error types
//!
//! This module defines the trait interface for URL store backends and
//! associated error types.

use crate::storage::UrlRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for URL store implementations
///
/// Every mutation must be durable when the call returns. Callers serialize
/// access; implementations need not be internally synchronized.
pub trait UrlStore {
    /// Returns true if a record with this hash exists
    fn contains(&self, hash: &str) -> StorageResult<bool>;

    /// Gets a record by hash
    fn get(&self, hash: &str) -> StorageResult<Option<UrlRecord>>;

    /// Inserts or updates a record
    ///
    /// A record that is already completed stays completed even if `record`
    /// says otherwise.
    fn put(&mut self, record: &UrlRecord) -> StorageResult<()>;

    /// Returns every record in the store, in unspecified order
    fn all_records(&self) -> StorageResult<Vec<UrlRecord>>;

    /// Gets the total record count
    fn count(&self) -> StorageResult<u64>;

    /// Counts completed records
    fn count_completed(&self) -> StorageResult<u64>;
}
