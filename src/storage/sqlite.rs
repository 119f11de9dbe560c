//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the UrlStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageResult, UrlStore};
use crate::storage::UrlRecord;
use crate::CrawlError;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the store at `path`
    ///
    /// On a fresh start the database file and its WAL siblings are removed
    /// first. Any failure to create or open the store is reported as
    /// `CrawlError::StorageUnavailable`.
    pub fn open(path: &Path, fresh: bool) -> Result<Self, CrawlError> {
        let unavailable = |message: String| CrawlError::StorageUnavailable {
            path: path.display().to_string(),
            message,
        };

        if fresh {
            remove_store_files(path).map_err(|e| unavailable(e.to_string()))?;
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| unavailable(e.to_string()))?;

        // Every statement autocommits and is synced before returning
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
        ",
        )
        .map_err(|e| unavailable(e.to_string()))?;

        initialize_schema(&conn).map_err(|e| unavailable(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn remove_store_files(path: &Path) -> io::Result<()> {
    let mut candidates = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut sibling = path.as_os_str().to_owned();
        sibling.push(suffix);
        candidates.push(PathBuf::from(sibling));
    }

    for candidate in candidates {
        match fs::remove_file(&candidate) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl UrlStore for SqliteStorage {
    fn contains(&self, hash: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM urls WHERE hash = ?1", params![hash], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn get(&self, hash: &str) -> StorageResult<Option<UrlRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT hash, url, completed FROM urls WHERE hash = ?1",
                params![hash],
                |row| {
                    Ok(UrlRecord {
                        hash: row.get(0)?,
                        url: row.get(1)?,
                        completed: row.get::<_, i64>(2)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn put(&mut self, record: &UrlRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO urls (hash, url, completed) VALUES (?1, ?2, ?3)
             ON CONFLICT(hash) DO UPDATE SET
                url = excluded.url,
                completed = MAX(urls.completed, excluded.completed)",
            params![record.hash, record.url, record.completed as i64],
        )?;
        Ok(())
    }

    fn all_records(&self) -> StorageResult<Vec<UrlRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash, url, completed FROM urls ORDER BY rowid")?;

        let records = stmt
            .query_map([], |row| {
                Ok(UrlRecord {
                    hash: row.get(0)?,
                    url: row.get(1)?,
                    completed: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_completed(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE completed = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
