//! Database schema definitions
//!
//! This module contains the SQL schema for the URL store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every URL ever seen, keyed by the hash of its normalized form
CREATE TABLE IF NOT EXISTS urls (
    hash TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_urls_completed ON urls(completed);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
