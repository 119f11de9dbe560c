//! UCI Crawler: a polite, domain-partitioned web crawler
//!
//! This crate crawls a fixed set of allowed hostnames, partitioning the
//! frontier by domain suffix with one worker per partition. Progress is kept
//! in a durable URL store so an interrupted crawl resumes without
//! re-downloading completed work, and near-duplicate pages are filtered with
//! a weighted content fingerprint before their links and statistics count.

pub mod config;
pub mod crawler;
pub mod dedup;
pub mod frontier;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL rejected by the validity filter: {url}")]
    InvalidUrl { url: String },

    #[error("Content length {length} exceeds ceiling of {limit} bytes for {url}")]
    OversizedContent { url: String, length: u64, limit: u64 },

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Crawl policy unavailable for {url}: {message}")]
    PolicyUnavailable { url: String, message: String },

    #[error("Sitemap unavailable for {url}: {message}")]
    SitemapUnavailable { url: String, message: String },

    #[error("Extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("URL store unavailable at {path}: {message}")]
    StorageUnavailable { path: String, message: String },

    #[error("Completed url {url}, but have not seen it before")]
    UnknownCompletionTarget { url: String },

    #[error("Connectivity lost after {failures} consecutive connection failures")]
    Connectivity { failures: usize },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true if the driver should reload state and restart the crawl
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use dedup::{DuplicateDetector, Fingerprint};
pub use frontier::Frontier;
pub use state::WorkerState;
pub use url::{normalize_url, url_hash, Partition, ValidityFilter};
