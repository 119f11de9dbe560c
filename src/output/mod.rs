//! Crawl statistics and reporting
//!
//! This module handles:
//! - Aggregating per-page outcomes into running statistics
//! - Persisting those statistics to plain-text logs that survive restarts
//! - Generating the final markdown report

mod logs;
mod markdown;
mod report;
pub mod stats;

pub use logs::{
    StatsFiles, ALL_TOKENS_FILE, ERROR_FILE, FINGERPRINTS_FILE, LOW_INFO_FILE, REPORT_FILE,
    SUBDOMAINS_FILE, UNIQUE_LINKS_FILE,
};
pub use markdown::{format_report, write_report};
pub use report::{longest_page, top_words, CrawlReport, TOP_WORDS};
pub use stats::{CrawlStatistics, PageRecord};

use thiserror::Error;

/// Errors that can occur while writing statistics or reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
