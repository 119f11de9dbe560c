//! URL handling module for the UCI crawler
//!
//! This module provides URL normalization, identity hashing, domain suffix
//! matching, partition assignment and the link validity filter.

mod domain;
mod filter;
mod hash;
mod matcher;
mod normalize;

use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{counted_subdomain, extract_domain};
pub use filter::{ValidityFilter, ARCHIVE_QUERY_CAP};
pub use hash::url_hash;
pub use matcher::matches_domain;
pub use normalize::normalize_url;

/// A domain partition of the frontier
///
/// Each partition owns every host equal to its domain suffix or ending in
/// "." followed by it. Partitions are checked in configured order and the
/// first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    domain: String,
}

impl Partition {
    /// Creates a partition for a domain suffix such as "ics.uci.edu"
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().to_lowercase(),
        }
    }

    /// The domain suffix this partition covers
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if the host falls in this partition
    pub fn contains_host(&self, host: &str) -> bool {
        matches_domain(&self.domain, host)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}

/// Builds the partition list from configured domains, preserving order
pub fn partitions_from_domains<S: AsRef<str>>(domains: &[S]) -> Vec<Partition> {
    domains.iter().map(|d| Partition::new(d.as_ref())).collect()
}

/// Returns the index of the first partition whose suffix matches the URL's host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use uci_crawler::url::{assign_partition, partitions_from_domains};
///
/// let partitions = partitions_from_domains(&["informatics.uci.edu", "ics.uci.edu"]);
/// let url = Url::parse("https://vision.ics.uci.edu/").unwrap();
/// assert_eq!(assign_partition(&url, &partitions), Some(1));
/// ```
pub fn assign_partition(url: &Url, partitions: &[Partition]) -> Option<usize> {
    let host = extract_domain(url)?;
    partitions.iter().position(|p| p.contains_host(&host))
}
