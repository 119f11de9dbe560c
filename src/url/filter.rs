//! Link validity filtering
//!
//! A URL is crawlable when its host belongs to an allowed partition, it does
//! not look like a crawl trap, and its path does not end in a non-HTML file
//! extension.

use crate::url::{partitions_from_domains, Partition};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use url::Url;

/// Paths ending in these extensions are never fetched
static BLOCKED_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\.(css|js|bmp|gif|jpe?g|ico|png|tiff?|mid|mp2|mp3|mp4|wav|avi|mov|mpeg|ram|m4v|mkv|ogg|ogv|pdf|ps|eps|tex|ppt|pptx|doc|docx|xls|xlsx|names|data|dat|exe|bz2|tar|msi|bin|7z|psd|dmg|iso|epub|dll|cnf|tgz|sha1|thmx|mso|arff|rtf|jar|csv|rm|smil|wmv|swf|wma|zip|rar|gz|img|mpg|ppsx)$",
    )
    .expect("extension pattern is valid")
});

/// Event and calendar listings paginate without end
static CALENDAR_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(events|calendar)/").expect("calendar pattern is valid"));

/// Query fragments that lead to downloads, logins or edit forms
const DISALLOWED_QUERIES: &[&str] = &[
    "download",
    "login",
    "edit",
    "do=download",
    "do=login",
    "do=edit",
    "action=download",
    "action=login",
    "action=edit",
    "do=backlink",
];

/// Path prefixes of known generated-content traps
const TRAP_PREFIXES: &[&str] = &["/~eppstein/pix", "/~eppstein/pubs/pubs.sh"];

/// Host whose archival query parameters are capped
const ARCHIVE_HOST: &str = "archive.ics.uci.edu";

/// Archival query parameters counted per host
const ARCHIVE_PARAMS: &[&str] = &["format=", "format=mat", "format=nonmat", "att="];

/// Occurrences of one archival parameter allowed per host
pub const ARCHIVE_QUERY_CAP: u32 = 1000;

/// Decides whether a URL may enter the frontier
///
/// Shared by the frontier replay, link extraction and the transport. The
/// archival counter is the only mutable state and is guarded internally.
#[derive(Debug)]
pub struct ValidityFilter {
    partitions: Vec<Partition>,
    archive_counts: Mutex<HashMap<(String, String), u32>>,
}

impl ValidityFilter {
    /// Creates a filter that admits the given partitions' hosts
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self {
            partitions,
            archive_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a filter from bare domain names
    pub fn from_domains<S: AsRef<str>>(domains: &[S]) -> Self {
        Self::new(partitions_from_domains(domains))
    }

    /// The partitions this filter admits, in configured order
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Parses and checks a raw URL string
    pub fn is_valid_str(&self, url: &str) -> bool {
        Url::parse(url).map(|u| self.is_valid(&u)).unwrap_or(false)
    }

    /// Returns true if the URL should be crawled
    pub fn is_valid(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let host = match url.host_str() {
            Some(h) => h.to_lowercase(),
            None => return false,
        };

        if !self.partitions.iter().any(|p| p.contains_host(&host)) {
            return false;
        }

        let path = url.path();
        if TRAP_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            return false;
        }

        if CALENDAR_PATH.is_match(path) {
            return false;
        }

        if let Some(query) = url.query() {
            if self.is_query_trap(&host, query) {
                return false;
            }
        }

        !BLOCKED_EXTENSION.is_match(&path.to_lowercase())
    }

    fn is_query_trap(&self, host: &str, query: &str) -> bool {
        for param in query.split('&') {
            if DISALLOWED_QUERIES.iter().any(|q| param.contains(q)) {
                return true;
            }

            if host.ends_with(ARCHIVE_HOST) && ARCHIVE_PARAMS.contains(&param) {
                let mut counts = self
                    .archive_counts
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let count = counts
                    .entry((host.to_string(), param.to_string()))
                    .or_insert(0);
                *count += 1;
                if *count > ARCHIVE_QUERY_CAP {
                    return true;
                }
            }
        }
        false
    }
}
