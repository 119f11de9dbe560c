//! Crawl statistics aggregation
//!
//! `CrawlStatistics` is shared by every worker. Each classified page updates
//! the in-memory tables and appends to the per-event logs; the token and
//! subdomain tables are snapshotted to disk every `flush_every` pages so a
//! crash loses at most that many pages of aggregate counts.

use crate::config::Config;
use crate::dedup::Fingerprint;
use crate::output::logs::{
    StatsFiles, ALL_TOKENS_FILE, ERROR_FILE, FINGERPRINTS_FILE, LOW_INFO_FILE, REPORT_FILE,
    SUBDOMAINS_FILE, UNIQUE_LINKS_FILE,
};
use crate::output::{write_report, CrawlReport, OutputResult};
use crate::url::counted_subdomain;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;
use url::Url;

/// One classified, non-duplicate page
#[derive(Debug, Clone, Copy)]
pub struct PageRecord<'a> {
    pub url: &'a Url,
    pub tokens: &'a [String],
    pub fingerprint: Fingerprint,
    pub low_information: bool,
}

#[derive(Debug, Default)]
struct Tables {
    unique_links: HashMap<String, u64>,
    subdomains: HashMap<String, u64>,
    tokens: HashMap<String, u64>,
    low_info: HashMap<String, u64>,
    pages_since_flush: u32,
}

/// Running aggregates of a crawl
#[derive(Debug)]
pub struct CrawlStatistics {
    files: StatsFiles,
    subdomain_root: String,
    flush_every: u32,
    tables: Mutex<Tables>,
}

impl CrawlStatistics {
    /// Starts empty statistics, discarding any logs left in `dir`
    pub fn create(
        dir: impl Into<PathBuf>,
        subdomain_root: impl Into<String>,
        flush_every: u32,
    ) -> OutputResult<Self> {
        let files = StatsFiles::create(dir)?;
        files.clear()?;
        Ok(Self::with_tables(files, subdomain_root, flush_every, Tables::default()))
    }

    /// Rebuilds statistics from the logs in `dir`
    ///
    /// Returns the retained fingerprints alongside so the duplicate detector
    /// can be seeded with them.
    pub fn load(
        dir: impl Into<PathBuf>,
        subdomain_root: impl Into<String>,
        flush_every: u32,
    ) -> OutputResult<(Self, Vec<Fingerprint>)> {
        let files = StatsFiles::create(dir)?;

        let tables = Tables {
            unique_links: files.read_pairs(UNIQUE_LINKS_FILE)?.into_iter().collect(),
            subdomains: files.read_pairs(SUBDOMAINS_FILE)?.into_iter().collect(),
            tokens: files.read_pairs(ALL_TOKENS_FILE)?.into_iter().collect(),
            low_info: files.read_pairs(LOW_INFO_FILE)?.into_iter().collect(),
            pages_since_flush: 0,
        };
        let fingerprints = files.read_fingerprints()?;

        tracing::info!(
            "Loaded statistics: {} unique links, {} tokens, {} fingerprints",
            tables.unique_links.len(),
            tables.tokens.len(),
            fingerprints.len()
        );

        Ok((
            Self::with_tables(files, subdomain_root, flush_every, tables),
            fingerprints,
        ))
    }

    /// Creates or loads statistics as configured
    pub fn from_config(config: &Config, fresh: bool) -> OutputResult<(Self, Vec<Fingerprint>)> {
        let output = &config.output;
        if fresh {
            let stats = Self::create(&output.directory, &output.subdomain_root, output.flush_every)?;
            Ok((stats, Vec::new()))
        } else {
            Self::load(&output.directory, &output.subdomain_root, output.flush_every)
        }
    }

    fn with_tables(
        files: StatsFiles,
        subdomain_root: impl Into<String>,
        flush_every: u32,
        tables: Tables,
    ) -> Self {
        Self {
            files,
            subdomain_root: subdomain_root.into(),
            flush_every: flush_every.max(1),
            tables: Mutex::new(tables),
        }
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True if the page has already been counted as a unique link
    pub fn is_unique_link(&self, url: &str) -> bool {
        self.tables().unique_links.contains_key(url)
    }

    /// Records a classified page
    ///
    /// The fingerprint is always logged and the tokens always count towards
    /// the global table. Low-information pages go to their own log; other
    /// pages count as unique links and towards their subdomain, except
    /// sitemap and XML resources.
    pub fn record_page(&self, page: PageRecord<'_>) -> OutputResult<()> {
        let mut tables = self.tables();
        let url = page.url.as_str();
        let token_count = page.tokens.len() as u64;

        self.files
            .append_line(FINGERPRINTS_FILE, &page.fingerprint.to_string())?;

        for token in page.tokens {
            *tables.tokens.entry(token.clone()).or_insert(0) += 1;
        }

        if page.low_information {
            tables.low_info.insert(url.to_string(), token_count);
            self.files
                .append_line(LOW_INFO_FILE, &format!("{}, {}", url, token_count))?;
        } else if !url.contains("sitemap") && !url.contains("xml") {
            tables.unique_links.insert(url.to_string(), token_count);
            self.files
                .append_line(UNIQUE_LINKS_FILE, &format!("{}, {}", url, token_count))?;

            if let Some(subdomain) = counted_subdomain(page.url, &self.subdomain_root) {
                *tables.subdomains.entry(subdomain).or_insert(0) += 1;
            }
        }

        tables.pages_since_flush += 1;
        if tables.pages_since_flush >= self.flush_every {
            tables.pages_since_flush = 0;
            self.write_snapshots(&tables)?;
        }

        Ok(())
    }

    /// Appends an extraction failure to the error log
    pub fn record_error(&self, url: &str, error: &str) -> OutputResult<()> {
        // Serialized with the other log writers
        let _tables = self.tables();
        self.files
            .append_line(ERROR_FILE, &format!("{} -- {}", error, url))
    }

    /// Rewrites the token and subdomain snapshots
    pub fn flush(&self) -> OutputResult<()> {
        let tables = self.tables();
        self.write_snapshots(&tables)
    }

    fn write_snapshots(&self, tables: &Tables) -> OutputResult<()> {
        let tokens: BTreeMap<&String, &u64> = tables.tokens.iter().collect();
        self.files.write_pairs(ALL_TOKENS_FILE, tokens)?;

        let subdomains: BTreeMap<&String, &u64> = tables.subdomains.iter().collect();
        self.files.write_pairs(SUBDOMAINS_FILE, subdomains)?;
        Ok(())
    }

    /// Builds a report from the current tables
    pub fn report(&self) -> CrawlReport {
        let tables = self.tables();
        CrawlReport::new(
            &tables.unique_links,
            &tables.subdomains,
            &tables.tokens,
            tables.low_info.len(),
            self.subdomain_root.clone(),
        )
    }

    /// Flushes the snapshots and writes the final report
    pub fn finalize(&self) -> OutputResult<CrawlReport> {
        self.flush()?;
        let report = self.report();
        write_report(&report, &self.files.path(REPORT_FILE))?;
        tracing::info!(
            "Wrote report to {}",
            self.files.path(REPORT_FILE).display()
        );
        Ok(report)
    }

    pub fn unique_count(&self) -> usize {
        self.tables().unique_links.len()
    }

    pub fn low_info_count(&self) -> usize {
        self.tables().low_info.len()
    }

    /// Frequency of one token in the global table
    pub fn token_frequency(&self, token: &str) -> u64 {
        self.tables().tokens.get(token).copied().unwrap_or(0)
    }

    /// Token count recorded for a unique link
    pub fn unique_link_tokens(&self, url: &str) -> Option<u64> {
        self.tables().unique_links.get(url).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tokens(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("token{}", i % 10)).collect()
    }

    fn record(stats: &CrawlStatistics, url: &str, tokens: &[String], low_information: bool) {
        let url = Url::parse(url).unwrap();
        stats
            .record_page(PageRecord {
                url: &url,
                tokens,
                fingerprint: Fingerprint::compute(tokens),
                low_information,
            })
            .unwrap();
    }

    #[test]
    fn test_unique_page_counts() {
        let dir = TempDir::new().unwrap();
        let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();

        record(&stats, "https://vision.ics.uci.edu/a", &tokens(80), false);

        assert!(stats.is_unique_link("https://vision.ics.uci.edu/a"));
        assert_eq!(stats.unique_link_tokens("https://vision.ics.uci.edu/a"), Some(80));
        assert_eq!(stats.token_frequency("token3"), 8);
        assert_eq!(stats.report().subdomains, vec![("vision.ics.uci.edu".to_string(), 1)]);
    }

    #[test]
    fn test_low_info_page_counts_tokens_only() {
        let dir = TempDir::new().unwrap();
        let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();

        record(&stats, "https://vision.ics.uci.edu/thin", &tokens(10), true);

        assert!(!stats.is_unique_link("https://vision.ics.uci.edu/thin"));
        assert_eq!(stats.low_info_count(), 1);
        assert_eq!(stats.token_frequency("token0"), 1);
        assert!(stats.report().subdomains.is_empty());
    }

    #[test]
    fn test_sitemap_pages_not_unique() {
        let dir = TempDir::new().unwrap();
        let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();

        record(&stats, "https://www.ics.uci.edu/sitemap", &tokens(80), false);
        record(&stats, "https://www.ics.uci.edu/feed.xml", &tokens(80), false);

        assert_eq!(stats.unique_count(), 0);
        assert_eq!(stats.token_frequency("token0"), 16);
    }

    #[test]
    fn test_snapshots_flushed_every_n_pages() {
        let dir = TempDir::new().unwrap();
        let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 2).unwrap();
        let snapshot = dir.path().join(ALL_TOKENS_FILE);

        record(&stats, "https://www.ics.uci.edu/1", &tokens(60), false);
        assert!(!snapshot.exists());

        record(&stats, "https://www.ics.uci.edu/2", &tokens(60), false);
        assert!(snapshot.exists());
    }

    #[test]
    fn test_load_restores_tables_and_fingerprints() {
        let dir = TempDir::new().unwrap();
        let page = tokens(80);
        {
            let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();
            record(&stats, "https://vision.ics.uci.edu/a", &page, false);
            record(&stats, "https://www.ics.uci.edu/thin", &tokens(5), true);
            stats.flush().unwrap();
        }

        let (stats, fingerprints) =
            CrawlStatistics::load(dir.path(), "ics.uci.edu", 100).unwrap();

        assert!(stats.is_unique_link("https://vision.ics.uci.edu/a"));
        assert_eq!(stats.low_info_count(), 1);
        assert_eq!(stats.token_frequency("token1"), 9);
        assert_eq!(fingerprints.len(), 2);
        assert_eq!(fingerprints[0], Fingerprint::compute(&page));
    }

    #[test]
    fn test_create_discards_previous_logs() {
        let dir = TempDir::new().unwrap();
        {
            let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();
            record(&stats, "https://vision.ics.uci.edu/a", &tokens(80), false);
        }

        CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();
        let (stats, fingerprints) =
            CrawlStatistics::load(dir.path(), "ics.uci.edu", 100).unwrap();
        assert_eq!(stats.unique_count(), 0);
        assert!(fingerprints.is_empty());
    }

    #[test]
    fn test_record_error_appends() {
        let dir = TempDir::new().unwrap();
        let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();
        stats
            .record_error("https://www.ics.uci.edu/x", "bad markup")
            .unwrap();

        let log = std::fs::read_to_string(dir.path().join(ERROR_FILE)).unwrap();
        assert_eq!(log, "bad markup -- https://www.ics.uci.edu/x\n");
    }

    #[test]
    fn test_finalize_writes_report() {
        let dir = TempDir::new().unwrap();
        let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();
        record(&stats, "https://vision.ics.uci.edu/a", &tokens(80), false);

        let report = stats.finalize().unwrap();
        assert_eq!(report.unique_links, 1);
        assert_eq!(report.longest_page.1, 80);
        assert!(dir.path().join(REPORT_FILE).exists());
        assert!(dir.path().join(SUBDOMAINS_FILE).exists());
    }
}
