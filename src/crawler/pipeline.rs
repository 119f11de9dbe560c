//! Page classification and link extraction
//!
//! Turns a fetch response into the set of links to follow, updating the
//! crawl statistics along the way. Near-duplicate pages contribute nothing.

use crate::crawler::fetcher::FetchResponse;
use crate::crawler::parser::{extract_links, parse_html};
use crate::dedup::{DuplicateDetector, Fingerprint};
use crate::output::{CrawlStatistics, PageRecord};
use crate::url::ValidityFilter;
use crate::CrawlError;
use std::sync::Arc;
use url::Url;

/// Token/tag ratio at or below which a page is low-information
pub const LOW_INFO_RATIO: f64 = 0.22;

/// Pages with fewer tokens than this are low-information
pub const MIN_INFORMATIVE_TOKENS: usize = 50;

/// How a fetched page was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Already counted as a unique link in this or a previous run
    AlreadySeen,
    /// Near-duplicate of a retained page
    Duplicate,
    /// Informative page
    Unique,
    /// Page kept for its tokens but too thin to count
    LowInformation,
    /// Redirect response, followed for its links only
    Redirect,
    /// Any other status or a failed fetch
    Skipped,
}

/// Result of running the pipeline over one response
#[derive(Debug, Clone)]
pub struct Extraction {
    pub outcome: PageOutcome,
    /// Valid absolute links to add to the frontier
    pub links: Vec<String>,
}

impl Extraction {
    fn empty(outcome: PageOutcome) -> Self {
        Self {
            outcome,
            links: Vec::new(),
        }
    }
}

/// Returns true if a page carries too little text for its markup
pub fn is_low_information(token_count: usize, tag_count: usize) -> bool {
    if tag_count == 0 {
        return true;
    }
    let ratio = token_count as f64 / tag_count as f64;
    ratio <= LOW_INFO_RATIO || token_count < MIN_INFORMATIVE_TOKENS
}

/// Classifies pages and extracts their links
pub struct ExtractionPipeline {
    detector: DuplicateDetector,
    stats: Arc<CrawlStatistics>,
    filter: Arc<ValidityFilter>,
}

impl ExtractionPipeline {
    pub fn new(
        detector: DuplicateDetector,
        stats: Arc<CrawlStatistics>,
        filter: Arc<ValidityFilter>,
    ) -> Self {
        Self {
            detector,
            stats,
            filter,
        }
    }

    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    pub fn stats(&self) -> &CrawlStatistics {
        &self.stats
    }

    /// Processes one response
    ///
    /// # Classification
    ///
    /// - URL already counted → nothing
    /// - 200 with content → fingerprint, duplicate test, low-information
    ///   test, statistics, links
    /// - 3xx → links only
    /// - anything else → nothing, with any error recorded
    pub fn extract(&self, url: &Url, response: &FetchResponse) -> Extraction {
        if self.stats.is_unique_link(url.as_str()) {
            return Extraction::empty(PageOutcome::AlreadySeen);
        }

        if let Some(error) = &response.error {
            self.record_error(url, error);
            return Extraction::empty(PageOutcome::Skipped);
        }

        let Some(content) = response.content.as_deref() else {
            if response.status == 200 {
                let error = CrawlError::Extraction {
                    url: url.to_string(),
                    message: "response has no content".to_string(),
                };
                self.record_error(url, &error.to_string());
            }
            return Extraction::empty(PageOutcome::Skipped);
        };

        let base = self.base_url(url, response);

        match response.status {
            200 => self.classify(url, &base, content),
            300..=399 => Extraction {
                outcome: PageOutcome::Redirect,
                links: self.valid_links(extract_links(content, &base)),
            },
            _ => Extraction::empty(PageOutcome::Skipped),
        }
    }

    fn classify(&self, url: &Url, base: &Url, content: &str) -> Extraction {
        let page = parse_html(content, base);
        let fingerprint = Fingerprint::compute(&page.tokens);

        if self.detector.check_and_insert(fingerprint) {
            tracing::debug!("Discarding near-duplicate {} ({})", url, fingerprint);
            return Extraction::empty(PageOutcome::Duplicate);
        }

        let low_information = is_low_information(page.tokens.len(), page.tag_count);
        let record = PageRecord {
            url,
            tokens: &page.tokens,
            fingerprint,
            low_information,
        };
        if let Err(e) = self.stats.record_page(record) {
            tracing::warn!("Failed to record statistics for {}: {}", url, e);
        }

        Extraction {
            outcome: if low_information {
                PageOutcome::LowInformation
            } else {
                PageOutcome::Unique
            },
            links: self.valid_links(page.links),
        }
    }

    /// Links resolve against the final URL after redirects
    fn base_url(&self, url: &Url, response: &FetchResponse) -> Url {
        Url::parse(&response.final_url).unwrap_or_else(|_| url.clone())
    }

    fn valid_links(&self, links: Vec<String>) -> Vec<String> {
        links
            .into_iter()
            .filter(|link| self.filter.is_valid_str(link))
            .collect()
    }

    fn record_error(&self, url: &Url, error: &str) {
        tracing::debug!("{} -- {}", error, url);
        if let Err(e) = self.stats.record_error(url.as_str(), error) {
            tracing::warn!("Failed to record error for {}: {}", url, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> ExtractionPipeline {
        let stats = CrawlStatistics::create(dir.path(), "ics.uci.edu", 100).unwrap();
        ExtractionPipeline::new(
            DuplicateDetector::new(0.05),
            Arc::new(stats),
            Arc::new(ValidityFilter::from_domains(&["ics.uci.edu", "cs.uci.edu"])),
        )
    }

    /// A page with `words` distinct tokens and a couple of links
    fn page(words: usize, seed: &str) -> String {
        let text: Vec<String> = (0..words).map(|i| format!("{}{}", seed, i)).collect();
        format!(
            r#"<html><body><p>{}</p><a href="/next"></a><a href="https://example.com/"></a></body></html>"#,
            text.join(" ")
        )
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_low_information_classification() {
        assert!(is_low_information(40, 30));
        assert!(!is_low_information(60, 200));
        assert!(is_low_information(60, 400));
        assert!(is_low_information(500, 0));
        assert!(is_low_information(22, 100));
    }

    #[test]
    fn test_unique_page_yields_valid_links() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let page_url = url("https://vision.ics.uci.edu/a");
        let response = FetchResponse::ok(200, page(80, "alpha"), page_url.as_str());

        let extraction = pipeline.extract(&page_url, &response);

        assert_eq!(extraction.outcome, PageOutcome::Unique);
        assert_eq!(extraction.links, vec!["https://vision.ics.uci.edu/next"]);
        assert!(pipeline.stats().is_unique_link("https://vision.ics.uci.edu/a"));
        assert_eq!(pipeline.detector().len(), 1);
    }

    #[test]
    fn test_links_resolve_against_final_url() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let response = FetchResponse::ok(200, page(80, "beta"), "https://www.cs.uci.edu/moved/");

        let extraction = pipeline.extract(&url("https://www.cs.uci.edu/old"), &response);
        assert_eq!(extraction.links, vec!["https://www.cs.uci.edu/next"]);
    }

    #[test]
    fn test_duplicate_page_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let content = page(80, "gamma");

        let first = pipeline.extract(
            &url("https://www.ics.uci.edu/one"),
            &FetchResponse::ok(200, content.clone(), "https://www.ics.uci.edu/one"),
        );
        let second = pipeline.extract(
            &url("https://www.ics.uci.edu/two"),
            &FetchResponse::ok(200, content, "https://www.ics.uci.edu/two"),
        );

        assert_eq!(first.outcome, PageOutcome::Unique);
        assert_eq!(second.outcome, PageOutcome::Duplicate);
        assert!(second.links.is_empty());
        assert!(!pipeline.stats().is_unique_link("https://www.ics.uci.edu/two"));
    }

    #[test]
    fn test_low_information_page_still_yields_links() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let page_url = url("https://www.ics.uci.edu/thin");

        let extraction = pipeline.extract(
            &page_url,
            &FetchResponse::ok(200, page(10, "delta"), page_url.as_str()),
        );

        assert_eq!(extraction.outcome, PageOutcome::LowInformation);
        assert_eq!(extraction.links.len(), 1);
        assert_eq!(pipeline.stats().low_info_count(), 1);
        assert_eq!(pipeline.stats().token_frequency("delta3"), 1);
    }

    #[test]
    fn test_already_seen_page_skipped() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let page_url = url("https://www.ics.uci.edu/a");
        let response = FetchResponse::ok(200, page(80, "eps"), page_url.as_str());

        pipeline.extract(&page_url, &response);
        let again = pipeline.extract(&page_url, &response);

        assert_eq!(again.outcome, PageOutcome::AlreadySeen);
        assert!(again.links.is_empty());
    }

    #[test]
    fn test_redirect_yields_links_only() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let page_url = url("https://www.ics.uci.edu/r");

        let extraction = pipeline.extract(
            &page_url,
            &FetchResponse::ok(301, page(80, "zeta"), page_url.as_str()),
        );

        assert_eq!(extraction.outcome, PageOutcome::Redirect);
        assert_eq!(extraction.links, vec!["https://www.ics.uci.edu/next"]);
        assert!(pipeline.detector().is_empty());
        assert_eq!(pipeline.stats().unique_count(), 0);
    }

    #[test]
    fn test_not_found_and_errors_yield_nothing() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let page_url = url("https://www.ics.uci.edu/missing");

        let missing = pipeline.extract(
            &page_url,
            &FetchResponse::ok(404, page(80, "eta"), page_url.as_str()),
        );
        let failed = pipeline.extract(
            &page_url,
            &FetchResponse::failed(0, "connection reset", page_url.as_str()),
        );

        assert_eq!(missing.outcome, PageOutcome::Skipped);
        assert_eq!(failed.outcome, PageOutcome::Skipped);
        assert!(missing.links.is_empty() && failed.links.is_empty());

        let errors = std::fs::read_to_string(dir.path().join("error.txt")).unwrap();
        assert_eq!(errors, "connection reset -- https://www.ics.uci.edu/missing\n");
    }

    #[test]
    fn test_empty_success_recorded_as_extraction_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let page_url = url("https://www.ics.uci.edu/blank");
        let response = FetchResponse {
            status: 200,
            final_url: page_url.to_string(),
            ..FetchResponse::default()
        };

        let extraction = pipeline.extract(&page_url, &response);

        assert_eq!(extraction.outcome, PageOutcome::Skipped);
        let errors = std::fs::read_to_string(dir.path().join("error.txt")).unwrap();
        assert!(errors.contains("Extraction failed for https://www.ics.uci.edu/blank"));
    }
}
