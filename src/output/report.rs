use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Number of words listed in the report
pub const TOP_WORDS: usize = 50;

/// Snapshot of the crawl statistics used to render the final report
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// When the report was generated
    pub generated_at: DateTime<Utc>,

    /// Number of unique, informative pages
    pub unique_links: usize,

    /// The page with the most tokens and its token count
    pub longest_page: (String, u64),

    /// Domain whose subdomains are counted
    pub subdomain_root: String,

    /// Subdomains and their page counts, sorted alphabetically
    pub subdomains: Vec<(String, u64)>,

    /// Most frequent tokens, most frequent first
    pub top_words: Vec<(String, u64)>,

    /// Number of pages classified as low-information
    pub low_info_pages: usize,
}

impl CrawlReport {
    pub fn new(
        unique_links: &HashMap<String, u64>,
        subdomains: &HashMap<String, u64>,
        tokens: &HashMap<String, u64>,
        low_info_pages: usize,
        subdomain_root: impl Into<String>,
    ) -> Self {
        let mut sorted_subdomains: Vec<(String, u64)> = subdomains
            .iter()
            .map(|(sub, count)| (sub.clone(), *count))
            .collect();
        sorted_subdomains.sort();

        Self {
            generated_at: Utc::now(),
            unique_links: unique_links.len(),
            longest_page: longest_page(unique_links),
            subdomain_root: subdomain_root.into(),
            subdomains: sorted_subdomains,
            top_words: top_words(tokens, TOP_WORDS),
            low_info_pages,
        }
    }
}

/// Finds the page with the most tokens
///
/// Ties go to the lexicographically smallest URL. An empty table yields
/// `("", 0)`.
pub fn longest_page(unique_links: &HashMap<String, u64>) -> (String, u64) {
    unique_links
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(url, count)| (url.clone(), *count))
        .unwrap_or_default()
}

/// The `n` most frequent tokens, ties broken alphabetically
pub fn top_words(tokens: &HashMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut words: Vec<(String, u64)> = tokens
        .iter()
        .map(|(token, freq)| (token.clone(), *freq))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(n);
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_longest_page() {
        let links = table(&[("https://a.ics.uci.edu/", 10), ("https://b.ics.uci.edu/", 30)]);
        assert_eq!(longest_page(&links), ("https://b.ics.uci.edu/".to_string(), 30));
    }

    #[test]
    fn test_longest_page_tie_prefers_smallest_url() {
        let links = table(&[
            ("https://z.ics.uci.edu/", 30),
            ("https://b.ics.uci.edu/", 30),
            ("https://m.ics.uci.edu/", 30),
        ]);
        assert_eq!(longest_page(&links), ("https://b.ics.uci.edu/".to_string(), 30));
    }

    #[test]
    fn test_longest_page_empty() {
        assert_eq!(longest_page(&HashMap::new()), (String::new(), 0));
    }

    #[test]
    fn test_top_words_order() {
        let tokens = table(&[("uci", 5), ("beta", 7), ("alpha", 7), ("ics", 1)]);
        let top = top_words(&tokens, 3);
        assert_eq!(
            top,
            vec![
                ("alpha".to_string(), 7),
                ("beta".to_string(), 7),
                ("uci".to_string(), 5),
            ]
        );
    }

    #[test]
    fn test_report_sorts_subdomains() {
        let subdomains = table(&[("vision.ics.uci.edu", 4), ("archive.ics.uci.edu", 9)]);
        let report = CrawlReport::new(
            &HashMap::new(),
            &subdomains,
            &HashMap::new(),
            2,
            "ics.uci.edu",
        );
        assert_eq!(report.subdomains[0].0, "archive.ics.uci.edu");
        assert_eq!(report.subdomains[1].0, "vision.ics.uci.edu");
        assert_eq!(report.unique_links, 0);
        assert_eq!(report.low_info_pages, 2);
    }
}
