//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uci_crawler::config::{
    Config, CrawlerConfig, DedupConfig, FrontierConfig, OutputConfig, UserAgentConfig,
};
use uci_crawler::crawler::{FetchResponse, Transport};
use uci_crawler::{CrawlError, Result};
use url::Url;

pub const UCI_DOMAINS: &[&str] = &[
    "informatics.uci.edu",
    "stat.uci.edu",
    "ics.uci.edu",
    "cs.uci.edu",
];

/// Creates a test configuration rooted in `dir`
pub fn test_config(dir: &Path, seeds: &[&str], workers: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers,
            politeness_delay: 0,
            speculative_delay: 10_000,
            max_content_length: 250 * 1024,
            request_timeout: 5,
            reconnect_delay: 0,
            connectivity_failure_threshold: 25,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://www.ics.uci.edu/".to_string(),
            contact_email: "test@uci.edu".to_string(),
        },
        frontier: FrontierConfig {
            save_file: dir.join("frontier.db").to_string_lossy().into_owned(),
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            domains: UCI_DOMAINS.iter().map(|d| d.to_string()).collect(),
        },
        dedup: DedupConfig { threshold: 0.05 },
        output: OutputConfig {
            directory: dir.join("crawl-data").to_string_lossy().into_owned(),
            subdomain_root: "ics.uci.edu".to_string(),
            flush_every: 100,
        },
    }
}

/// A page with `tokens` distinct words, `extra_tags` empty spans and links
pub fn html_page(seed: &str, tokens: usize, extra_tags: usize, links: &[&str]) -> String {
    let words: Vec<String> = (0..tokens).map(|i| format!("{}{}", seed, i)).collect();
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}"></a>"#, href))
        .collect();
    let spans = "<span></span>".repeat(extra_tags);
    format!(
        "<html><head></head><body><p>{}</p>{}{}</body></html>",
        words.join(" "),
        anchors,
        spans
    )
}

/// Builds a sitemap listing `locs`
pub fn sitemap_xml(locs: &[&str]) -> String {
    let urls: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        urls
    )
}

/// In-memory site served by URL
///
/// Unknown pages answer 404, as do robots.txt and sitemaps for hosts
/// without one configured. Every fetch can be slowed down to exercise the
/// speculative lanes.
#[derive(Default)]
pub struct MockSite {
    pages: HashMap<String, String>,
    robots: HashMap<String, String>,
    /// Sitemap answers per host, served in order; the last one repeats
    sitemaps: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    text_requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
    refuse_connections: bool,
    fetched: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn robots(mut self, host: &str, body: &str) -> Self {
        self.robots.insert(host.to_string(), body.to_string());
        self
    }

    pub fn sitemap(self, host: &str, answers: Vec<(u16, String)>) -> Self {
        self.sitemaps
            .lock()
            .unwrap()
            .insert(host.to_string(), answers.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unreachable() -> Self {
        Self {
            refuse_connections: true,
            ..Self::default()
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Number of sitemap requests made so far
    pub fn sitemap_requests(&self) -> usize {
        self.text_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.ends_with("/sitemap.xml"))
            .count()
    }

    fn sitemap_answer(&self, host: &str) -> (u16, String) {
        let mut sitemaps = self.sitemaps.lock().unwrap();
        match sitemaps.get_mut(host) {
            Some(answers) if answers.len() > 1 => answers.pop_front().unwrap(),
            Some(answers) => answers.front().cloned().unwrap_or((404, String::new())),
            None => (404, String::new()),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockSite {
    async fn fetch_page(&self, url: &Url) -> FetchResponse {
        self.fetched.lock().unwrap().push(url.to_string());

        if self.refuse_connections {
            return FetchResponse {
                connection_failed: true,
                ..FetchResponse::failed(0, "connection refused", url.as_str())
            };
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(url.as_str()) {
            Some(html) => FetchResponse::ok(200, html.clone(), url.as_str()),
            None => FetchResponse::ok(404, "", url.as_str()),
        }
    }

    async fn get_text(&self, url: &Url) -> Result<(u16, String)> {
        self.text_requests.lock().unwrap().push(url.to_string());

        if self.refuse_connections {
            return Err(CrawlError::Fetch {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let host = url.host_str().unwrap_or_default();
        match url.path() {
            "/robots.txt" => Ok(match self.robots.get(host) {
                Some(body) => (200, body.clone()),
                None => (404, String::new()),
            }),
            "/sitemap.xml" => Ok(self.sitemap_answer(host)),
            _ => Ok((404, String::new())),
        }
    }
}
