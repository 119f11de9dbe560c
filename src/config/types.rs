use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Returns true when the crawl runs one worker over a single global queue
    pub fn is_single_worker(&self) -> bool {
        self.crawler.workers == 1
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of workers; 1 selects the single-queue mode, otherwise one per domain
    pub workers: u32,

    /// Time slept after each URL, per partition (milliseconds)
    #[serde(rename = "politeness-delay")]
    pub politeness_delay: u64,

    /// Time a primary fetch may run before a speculative fetch starts (milliseconds)
    #[serde(rename = "speculative-delay", default = "default_speculative_delay")]
    pub speculative_delay: u64,

    /// Maximum declared Content-Length accepted by the transport (bytes)
    #[serde(rename = "max-content-length", default = "default_max_content_length")]
    pub max_content_length: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Pause before restarting after a connectivity failure (seconds)
    #[serde(rename = "reconnect-delay", default = "default_reconnect_delay")]
    pub reconnect_delay: u64,

    /// Consecutive connection failures that abort a crawl cycle
    #[serde(
        rename = "connectivity-failure-threshold",
        default = "default_connectivity_failure_threshold"
    )]
    pub connectivity_failure_threshold: usize,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the agent identity sent with every request
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Frontier configuration: durable store, seeds and partitions
#[derive(Debug, Clone, Deserialize)]
pub struct FrontierConfig {
    /// Path to the SQLite URL store
    #[serde(rename = "save-file")]
    pub save_file: String,

    /// Seed URLs added on a fresh start
    pub seeds: Vec<String>,

    /// Allowed domain suffixes, one partition each (e.g. "ics.uci.edu")
    pub domains: Vec<String>,
}

/// Near-duplicate detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    /// Normalized Hamming distance below which two pages are near-duplicates
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding statistics logs and the final report
    pub directory: String,

    /// Domain whose subdomains are counted in the report
    #[serde(rename = "subdomain-root")]
    pub subdomain_root: String,

    /// Number of processed pages between snapshot flushes
    #[serde(rename = "flush-every", default = "default_flush_every")]
    pub flush_every: u32,
}

fn default_speculative_delay() -> u64 {
    200
}

fn default_max_content_length() -> u64 {
    250 * 1024
}

fn default_request_timeout() -> u64 {
    30
}

fn default_reconnect_delay() -> u64 {
    60
}

fn default_connectivity_failure_threshold() -> usize {
    25
}

fn default_threshold() -> f64 {
    0.05
}

fn default_flush_every() -> u32 {
    100
}
