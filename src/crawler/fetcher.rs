//! HTTP fetch transport
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Rejecting URLs that fail the validity filter before any request
//! - HEAD requests to enforce the content length ceiling
//! - GET requests to fetch page content, following redirects
//! - Plain text fetches for robots.txt and sitemap resources

use crate::config::Config;
use crate::url::ValidityFilter;
use crate::{CrawlError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{redirect::Policy, Client, Response};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Result of a page fetch
///
/// Failures are carried in `error` rather than returned as `Err` so that the
/// worker can log them and continue with the next URL.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// HTTP status code, 0 when no response was received
    pub status: u16,
    /// Response body
    pub content: Option<String>,
    /// Description of the failure, if any
    pub error: Option<String>,
    /// URL after redirects
    pub final_url: String,
    /// Set when the request failed to connect to the remote host
    pub connection_failed: bool,
}

impl FetchResponse {
    /// A successful response
    pub fn ok(status: u16, content: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            status,
            content: Some(content.into()),
            final_url: final_url.into(),
            ..Self::default()
        }
    }

    /// A response that carries only an error
    pub fn failed(status: u16, error: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
            final_url: url.into(),
            ..Self::default()
        }
    }

    /// True for a 2xx or 3xx status with no error
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..400).contains(&self.status)
    }
}

/// Fetches pages and auxiliary text resources
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches a page for extraction
    async fn fetch_page(&self, url: &Url) -> FetchResponse;

    /// Fetches a small text resource, returning its status and body
    ///
    /// Errors only when no HTTP response was received.
    async fn get_text(&self, url: &Url) -> Result<(u16, String)>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> std::result::Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    Client::builder()
        .user_agent(config.user_agent.user_agent_string())
        .timeout(Duration::from_secs(config.crawler.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    filter: Arc<ValidityFilter>,
    max_content_length: u64,
}

impl HttpTransport {
    pub fn new(client: Client, filter: Arc<ValidityFilter>, max_content_length: u64) -> Self {
        Self {
            client,
            filter,
            max_content_length,
        }
    }

    /// Builds a transport from the crawler configuration
    pub fn from_config(config: &Config, filter: Arc<ValidityFilter>) -> Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, filter, config.crawler.max_content_length))
    }

    fn oversized(&self, url: &Url, response: &Response) -> Option<CrawlError> {
        let length = declared_length(response)?;
        (length > self.max_content_length).then(|| CrawlError::OversizedContent {
            url: url.to_string(),
            length,
            limit: self.max_content_length,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Fetches a page
    ///
    /// # Request Flow
    ///
    /// 1. Reject the URL with status 0 if it fails the validity filter
    /// 2. Send HEAD request
    ///    - If the declared Content-Length exceeds the ceiling → error response
    /// 3. Send GET request, following up to 10 redirects
    /// 4. Return status, body and final URL
    async fn fetch_page(&self, url: &Url) -> FetchResponse {
        if !self.filter.is_valid(url) {
            let error = CrawlError::InvalidUrl {
                url: url.to_string(),
            };
            return FetchResponse::failed(0, error.to_string(), url.as_str());
        }

        match self.client.head(url.clone()).send().await {
            Ok(head) => {
                if let Some(error) = self.oversized(url, &head) {
                    return FetchResponse::failed(head.status().as_u16(), error.to_string(), url.as_str());
                }
            }
            Err(e) if e.is_connect() => return transport_failure(url, e),
            // Some servers reject HEAD; the GET decides
            Err(e) => tracing::debug!("HEAD failed for {}: {}", url, e),
        }

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(url, e),
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        if let Some(error) = self.oversized(url, &response) {
            return FetchResponse::failed(status, error.to_string(), final_url);
        }

        match response.text().await {
            Ok(body) => FetchResponse::ok(status, body, final_url),
            Err(e) => FetchResponse::failed(status, e.to_string(), final_url),
        }
    }

    async fn get_text(&self, url: &Url) -> Result<(u16, String)> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| CrawlError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok((status, body))
    }
}

/// Reads the declared Content-Length header
fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn transport_failure(url: &Url, error: reqwest::Error) -> FetchResponse {
    let connection_failed = error.is_connect();
    let error = CrawlError::Fetch {
        url: url.to_string(),
        message: error.to_string(),
    };
    FetchResponse {
        connection_failed,
        ..FetchResponse::failed(0, error.to_string(), url.as_str())
    }
}
