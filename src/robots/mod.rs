//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! Any failure to retrieve a host's robots.txt is treated as permission to crawl.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use crate::crawler::Transport;
use crate::{CrawlError, Result};
use url::Url;

/// Builds the robots.txt location for a URL's host
pub fn robots_url(url: &Url) -> Result<Url> {
    Ok(url.join("/robots.txt")?)
}

/// Fetches robots.txt for a URL's host
///
/// # Status Handling
///
/// | Response | Policy |
/// |----------|--------|
/// | 200 | parse the body |
/// | 401, 403 | disallow all |
/// | anything else | allow all |
/// | no response | `CrawlError::PolicyUnavailable` |
pub async fn fetch_robots(transport: &dyn Transport, url: &Url) -> Result<ParsedRobots> {
    let location = robots_url(url)?;

    let (status, body) = transport
        .get_text(&location)
        .await
        .map_err(|e| CrawlError::PolicyUnavailable {
            url: location.to_string(),
            message: e.to_string(),
        })?;

    Ok(match status {
        200 => ParsedRobots::from_content(&body),
        401 | 403 => ParsedRobots::disallow_all(),
        _ => ParsedRobots::allow_all(),
    })
}

/// Crawl policy checks with a shared per-host cache
pub struct RobotsPolicy {
    cache: RobotsCache,
    user_agent: String,
}

impl RobotsPolicy {
    /// Creates a policy checker matching rules against `user_agent`
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            cache: RobotsCache::new(),
            user_agent: user_agent.into(),
        }
    }

    /// Checks whether the URL may be fetched
    ///
    /// Fails open: if robots.txt cannot be retrieved the URL is allowed and
    /// nothing is cached, so the next URL on the host tries again.
    pub async fn can_fetch(&self, transport: &dyn Transport, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };

        if let Some(robots) = self.cache.get(host) {
            return robots.is_allowed(url.as_str(), &self.user_agent);
        }

        match fetch_robots(transport, url).await {
            Ok(robots) => {
                let allowed = robots.is_allowed(url.as_str(), &self.user_agent);
                self.cache.insert(host, robots);
                allowed
            }
            Err(e) => {
                tracing::debug!("{}; allowing {}", e, url);
                true
            }
        }
    }

    pub fn cache(&self) -> &RobotsCache {
        &self.cache
    }
}
