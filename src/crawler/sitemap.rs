//! Sitemap discovery
//!
//! A host's `/sitemap.xml` is fetched after each of its pages is processed,
//! until one fetch succeeds. Every `<loc>` entry is a candidate URL.

use crate::crawler::fetcher::Transport;
use crate::{CrawlError, Result};
use scraper::{Html, Selector};
use url::Url;

/// Builds `<scheme>://<host>/sitemap.xml` for a URL
pub fn sitemap_url(url: &Url) -> Result<Url> {
    Ok(url.join("/sitemap.xml")?)
}

/// Extracts the trimmed text of every `<loc>` element
pub fn parse_sitemap(content: &str) -> Vec<String> {
    let Ok(loc_selector) = Selector::parse("loc") else {
        return Vec::new();
    };

    Html::parse_document(content)
        .select(&loc_selector)
        .map(|loc| loc.text().collect::<String>().trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// Fetches and parses the sitemap for a URL's host
///
/// A transport failure or any status other than 200 is reported as
/// `SitemapUnavailable`; callers treat it as an empty list.
pub async fn fetch_sitemap(transport: &dyn Transport, url: &Url) -> Result<Vec<String>> {
    let sitemap = sitemap_url(url)?;

    let (status, body) = transport
        .get_text(&sitemap)
        .await
        .map_err(|e| CrawlError::SitemapUnavailable {
            url: sitemap.to_string(),
            message: e.to_string(),
        })?;

    if status != 200 {
        return Err(CrawlError::SitemapUnavailable {
            url: sitemap.to_string(),
            message: format!("status {}", status),
        });
    }

    Ok(parse_sitemap(&body))
}
