//! HTML parser for extracting tokens, tag counts and links
//!
//! This module handles parsing HTML content to extract:
//! - The word tokens of the document text
//! - The number of HTML elements, used for low-information classification
//! - Links to follow (from <a href> tags)

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Lowercase word tokens of the document text, in document order
    pub tokens: Vec<String>,

    /// Number of element nodes in the document
    pub tag_count: usize,

    /// All links found on the page (absolute, fragment removed)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts tokens, tag count and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that is not http(s) after resolution
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the content was served from, for resolving relative links
///
/// # Example
///
/// ```
/// use uci_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><body><p>Hello World</p><a href="/page#top">Link</a></body></html>"#;
/// let base_url = Url::parse("https://www.ics.uci.edu/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.tokens, vec!["hello", "world", "link"]);
/// assert_eq!(parsed.links, vec!["https://www.ics.uci.edu/page"]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let text = document.root_element().text().collect::<Vec<_>>().join(" ");

    ParsedPage {
        tokens: tokenize(&text),
        tag_count: count_elements(&document),
        links: collect_links(&document, base_url),
    }
}

/// Extracts only the links from HTML content
///
/// Used for redirect responses, which are link sources only.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    collect_links(&Html::parse_document(html), base_url)
}

/// Splits text into lowercase runs of ASCII letters and digits
///
/// # Example
///
/// ```
/// use uci_crawler::crawler::tokenize;
///
/// assert_eq!(tokenize("Don't PANIC, it's 2024!"), vec!["don", "t", "panic", "it", "s", "2024"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect()
}

fn count_elements(document: &Html) -> usize {
    document
        .tree
        .nodes()
        .filter(|node| node.value().is_element())
        .count()
}

fn collect_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL without its fragment
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
