use crate::url::matches_domain;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use uci_crawler::url::extract_domain;
///
/// let url = Url::parse("https://VISION.ics.uci.edu/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("vision.ics.uci.edu".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the subdomain to count for `root`, if the URL's host is one
///
/// The bare root and its "www" form are not counted as subdomains.
pub fn counted_subdomain(url: &Url, root: &str) -> Option<String> {
    let host = extract_domain(url)?;
    if host == root || host == format!("www.{}", root) {
        return None;
    }
    matches_domain(root, &host).then_some(host)
}
