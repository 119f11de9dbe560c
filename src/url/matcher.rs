/// Checks if a host belongs to an allowed domain
///
/// A host matches when it is the domain itself or any subdomain of it:
/// "ics.uci.edu" matches "ics.uci.edu", "www.ics.uci.edu" and
/// "vision.ics.uci.edu", but not "informatics.uci.edu".
///
/// # Examples
///
/// ```
/// use uci_crawler::url::matches_domain;
///
/// assert!(matches_domain("ics.uci.edu", "ics.uci.edu"));
/// assert!(matches_domain("ics.uci.edu", "www.ics.uci.edu"));
/// assert!(!matches_domain("ics.uci.edu", "informatics.uci.edu"));
/// ```
pub fn matches_domain(domain: &str, host: &str) -> bool {
    if domain.is_empty() || host.is_empty() {
        return false;
    }

    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}
