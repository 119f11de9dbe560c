use crate::config::types::{
    Config, CrawlerConfig, DedupConfig, FrontierConfig, OutputConfig, UserAgentConfig,
};
use crate::url::matches_domain;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_frontier_config(&config.frontier)?;
    validate_crawler_config(&config.crawler, config.frontier.domains.len())?;
    validate_user_agent_config(&config.user_agent)?;
    validate_dedup_config(&config.dedup)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig, partitions: usize) -> Result<(), ConfigError> {
    if config.workers != 1 && config.workers as usize != partitions {
        return Err(ConfigError::Validation(format!(
            "workers must be 1 or equal to the number of domains ({}), got {}",
            partitions, config.workers
        )));
    }

    if config.speculative_delay < 1 {
        return Err(ConfigError::Validation(
            "speculative_delay must be >= 1ms".to_string(),
        ));
    }

    if config.max_content_length < 1 {
        return Err(ConfigError::Validation(
            "max_content_length must be >= 1 byte".to_string(),
        ));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1s".to_string(),
        ));
    }

    if config.connectivity_failure_threshold < 1 {
        return Err(ConfigError::Validation(
            "connectivity_failure_threshold must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates the frontier seeds, store path and partition domains
fn validate_frontier_config(config: &FrontierConfig) -> Result<(), ConfigError> {
    if config.save_file.is_empty() {
        return Err(ConfigError::Validation(
            "save_file cannot be empty".to_string(),
        ));
    }

    if config.domains.is_empty() {
        return Err(ConfigError::Validation(
            "at least one allowed domain is required".to_string(),
        ));
    }

    for domain in &config.domains {
        validate_domain_string(domain)?;
    }

    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        let host = url.host_str().unwrap_or_default();
        if !config
            .domains
            .iter()
            .any(|domain| matches_domain(domain, host))
        {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' is outside the allowed domains",
                seed
            )));
        }
    }

    Ok(())
}

fn validate_dedup_config(config: &DedupConfig) -> Result<(), ConfigError> {
    if !(config.threshold > 0.0 && config.threshold <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "dedup threshold must be in (0, 1], got {}",
            config.threshold
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.flush_every < 1 {
        return Err(ConfigError::Validation(
            "flush_every must be >= 1".to_string(),
        ));
    }

    validate_domain_string(&config.subdomain_root)?;

    Ok(())
}

/// Validates a bare domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'ics.uci.edu')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("ics.uci.edu").is_ok());
        assert!(validate_domain_string("informatics.uci.edu").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string("*.uci.edu").is_err());
        assert!(validate_domain_string("localhost").is_err());
        assert!(validate_domain_string(".uci.edu").is_err());
        assert!(validate_domain_string("uci..edu").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    fn frontier(seeds: &[&str]) -> FrontierConfig {
        FrontierConfig {
            save_file: "frontier.db".to_string(),
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            domains: vec!["ics.uci.edu".to_string(), "cs.uci.edu".to_string()],
        }
    }

    #[test]
    fn test_seeds_must_be_in_allowed_domains() {
        assert!(validate_frontier_config(&frontier(&[
            "https://www.ics.uci.edu",
            "https://cs.uci.edu/people"
        ]))
        .is_ok());

        assert!(validate_frontier_config(&frontier(&["https://www.stat.uci.edu"])).is_err());
        assert!(validate_frontier_config(&frontier(&["https://example.com/"])).is_err());
        assert!(validate_frontier_config(&frontier(&["ftp://www.ics.uci.edu/"])).is_err());
    }

    #[test]
    fn test_dedup_threshold_bounds() {
        assert!(validate_dedup_config(&DedupConfig { threshold: 0.05 }).is_ok());
        assert!(validate_dedup_config(&DedupConfig { threshold: 1.0 }).is_ok());
        assert!(validate_dedup_config(&DedupConfig { threshold: 0.0 }).is_err());
        assert!(validate_dedup_config(&DedupConfig { threshold: 1.5 }).is_err());
    }

    #[test]
    fn test_worker_count_must_match_partitions() {
        let crawler = CrawlerConfig {
            workers: 2,
            politeness_delay: 0,
            speculative_delay: 200,
            max_content_length: 1024,
            request_timeout: 30,
            reconnect_delay: 60,
            connectivity_failure_threshold: 25,
        };
        assert!(validate_crawler_config(&crawler, 4).is_err());
        assert!(validate_crawler_config(&crawler, 2).is_ok());

        let single = CrawlerConfig {
            workers: 1,
            ..crawler
        };
        assert!(validate_crawler_config(&single, 4).is_ok());
    }
}
