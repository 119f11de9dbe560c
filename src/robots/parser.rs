//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// What a parsed policy resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Policy {
    AllowAll,
    DisallowAll,
    Rules(String),
}

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's matcher, providing a
/// simplified interface for checking if URLs are allowed. Only allow and
/// disallow rules are honored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRobots {
    policy: Policy,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    pub fn from_content(content: &str) -> Self {
        let policy = if content.trim().is_empty() {
            Policy::AllowAll
        } else {
            Policy::Rules(content.to_string())
        };
        Self { policy }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when the host serves no robots.txt.
    pub fn allow_all() -> Self {
        Self {
            policy: Policy::AllowAll,
        }
    }

    /// Creates a ParsedRobots that forbids everything
    ///
    /// Used when robots.txt access itself is unauthorized.
    pub fn disallow_all() -> Self {
        Self {
            policy: Policy::DisallowAll,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to check (absolute, or a path such as "/page.html")
    /// * `user_agent` - The user agent product token
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.policy {
            Policy::AllowAll => true,
            Policy::DisallowAll => false,
            Policy::Rules(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
        }
    }
}
