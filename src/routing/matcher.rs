//! Route matching logic.
//!
//! # Responsibilities
//! - Match a substring of the host header (case-insensitive)
//! - Match a substring of the path (case-sensitive)
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Path matching is case-sensitive
//! - Substring containment instead of prefix match, so historical URL shapes
//!   from the same clients keep routing without client changes
//! - No regex to guarantee O(n) matching

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request's host and path match this condition.
    fn matches(&self, host: &str, path: &str) -> bool;
}

/// Matches when the Host header contains a fragment.
#[derive(Debug, Clone)]
pub struct HostContains {
    fragment: String,
}

impl HostContains {
    /// Create a new host matcher.
    /// The fragment is normalized to lowercase for case-insensitive matching.
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into().to_lowercase(),
        }
    }
}

impl Matcher for HostContains {
    fn matches(&self, host: &str, _path: &str) -> bool {
        host.to_lowercase().contains(&self.fragment)
    }
}

/// Matches when the request path contains a fragment.
#[derive(Debug, Clone)]
pub struct PathContains {
    fragment: String,
}

impl PathContains {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
        }
    }
}

impl Matcher for PathContains {
    fn matches(&self, _host: &str, path: &str) -> bool {
        path.contains(&self.fragment)
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, host: &str, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(host, path))
    }
}
