//! Target lookup.
//!
//! # Responsibilities
//! - Store the ordered rule table
//! - Resolve a request's host and path to an upstream target
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Total: unmatched requests fall back to a default target
//! - First match wins, in table order

use crate::routing::matcher::{AnyMatcher, HostContains, Matcher, PathContains};
use crate::routing::target::UpstreamTarget;

#[derive(Debug)]
struct Rule {
    matcher: Box<dyn Matcher>,
    target: UpstreamTarget,
}

/// Maps inbound requests to upstream targets.
#[derive(Debug)]
pub struct Router {
    rules: Vec<Rule>,
    fallback: UpstreamTarget,
}

impl Router {
    /// Router with no rules; everything resolves to `fallback`.
    pub fn new(fallback: UpstreamTarget) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule. Rules are evaluated in insertion order.
    pub fn rule(mut self, matcher: impl Matcher + 'static, target: UpstreamTarget) -> Self {
        self.rules.push(Rule {
            matcher: Box::new(matcher),
            target,
        });
        self
    }

    /// The production rule table.
    ///
    /// 1. host has "pixelgun", or path has `/get_files_info.php` or `/advert_bcw` → Pixelgun
    /// 2. host has "fyber", or path has `sdk-config` or `video-cache` → Fyber
    /// 3. anything else → BlockCity
    pub fn standard() -> Self {
        Self::new(UpstreamTarget::BlockCity)
            .rule(
                AnyMatcher::new(vec![
                    Box::new(HostContains::new("pixelgun")),
                    Box::new(PathContains::new("/get_files_info.php")),
                    Box::new(PathContains::new("/advert_bcw")),
                ]),
                UpstreamTarget::Pixelgun,
            )
            .rule(
                AnyMatcher::new(vec![
                    Box::new(HostContains::new("fyber")),
                    Box::new(PathContains::new("sdk-config")),
                    Box::new(PathContains::new("video-cache")),
                ]),
                UpstreamTarget::Fyber,
            )
    }

    pub fn resolve(&self, host: &str, path: &str) -> UpstreamTarget {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(host, path))
            .map(|rule| rule.target)
            .unwrap_or(self.fallback)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::standard()
    }
}
