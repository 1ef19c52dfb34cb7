//! Content rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! NormalizationConfig
//!     → platform.rs (built-in request/response rule sets)
//!     → + extra rules from config, appended in order
//!     → RewriteRules (immutable, shared via Arc)
//!     → used by http::request (outbound) and http::response (inbound)
//! ```
//!
//! # Design Decisions
//! - Rules operate on decoded text, never on raw bytes
//! - Non-UTF-8 bodies are left untouched
//! - Substitution is textual; JSON is not parsed

pub mod platform;
pub mod rules;

pub use platform::is_android;
pub use rules::{RewriteError, RewriteRule, RuleSet};

use crate::config::{NormalizationConfig, RewriteRuleConfig};

/// The two rule sets the gateway applies.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    /// Applied to every non-empty outbound body.
    pub request: RuleSet,
    /// Applied to textual responses bound for Android clients.
    pub response: RuleSet,
}

impl RewriteRules {
    /// Built-in rules followed by any configured extras.
    pub fn from_config(config: &NormalizationConfig) -> Result<Self, RewriteError> {
        let mut request = platform::request_rules()?;
        extend(&mut request, &config.extra_request_rules)?;

        let mut response = platform::response_rules()?;
        extend(&mut response, &config.extra_response_rules)?;

        Ok(Self { request, response })
    }
}

fn extend(set: &mut RuleSet, extra: &[RewriteRuleConfig]) -> Result<(), RewriteError> {
    for rule in extra {
        set.push(RewriteRule::regex(&rule.pattern, rule.replacement.clone())?);
    }
    Ok(())
}
