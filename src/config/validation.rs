//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream URLs and value ranges
//! - Compile user-supplied rewrite rules
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, RewriteRuleConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    require_positive(&mut errors, "listener.max_connections", config.listener.max_connections as u64);

    for (field, value) in [
        ("upstreams.block_city", &config.upstreams.block_city),
        ("upstreams.pixelgun", &config.upstreams.pixelgun),
        ("upstreams.fyber", &config.upstreams.fyber),
    ] {
        check_upstream_url(&mut errors, field, value);
    }

    require_positive(&mut errors, "store.capacity", config.store.capacity as u64);
    require_positive(&mut errors, "store.recent_limit", config.store.recent_limit as u64);
    require_positive(&mut errors, "limits.max_request_body", config.limits.max_request_body as u64);
    require_positive(&mut errors, "limits.max_response_body", config.limits.max_response_body as u64);
    require_positive(&mut errors, "timeouts.connect_secs", config.timeouts.connect_secs);
    require_positive(&mut errors, "timeouts.upstream_secs", config.timeouts.upstream_secs);
    require_positive(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);

    check_rules(&mut errors, "normalization.extra_request_rules", &config.normalization.extra_request_rules);
    check_rules(&mut errors, "normalization.extra_response_rules", &config.normalization.extra_response_rules);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require_positive(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::new(field, "must be greater than zero"));
    }
}

fn check_upstream_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("'{}' must be an http(s) URL with a host (got scheme '{}')", value, url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("'{}': {}", value, e))),
    }
}

fn check_rules(errors: &mut Vec<ValidationError>, field: &str, rules: &[RewriteRuleConfig]) {
    for (i, rule) in rules.iter().enumerate() {
        if let Err(e) = Regex::new(&rule.pattern) {
            errors.push(ValidationError::new(format!("{}[{}].pattern", field, i), e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstreams.fyber = "ftp://files.example".into();
        config.upstreams.pixelgun = "no scheme".into();
        config.store.capacity = 0;
        config.normalization.extra_response_rules.push(RewriteRuleConfig {
            pattern: "(unclosed".into(),
            replacement: "x".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "upstreams.pixelgun",
                "upstreams.fyber",
                "store.capacity",
                "normalization.extra_response_rules[0].pattern",
            ]
        );
    }

    #[test]
    fn test_error_display_names_field() {
        let err = ValidationError::new("store.capacity", "must be greater than zero");
        assert_eq!(err.to_string(), "store.capacity: must be greater than zero");
    }
}
