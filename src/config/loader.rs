//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the runtime configuration: optional file, then process environment
/// overrides, then validation.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-style overrides on top of a loaded configuration.
///
/// `lookup` abstracts the environment so callers can feed any source.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            value: port.clone(),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(url) = lookup("BLOCKCITY_URL") {
        config.upstreams.block_city = url;
    }
    if let Some(url) = lookup("PIXELGUN_URL") {
        config.upstreams.pixelgun = url;
    }
    if let Some(url) = lookup("FYBER_URL") {
        config.upstreams.fyber = url;
    }

    if let Some(max) = lookup("STORE_MAX") {
        config.store.capacity = max.trim().parse().map_err(|_| ConfigError::Env {
            var: "STORE_MAX",
            value: max.clone(),
        })?;
    }

    if let Some(verbose) = lookup("VERBOSE") {
        config.observability.verbose = match verbose.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" | "" => false,
            _ => {
                return Err(ConfigError::Env {
                    var: "VERBOSE",
                    value: verbose,
                })
            }
        };
    }

    if let Some(path) = lookup("LOG_FILE") {
        config.observability.log_file = (!path.is_empty()).then_some(path);
    }

    if let Some(key) = lookup("ADMIN_API_KEY") {
        config.admin.api_key = (!key.is_empty()).then_some(key);
    }

    Ok(())
}
