//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Base URLs of the fixed upstream services.
    pub upstreams: UpstreamsConfig,

    /// Recent-request store settings.
    pub store: StoreConfig,

    /// Body buffering limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Platform normalization settings.
    pub normalization: NormalizationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Upstream base URLs, one per [`UpstreamTarget`](crate::routing::UpstreamTarget).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    pub block_city: String,
    pub pixelgun: String,
    pub fyber: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            block_city: "https://api.blockcitywars.com".to_string(),
            pixelgun: "https://secure.pixelgunserver.com".to_string(),
            fyber: "https://video.fyber.com".to_string(),
        }
    }
}

/// Recent-request ring buffer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of entries kept in the ring buffer.
    pub capacity: usize,

    /// Maximum number of entries returned by the recent listing.
    pub recent_limit: usize,

    /// Number of body bytes kept in request/response snippets.
    pub snippet_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            recent_limit: 50,
            snippet_bytes: 1024,
        }
    }
}

/// Body buffering limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body size in bytes.
    pub max_request_body: usize,

    /// Maximum upstream response body size in bytes.
    pub max_response_body: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body: 2 * 1024 * 1024, // 2MB
            max_response_body: 8 * 1024 * 1024,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to answer, body included, in seconds.
    pub upstream_secs: u64,

    /// Overall request deadline in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 25,
            request_secs: 30,
        }
    }
}

/// A user-supplied text rewrite rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RewriteRuleConfig {
    /// Regular expression matched against the decoded body.
    pub pattern: String,

    /// Literal replacement text.
    pub replacement: String,
}

/// Settings for presenting traffic as coming from an iOS client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// User-Agent sent to every upstream.
    pub ios_user_agent: String,

    /// Value of the marker header identifying the gateway.
    pub gateway_marker: String,

    /// `phone_model` query value injected when absent.
    pub phone_model: String,

    /// `manufacturer` query value injected when absent.
    pub manufacturer: String,

    /// `signature` query value injected when absent. `None` disables injection.
    pub signature_placeholder: Option<String>,

    /// Rules applied to outbound bodies after the built-in ones.
    pub extra_request_rules: Vec<RewriteRuleConfig>,

    /// Rules applied to Android-bound responses after the built-in ones.
    pub extra_response_rules: Vec<RewriteRuleConfig>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            ios_user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
                             AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148"
                .to_string(),
            gateway_marker: "game-gateway".to_string(),
            phone_model: "iPhone14,2".to_string(),
            manufacturer: "Apple".to_string(),
            signature_placeholder: Some("ANDROID_BYPASS_SIGNATURE".to_string()),
            extra_request_rules: Vec::new(),
            extra_response_rules: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Log every recorded exchange and append it to `log_file` when set.
    pub verbose: bool,

    /// Path of the append-only JSON lines journal.
    pub log_file: Option<String>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            verbose: false,
            log_file: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Administrative API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the `/_admin` routes.
    pub enabled: bool,

    /// Bearer token required on admin routes. `None` leaves them open.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
        }
    }
}
