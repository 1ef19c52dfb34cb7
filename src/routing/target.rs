//! Upstream targets and their base URLs.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::UpstreamsConfig;
use crate::error::GatewayError;

/// One of the fixed third-party backends the gateway forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamTarget {
    BlockCity,
    Pixelgun,
    Fyber,
}

impl UpstreamTarget {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockCity => "block_city",
            Self::Pixelgun => "pixelgun",
            Self::Fyber => "fyber",
        }
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed base URL for every target. Immutable after startup.
#[derive(Debug, Clone)]
pub struct Upstreams {
    block_city: Url,
    pixelgun: Url,
    fyber: Url,
}

impl Upstreams {
    pub fn from_config(config: &UpstreamsConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            block_city: parse_base(&config.block_city)?,
            pixelgun: parse_base(&config.pixelgun)?,
            fyber: parse_base(&config.fyber)?,
        })
    }

    pub fn base(&self, target: UpstreamTarget) -> &Url {
        match target {
            UpstreamTarget::BlockCity => &self.block_city,
            UpstreamTarget::Pixelgun => &self.pixelgun,
            UpstreamTarget::Fyber => &self.fyber,
        }
    }

    /// Full upstream URL for a request path and (already rewritten) query.
    ///
    /// Any path on the base URL is kept as a prefix.
    pub fn url_for(
        &self,
        target: UpstreamTarget,
        path: &str,
        query: Option<&str>,
    ) -> String {
        let base = self.base(target).as_str().trim_end_matches('/');
        match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", base, path, q),
            _ => format!("{}{}", base, path),
        }
    }
}

fn parse_base(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw).map_err(|e| GatewayError::InvalidUpstreamUri(format!("{}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::InvalidUpstreamUri(raw.to_string()));
    }
    Ok(url)
}
