//! Request handling and transformation.
//!
//! # Responsibilities
//! - Capture the inbound request (buffered body, client identity)
//! - Produce the outbound copy presented as an iOS client
//!   (headers, canonical query parameters, body text)
//!
//! # Design Decisions
//! - Original request preserved for logging; modified copy forwarded
//! - Fail open: a query that cannot be decoded is forwarded untouched
//! - Non-UTF-8 bodies are forwarded untouched

use std::net::IpAddr;

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::config::NormalizationConfig;
use crate::error::GatewayError;
use crate::http::headers::{
    append_forwarded_for, client_ip, header_str, strip_hop_by_hop, X_GATEWAY, X_PLATFORM_OVERRIDE,
};
use crate::observability::metrics;
use crate::rewrite::{RewriteError, RuleSet};

/// A fully buffered client request. Owned by one dispatch, never shared.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path and query as received.
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Socket peer address, when known.
    pub peer: Option<IpAddr>,
}

impl InboundRequest {
    pub fn from_parts(parts: Parts, body: Bytes, peer: Option<IpAddr>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            peer,
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Path and query, as the client sent them.
    pub fn url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    pub fn user_agent(&self) -> &str {
        header_str(&self.headers, header::USER_AGENT)
    }

    pub fn client_ip(&self) -> String {
        client_ip(&self.headers, self.peer)
    }
}

/// The rewritten copy sent upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Buffer a request body, rejecting it once it grows past `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(GatewayError::PayloadTooLarge { limit })
        }
        // The client went away or sent a broken body; nothing sensible to forward.
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Err(GatewayError::InvalidRequestBody(e.to_string()))
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query parameter '{0}' is not valid UTF-8 once decoded")]
    InvalidEncoding(String),
}

/// Query parameters forced to fixed values.
const FORCED_PARAMS: [(&str, &str); 3] = [
    ("platform", "ios"),
    ("os_name", "iPhone OS"),
    ("client", "ios"),
];

/// Rewrites requests so upstreams see an iOS client.
#[derive(Debug, Clone)]
pub struct OutboundNormalizer {
    user_agent: HeaderValue,
    marker: HeaderValue,
    defaults: Vec<(String, String)>,
    rules: RuleSet,
}

impl OutboundNormalizer {
    pub fn new(config: &NormalizationConfig, rules: RuleSet) -> Result<Self, header::InvalidHeaderValue> {
        let mut defaults = vec![
            ("phone_model".to_string(), config.phone_model.clone()),
            ("manufacturer".to_string(), config.manufacturer.clone()),
        ];
        if let Some(signature) = config.signature_placeholder.as_deref().filter(|s| !s.is_empty()) {
            defaults.push(("signature".to_string(), signature.to_string()));
        }

        Ok(Self {
            user_agent: HeaderValue::from_str(&config.ios_user_agent)?,
            marker: HeaderValue::from_str(&config.gateway_marker)?,
            defaults,
            rules,
        })
    }

    /// Build the outbound copy of `req`. `req` itself is left untouched.
    pub fn normalize(&self, req: &InboundRequest) -> OutboundRequest {
        let mut headers = req.headers.clone();
        strip_hop_by_hop(&mut headers);
        // The upstream client derives Host from the target URL.
        headers.remove(header::HOST);
        headers.insert(header::USER_AGENT, self.user_agent.clone());
        headers.insert(X_GATEWAY, self.marker.clone());
        headers.insert(X_PLATFORM_OVERRIDE, HeaderValue::from_static("ios"));
        if let Some(peer) = req.peer {
            append_forwarded_for(&mut headers, peer);
        }

        let query = match self.rewrite_query(req.query()) {
            Ok(query) => Some(query),
            Err(e) => {
                tracing::warn!(error = %e, path = %req.path(), "Leaving query string unmodified");
                req.query().map(str::to_string)
            }
        };

        let body = self.rewrite_body(&req.body);
        if !body.is_empty() || headers.contains_key(header::CONTENT_LENGTH) {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        OutboundRequest {
            method: req.method.clone(),
            path: req.path().to_string(),
            query,
            headers,
            body,
        }
    }

    /// Canonicalize a query string: forced iOS parameters, defaults for
    /// missing device fields, everything else kept in order.
    pub fn rewrite_query(&self, raw: Option<&str>) -> Result<String, QueryError> {
        let mut pairs = parse_query(raw.unwrap_or_default())?;

        for (key, value) in FORCED_PARAMS {
            force_param(&mut pairs, key, value);
        }
        for (key, value) in &self.defaults {
            if !pairs.iter().any(|(k, _)| k == key) {
                pairs.push((key.clone(), value.clone()));
            }
        }

        Ok(url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish())
    }

    fn rewrite_body(&self, body: &Bytes) -> Bytes {
        if body.is_empty() {
            return body.clone();
        }
        match self.rules.rewrite_bytes(body) {
            Ok(Some(text)) => {
                metrics::record_rewrite("request");
                Bytes::from(text)
            }
            Ok(None) => body.clone(),
            Err(RewriteError::NotUtf8(_)) => {
                tracing::debug!(len = body.len(), "Request body is not text, forwarding as-is");
                body.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Request body rewrite failed, forwarding as-is");
                body.clone()
            }
        }
    }
}

fn parse_query(raw: &str) -> Result<Vec<(String, String)>, QueryError> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((decode_component(key, pair)?, decode_component(value, pair)?))
        })
        .collect()
}

fn decode_component(raw: &str, pair: &str) -> Result<String, QueryError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| QueryError::InvalidEncoding(pair.to_string()))
}

/// Set the first `key` to `value`, dropping later duplicates, or append it.
fn force_param(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    let mut seen = false;
    pairs.retain_mut(|(k, v)| {
        if k != key {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        *v = value.to_string();
        true
    });
    if !seen {
        pairs.push((key.to_string(), value.to_string()));
    }
}
