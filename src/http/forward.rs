//! Upstream transport.
//!
//! # Responsibilities
//! - Own the pooled HTTP(S) client
//! - Send an outbound request to the resolved target
//! - Buffer the upstream response under a size cap and a deadline
//!
//! # Design Decisions
//! - No retries and no failover between targets
//! - Timeout covers the whole exchange, body included
//! - rustls uses the ring provider, installed process-wide on first use so the
//!   WebSocket dialer agrees with the HTTP client

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{LimitsConfig, TimeoutConfig};
use crate::error::GatewayError;
use crate::http::headers::strip_hop_by_hop;
use crate::http::request::OutboundRequest;
use crate::http::response::UpstreamResponse;
use crate::routing::{UpstreamTarget, Upstreams};

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Install ring as the process-wide rustls provider unless one is already set.
pub fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Losing a race to another installer is fine; a provider is set either way.
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// Forwards normalized requests to the fixed upstreams.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpsClient,
    upstreams: Upstreams,
    upstream_timeout: Duration,
    max_response_body: usize,
}

impl Forwarder {
    /// Build the client. Platform root certificates are preferred; the
    /// bundled Mozilla roots are used when none can be loaded.
    pub fn new(upstreams: Upstreams, timeouts: &TimeoutConfig, limits: &LimitsConfig) -> Self {
        let mut http = HttpConnector::new();
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        http.enforce_http(false);

        install_crypto_provider();
        let builder = match HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(error = %e, "No native root certificates, using bundled roots");
                HttpsConnectorBuilder::new().with_webpki_roots()
            }
        };
        let https = builder.https_or_http().enable_http1().wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(https);

        Self {
            client,
            upstreams,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
            max_response_body: limits.max_response_body,
        }
    }

    pub fn upstreams(&self) -> &Upstreams {
        &self.upstreams
    }

    /// Send `req` to `target` and buffer the reply.
    pub async fn forward(
        &self,
        target: UpstreamTarget,
        req: OutboundRequest,
    ) -> Result<UpstreamResponse, GatewayError> {
        let url = self.upstreams.url_for(target, &req.path, req.query.as_deref());
        let uri: Uri = url
            .parse()
            .map_err(|_| GatewayError::InvalidUpstreamUri(url.clone()))?;

        let mut request = Request::builder()
            .method(req.method)
            .uri(uri)
            .body(Body::from(req.body))
            .map_err(|e| GatewayError::InvalidUpstreamUri(format!("{}: {}", url, e)))?;
        *request.headers_mut() = req.headers;

        tracing::debug!(upstream = %target, url = %url, "Forwarding request");

        match tokio::time::timeout(self.upstream_timeout, self.exchange(target, request)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::UpstreamTimeout {
                target,
                secs: self.upstream_timeout.as_secs(),
            }),
        }
    }

    async fn exchange(
        &self,
        target: UpstreamTarget,
        request: Request<Body>,
    ) -> Result<UpstreamResponse, GatewayError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable {
                target,
                reason: e.to_string(),
            })?;

        let (mut parts, body) = response.into_parts();
        let body = match Limited::new(body, self.max_response_body).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(GatewayError::UpstreamResponseTooLarge {
                    target,
                    limit: self.max_response_body,
                })
            }
            Err(e) => {
                return Err(GatewayError::UpstreamUnavailable {
                    target,
                    reason: format!("reading body: {}", e),
                })
            }
        };

        strip_hop_by_hop(&mut parts.headers);
        Ok(UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}
