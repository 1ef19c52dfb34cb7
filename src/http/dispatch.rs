//! Per-request orchestration.
//!
//! ```text
//! Received → MockCheck ─┬→ MockServed
//!                       └→ TargetResolved → OutboundNormalized → Forwarded
//!                            → ResponseNormalized → Recorded
//! Forwarded ──(unreachable / timeout)──→ Failed (502)
//! ```
//!
//! Recording happens inline before the response is returned, so a client
//! that disconnects early drops this future and leaves no entry behind.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State, WebSocketUpgrade},
    http::{header, request::Parts, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use crate::http::headers::{self, header_str, X_REQUEST_ID};
use crate::http::request::{read_body, InboundRequest};
use crate::http::server::AppState;
use crate::http::websocket;
use crate::observability::metrics;
use crate::rewrite::is_android;
use crate::store::{snippet, MockEntry, RecentRequestEntry};

/// Main proxy handler.
pub async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (mut parts, body) = request.into_parts();

    let request_id = match header_str(&parts.headers, X_REQUEST_ID) {
        "" => Uuid::new_v4().to_string(),
        id => id.to_string(),
    };
    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Dispatching request");

    if let Some(mock) = state.store.mocks().lookup(&path) {
        tracing::info!(request_id = %request_id, path = %path, status = mock.status, "Serving mock");
        metrics::record_mock_hit();
        metrics::record_request(&method, mock.status, "mock", start);
        return mock_response(mock);
    }

    let host = request_host(&parts);
    let target = state.router.resolve(&host, &path);

    if headers::is_websocket_upgrade(&parts.headers) {
        let ws = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
            Ok(ws) => ws,
            Err(rejection) => return rejection.into_response(),
        };
        return match websocket::tunnel(ws, state.forwarder.upstreams(), target, &parts).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(request_id = %request_id, upstream = %target, error = %e, "WebSocket tunnel failed");
                metrics::record_upstream_error(target.as_str(), e.kind());
                e.into_response()
            }
        };
    }

    let body = match read_body(body, state.limits.max_request_body).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Rejecting request body");
            metrics::record_request(&method, e.status().as_u16(), target.as_str(), start);
            return e.into_response();
        }
    };

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let inbound = InboundRequest::from_parts(parts, body, peer);
    let android = is_android(inbound.user_agent(), inbound.url());

    let mut outbound = state.outbound.normalize(&inbound);
    if android {
        // Compressed replies cannot be rewritten.
        outbound.headers.remove(header::ACCEPT_ENCODING);
    }

    let upstream = match state.forwarder.forward(target, outbound).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %target, error = %e, "Upstream error");
            metrics::record_upstream_error(target.as_str(), e.kind());
            metrics::record_request(&method, e.status().as_u16(), target.as_str(), start);
            return e.into_response();
        }
    };

    let response = state.inbound.normalize(upstream, android);
    let status = response.status.as_u16();

    state.store.record(RecentRequestEntry {
        id: request_id.clone(),
        timestamp: Utc::now(),
        client_ip: inbound.client_ip(),
        user_agent: inbound.user_agent().to_string(),
        method: method.clone(),
        url: inbound.url().to_string(),
        target,
        android,
        request_body: snippet(&inbound.body, state.snippet_bytes),
        response_status: status,
        response_headers: headers::to_map(&response.headers),
        response_body: snippet(&response.body, state.snippet_bytes),
        elapsed_ms: start.elapsed().as_millis() as u64,
    });

    tracing::debug!(
        request_id = %request_id,
        upstream = %target,
        android,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(&method, status, target.as_str(), start);

    response.into_response()
}

/// Host header, falling back to the URI authority.
fn request_host(parts: &Parts) -> String {
    match header_str(&parts.headers, header::HOST) {
        "" => parts.uri.host().unwrap_or_default().to_string(),
        host => host.to_string(),
    }
}

/// Render a mock exactly as installed.
pub fn mock_response(mock: MockEntry) -> Response {
    let mut response = Response::new(Body::from(mock.body));
    *response.status_mut() = StatusCode::from_u16(mock.status).unwrap_or(StatusCode::OK);
    for (name, value) in &mock.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid mock header"),
        }
    }
    response
}
