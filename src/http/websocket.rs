//! WebSocket proxy handling.
//!
//! # Responsibilities
//! - Dial the upstream WebSocket for the resolved target
//! - Complete upgrade handshake with client
//! - Bidirectional frame forwarding
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Gateway ←──── WebSocket frames ────→ Upstream
//! ```
//!
//! # Design Decisions
//! - WebSocket handled separately from HTTP request/response
//! - No normalization: path, query and frames pass through untouched
//! - Upstream dialed before accepting the client, so failures surface as 502
//! - Close frames propagated in both directions
//! - Subprotocols are offered upstream as the client listed them; the one the
//!   upstream picks is echoed back to the client

use axum::extract::ws::{self, WebSocket, WebSocketUpgrade};
use axum::http::{header, request::Parts, HeaderMap};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{
    self as tung, client::IntoClientRequest, protocol::frame::coding::CloseCode,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::GatewayError;
use crate::http::headers::strip_hop_by_hop;
use crate::routing::{UpstreamTarget, Upstreams};

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// `ws://` or `wss://` URL for the target, keeping path and query unchanged.
pub fn upstream_ws_url(upstreams: &Upstreams, target: UpstreamTarget, parts: &Parts) -> String {
    let url = upstreams.url_for(target, parts.uri.path(), parts.uri.query());
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url
    }
}

/// Connect upstream, then upgrade the client and pump frames until either side closes.
pub async fn tunnel(
    ws: WebSocketUpgrade,
    upstreams: &Upstreams,
    target: UpstreamTarget,
    parts: &Parts,
) -> Result<Response, GatewayError> {
    let url = upstream_ws_url(upstreams, target, parts);
    let unavailable = |reason: String| GatewayError::UpstreamUnavailable { target, reason };

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| GatewayError::InvalidUpstreamUri(format!("{}: {}", url, e)))?;
    copy_end_to_end_headers(&parts.headers, request.headers_mut());
    if let Some(offered) = parts.headers.get(header::SEC_WEBSOCKET_PROTOCOL) {
        request
            .headers_mut()
            .insert(header::SEC_WEBSOCKET_PROTOCOL, offered.clone());
    }

    let (upstream, handshake) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let ws = match negotiated_protocol(handshake.headers()) {
        Some(protocol) => ws.protocols([protocol]),
        None => ws,
    };

    tracing::info!(upstream = %target, url = %url, "WebSocket tunnel established");
    Ok(ws.on_upgrade(move |client| async move {
        pump(client, upstream).await;
        tracing::debug!(upstream = %target, "WebSocket tunnel closed");
    }))
}

/// Forward application headers; the handshake headers are generated per hop.
fn copy_end_to_end_headers(from: &HeaderMap, to: &mut HeaderMap) {
    let mut headers = from.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    for name in [
        header::SEC_WEBSOCKET_KEY,
        header::SEC_WEBSOCKET_VERSION,
        header::SEC_WEBSOCKET_EXTENSIONS,
        header::SEC_WEBSOCKET_PROTOCOL,
    ] {
        headers.remove(name);
    }
    for (name, value) in headers.iter() {
        to.insert(name.clone(), value.clone());
    }
}

/// Subprotocol the upstream accepted, if any.
fn negotiated_protocol(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

async fn pump(client: WebSocket, upstream: UpstreamSocket) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let client_to_upstream = async {
        while let Some(Ok(msg)) = client_rx.next().await {
            let closing = matches!(msg, ws::Message::Close(_));
            if upstream_tx.send(to_upstream(msg)).await.is_err() || closing {
                break;
            }
        }
        let _ = upstream_tx.close().await;
    };

    let upstream_to_client = async {
        while let Some(Ok(msg)) = upstream_rx.next().await {
            let Some(msg) = to_client(msg) else { continue };
            let closing = matches!(msg, ws::Message::Close(_));
            if client_tx.send(msg).await.is_err() || closing {
                break;
            }
        }
        let _ = client_tx.close().await;
    };

    tokio::select! {
        _ = client_to_upstream => {}
        _ = upstream_to_client => {}
    }
}

fn to_upstream(msg: ws::Message) -> tung::Message {
    match msg {
        ws::Message::Text(text) => tung::Message::Text(text.as_str().into()),
        ws::Message::Binary(data) => tung::Message::Binary(data),
        ws::Message::Ping(data) => tung::Message::Ping(data),
        ws::Message::Pong(data) => tung::Message::Pong(data),
        ws::Message::Close(frame) => tung::Message::Close(frame.map(|f| tung::protocol::CloseFrame {
            code: CloseCode::from(f.code),
            reason: f.reason.as_str().into(),
        })),
    }
}

fn to_client(msg: tung::Message) -> Option<ws::Message> {
    Some(match msg {
        tung::Message::Text(text) => ws::Message::Text(text.as_str().into()),
        tung::Message::Binary(data) => ws::Message::Binary(data),
        tung::Message::Ping(data) => ws::Message::Ping(data),
        tung::Message::Pong(data) => ws::Message::Pong(data),
        tung::Message::Close(frame) => ws::Message::Close(frame.map(|f| ws::CloseFrame {
            code: u16::from(f.code),
            reason: f.reason.as_str().into(),
        })),
        tung::Message::Frame(_) => return None,
    })
}
