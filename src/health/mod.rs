//! Liveness endpoints.
//!
//! `GET /` answers with a static string and `GET /_status` with a small JSON
//! document. Neither touches upstreams or the store.

use axum::Json;
use chrono::Utc;
use serde::Serialize;

pub const LIVENESS_TEXT: &str = "game-gateway is running";

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub ok: bool,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}

pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

pub async fn status() -> Json<StatusReport> {
    Json(StatusReport {
        ok: true,
        ts: Utc::now().timestamp_millis(),
    })
}
