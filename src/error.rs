//! Gateway error taxonomy and its HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::routing::UpstreamTarget;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connecting to or talking with the upstream failed.
    #[error("upstream {target} unavailable: {reason}")]
    UpstreamUnavailable {
        target: UpstreamTarget,
        reason: String,
    },

    #[error("upstream {target} did not answer within {secs}s")]
    UpstreamTimeout { target: UpstreamTarget, secs: u64 },

    #[error("upstream {target} response exceeds {limit} bytes")]
    UpstreamResponseTooLarge { target: UpstreamTarget, limit: usize },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error("invalid upstream URI: {0}")]
    InvalidUpstreamUri(String),

    #[error("{0}")]
    AdminValidation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UpstreamUnavailable { .. }
            | Self::UpstreamTimeout { .. }
            | Self::UpstreamResponseTooLarge { .. }
            | Self::InvalidUpstreamUri(_) => StatusCode::BAD_GATEWAY,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AdminValidation(_) | Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable { .. } => "unavailable",
            Self::UpstreamTimeout { .. } => "timeout",
            Self::UpstreamResponseTooLarge { .. } => "response_too_large",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::InvalidRequestBody(_) => "invalid_request_body",
            Self::InvalidUpstreamUri(_) => "invalid_uri",
            Self::AdminValidation(_) => "admin_validation",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::AdminValidation(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
