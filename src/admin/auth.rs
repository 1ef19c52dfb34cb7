use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::GatewayError;
use crate::http::headers::header_str;
use crate::http::server::AppState;

/// Bearer-token guard. A no-op when no API key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(key) = state.admin_api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    match header_str(request.headers(), header::AUTHORIZATION).strip_prefix("Bearer ") {
        Some(token) if token == key => Ok(next.run(request).await),
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            Err(GatewayError::Unauthorized)
        }
    }
}
