//! Administrative API under `/_admin`.
//!
//! # Responsibilities
//! - Install, clear and list mocks
//! - Expose the recent-request history
//!
//! # Design Decisions
//! - Routes share the proxy's `AppState`; the store is the only thing touched
//! - Auth runs as a route layer, so unknown `/_admin/*` paths still fall
//!   through to the proxy

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;

use self::auth::require_api_key;
use self::handlers::{clear_mock, get_request, list_mocks, recent, set_mock};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/_admin/mock", post(set_mock))
        .route("/_admin/mock/clear", post(clear_mock))
        .route("/_admin/mocks", get(list_mocks))
        .route("/_admin/recent", get(recent))
        .route("/_admin/request/{id}", get(get_request))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
}
