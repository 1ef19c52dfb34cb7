//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared state (rules, store, upstream client)
//! - Create Axum Router with liveness, admin and proxy handlers
//! - Wire up middleware (tracing, request ID, timeout, concurrency cap)
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    middleware,
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{GatewayConfig, LimitsConfig};
use crate::error::GatewayError;
use crate::health;
use crate::http::dispatch::dispatch;
use crate::http::forward::Forwarder;
use crate::http::headers::X_REQUEST_ID;
use crate::http::request::OutboundNormalizer;
use crate::http::response::ResponseNormalizer;
use crate::rewrite::{RewriteError, RewriteRules};
use crate::routing::{Router as TargetRouter, Upstreams};
use crate::store::Store;

/// Startup failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("rewrite rules: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("upstreams: {0}")]
    Upstream(#[from] GatewayError),

    #[error("normalization header: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<TargetRouter>,
    pub store: Arc<Store>,
    pub outbound: Arc<OutboundNormalizer>,
    pub inbound: Arc<ResponseNormalizer>,
    pub forwarder: Arc<Forwarder>,
    pub limits: LimitsConfig,
    pub snippet_bytes: usize,
    pub recent_limit: usize,
    pub admin_api_key: Option<String>,
}

/// Drop any inbound `x-request-id` so every exchange gets a fresh one.
async fn discard_client_request_id(mut request: Request) -> Request {
    request.headers_mut().remove(X_REQUEST_ID);
    request
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    store: Arc<Store>,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let store = Arc::new(Store::from_config(&config.store, &config.observability));
        Self::with_store(config, store)
    }

    /// Create a server around an existing store.
    pub fn with_store(config: GatewayConfig, store: Arc<Store>) -> Result<Self, ServerError> {
        let rules = RewriteRules::from_config(&config.normalization)?;
        let upstreams = Upstreams::from_config(&config.upstreams)?;
        let forwarder = Forwarder::new(upstreams, &config.timeouts, &config.limits);

        let state = AppState {
            router: Arc::new(TargetRouter::standard()),
            store: store.clone(),
            outbound: Arc::new(OutboundNormalizer::new(&config.normalization, rules.request)?),
            inbound: Arc::new(ResponseNormalizer::new(rules.response)),
            forwarder: Arc::new(forwarder),
            limits: config.limits.clone(),
            snippet_bytes: config.store.snippet_bytes,
            recent_limit: config.store.recent_limit,
            admin_api_key: config.admin.api_key.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            store,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut app = Router::new()
            .route("/", get(health::liveness).fallback(dispatch))
            .route("/_status", get(health::status));

        if config.admin.enabled {
            app = app.merge(admin::router(state.clone()));
        }

        app.fallback(dispatch)
            .with_state(state)
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(middleware::map_request(discard_client_request_id))
    }

    /// The configured router, for in-process testing.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin = self.config.admin.enabled,
            store_capacity = self.config.store.capacity,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
