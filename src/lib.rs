//! Game client gateway library.
//!
//! Sits between mobile game clients and their backends, resolves each request
//! to an upstream, normalizes Android traffic so it looks like iOS traffic,
//! rewrites replies back for Android clients, and keeps a short history of
//! exchanges plus operator-installed mocks.

// Core subsystems
pub mod config;
pub mod http;
pub mod rewrite;
pub mod routing;
pub mod store;

// Surfaces
pub mod admin;
pub mod health;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use store::Store;
