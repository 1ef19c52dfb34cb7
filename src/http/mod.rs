//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request ID)
//!     → dispatch.rs (mock check, target resolution)
//!     → request.rs (buffer body, normalize outbound copy)
//!     → forward.rs (send upstream, buffer reply)
//!     → response.rs (normalize reply for Android clients)
//!     → store (record exchange)
//!     → Send to client
//!
//! WebSocket upgrades branch off in dispatch.rs to websocket.rs.
//! ```

pub mod dispatch;
pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{InboundRequest, OutboundNormalizer, OutboundRequest};
pub use response::{ResponseNormalizer, UpstreamResponse};
pub use server::{AppState, GatewayServer, ServerError};
