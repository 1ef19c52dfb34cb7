//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (ordered rule lookup)
//!     → matcher.rs (evaluate contains conditions)
//!     → Return: UpstreamTarget (BlockCity when nothing matches)
//!     → target.rs (base URL for the chosen target)
//! ```
//!
//! # Design Decisions
//! - Rules built at startup, immutable at runtime
//! - No regex in hot path (substring matching only)
//! - Deterministic: same input always matches same target
//! - First match wins

pub mod matcher;
pub mod router;
pub mod target;

pub use router::Router;
pub use target::{UpstreamTarget, Upstreams};
