//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber wakes → server stops accepting → drains → exits
//! ```
//!
//! # Design Decisions
//! - One broadcast coordinator shared by the server and tests
//! - No reload signal; configuration is read once at startup

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
