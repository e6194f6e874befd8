//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging/metrics → Open waitlist store → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → every subscriber's receiver fires → axum drains in-flight requests
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
