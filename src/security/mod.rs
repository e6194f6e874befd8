//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Relay request:
//!     → credentials.rs (capture Authorization, opaque, forwarded as-is)
//!     → relay handler applies the require_auth policy
//!
//! Admin request:
//!     → admin.rs (bearer key check, 404 when no key configured)
//! ```

pub mod admin;
pub mod credentials;

pub use credentials::Credential;
