//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and layers produce:
//!     → logging.rs (structured tracing events, pretty or JSON)
//!     → metrics.rs (counters and histograms per relay route)
//!
//! Consumers:
//!     → stdout (log aggregation)
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - The request ID rides on every request span
//! - Metric updates are cheap enough to run on every request
//! - Backend and transport causes appear in logs only, never in responses

pub mod logging;
pub mod metrics;
