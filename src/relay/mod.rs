//! Request relay subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/visual-notes        POST /api/visual-translation
//!     → notes.rs                    → translation.rs
//!       (auth policy, text checks)    (multipart fields, re-encode)
//!     → upstream.rs (BackendClient: one outbound call, no retries)
//!     → upstream.rs (status passthrough + detail resolution, or buffered bytes)
//!     → client gets image bytes or { "detail": ... }
//! ```
//!
//! Per request: `RECEIVED → VALIDATED → FORWARDED → RESPONDED`, leaving early
//! as `REJECTED` (validation/auth) or `ERRORED` (backend/transport). Nothing
//! survives the request.

pub mod notes;
pub mod translation;
pub mod upstream;

pub use upstream::{BackendClient, BackendErrorBody};

/// The two backend operations the relay exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayRoute {
    VisualNotes,
    VisualTranslation,
}

impl RelayRoute {
    /// Path on the backend origin (identical to the inbound path).
    pub fn backend_path(self) -> &'static str {
        match self {
            RelayRoute::VisualNotes => "/api/visual-notes",
            RelayRoute::VisualTranslation => "/api/visual-translation",
        }
    }

    /// Safe message for failures whose cause must not reach the client.
    pub fn failure_message(self) -> &'static str {
        match self {
            RelayRoute::VisualNotes => "Failed to generate visual notes",
            RelayRoute::VisualTranslation => "Failed to translate image",
        }
    }

    /// Content type used when the backend omits one.
    pub fn default_content_type(self) -> &'static str {
        match self {
            RelayRoute::VisualNotes => "application/octet-stream",
            RelayRoute::VisualTranslation => "image/png",
        }
    }

    /// Content disposition used when the backend omits one.
    pub fn default_disposition(self) -> &'static str {
        match self {
            RelayRoute::VisualNotes => "inline; filename=\"visual-notes.png\"",
            RelayRoute::VisualTranslation => "inline; filename=\"translated-image.png\"",
        }
    }

    /// Label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            RelayRoute::VisualNotes => "visual_notes",
            RelayRoute::VisualTranslation => "visual_translation",
        }
    }
}

impl std::fmt::Display for RelayRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
