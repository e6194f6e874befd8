//! Relay error taxonomy and its mapping to HTTP responses.
//!
//! Every failure a relay handler can hit is one of these variants. The
//! mapping to a status and a client-facing `detail` lives here and only here;
//! transport causes are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::relay::RelayRoute;

/// Body of every relay error response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum RelayError {
    /// Input rejected locally; never forwarded.
    #[error("{detail}")]
    Validation { status: StatusCode, detail: String },

    /// A credential is required but the request carried none.
    #[error("Authentication required")]
    Unauthenticated,

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {detail}")]
    Upstream { status: StatusCode, detail: String },

    /// The backend could not be reached or its body could not be read.
    #[error("{route} backend request failed: {source}")]
    Transport {
        route: RelayRoute,
        #[source]
        source: reqwest::Error,
    },
}

impl RelayError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation { status, .. } => *status,
            RelayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Never includes transport causes.
    pub fn detail(&self) -> String {
        match self {
            RelayError::Validation { detail, .. } => detail.clone(),
            RelayError::Unauthenticated => "Authentication required".to_string(),
            RelayError::Upstream { detail, .. } => detail.clone(),
            RelayError::Transport { route, .. } => route.failure_message().to_string(),
        }
    }

    /// Terminal state of the request, for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::Validation { .. } | RelayError::Unauthenticated => "rejected",
            RelayError::Upstream { .. } => "upstream_error",
            RelayError::Transport { .. } => "errored",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::Transport { .. } => {
                tracing::error!(error = %self, "Relay failed");
            }
            RelayError::Upstream { status, .. } => {
                tracing::warn!(status = %status, error = %self, "Backend rejected relayed request");
            }
            RelayError::Validation { .. } | RelayError::Unauthenticated => {
                tracing::debug!(error = %self, "Relay request rejected");
            }
        }

        let body = Json(ErrorBody {
            detail: self.detail(),
        });
        (self.status(), body).into_response()
    }
}
