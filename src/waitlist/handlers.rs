//! Waitlist HTTP handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::waitlist::store::{StoreError, WaitlistEntry};

/// Longest email the table accepts.
const MAX_EMAIL_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for WaitlistError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WaitlistError::InvalidEmail => (StatusCode::BAD_REQUEST, self.to_string()),
            WaitlistError::Store(e) => {
                tracing::error!(error = %e, "Waitlist store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<WaitlistEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DbHealth {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Accept anything shaped like `local@domain`, trimmed, within column size.
pub fn normalize_email(raw: Option<&str>) -> Result<&str, WaitlistError> {
    let email = raw.map(str::trim).unwrap_or_default();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };

    if valid && email.chars().count() <= MAX_EMAIL_LEN {
        Ok(email)
    } else {
        Err(WaitlistError::InvalidEmail)
    }
}

/// `POST /api/waitlist`
pub async fn join(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<JoinResponse>, WaitlistError> {
    let payload: Option<Value> = serde_json::from_slice(&body).ok();
    let raw = payload
        .as_ref()
        .and_then(|v| v.get("email"))
        .and_then(Value::as_str);

    let email = match normalize_email(raw) {
        Ok(email) => email,
        Err(e) => {
            metrics::record_waitlist("invalid");
            return Err(e);
        }
    };

    match state.waitlist.insert(email).await {
        Ok(created) => {
            metrics::record_waitlist(if created { "created" } else { "duplicate" });
            tracing::info!(created, store = state.waitlist.kind(), "Waitlist submission");
            Ok(Json(JoinResponse {
                message: "You're on the list!".to_string(),
            }))
        }
        Err(e) => {
            metrics::record_waitlist("failed");
            Err(e.into())
        }
    }
}

/// `GET /api/admin/waitlist`
pub async fn list(State(state): State<AppState>) -> Result<Json<ListResponse>, WaitlistError> {
    let data = state.waitlist.list().await?;
    Ok(Json(ListResponse { data }))
}

/// `GET /api/health/db`
pub async fn db_health(State(state): State<AppState>) -> Json<DbHealth> {
    match state.waitlist.now().await {
        Ok(time) => Json(DbHealth {
            connected: true,
            time: Some(time),
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, store = state.waitlist.kind(), "Database probe failed");
            Json(DbHealth {
                connected: false,
                time: None,
                error: Some("Database unavailable".to_string()),
            })
        }
    }
}
