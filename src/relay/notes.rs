//! Text relay: `POST /api/visual-notes`.

use std::time::Instant;

use axum::{
    extract::{rejection::BytesRejection, State},
    response::Response,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::error::RelayError;
use crate::http::request::RequestId;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::upstream::into_relay_response;
use crate::relay::RelayRoute;
use crate::security::Credential;

/// Outbound body for the backend.
#[derive(Debug, Serialize)]
struct NotesPayload<'a> {
    text: &'a str,
}

/// Pull `text` out of a raw body. Anything that is not a JSON object with a
/// string `text` yields `None`.
fn extract_text(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("text")?.as_str().map(str::to_owned)
}

/// Check `text` against the relay rules and hand it back unchanged.
pub fn validate_text(text: Option<&str>, max_chars: usize) -> Result<&str, RelayError> {
    let text = match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(RelayError::bad_request("Text is required")),
    };

    if text.chars().count() > max_chars {
        return Err(RelayError::payload_too_large(format!(
            "Text must be less than {max_chars} characters"
        )));
    }

    Ok(text)
}

pub async fn visual_notes(
    State(state): State<AppState>,
    request_id: RequestId,
    credential: Credential,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    let started = Instant::now();
    let result = relay_notes(&state, &request_id, &credential, body).await;
    metrics::record_relay(RelayRoute::VisualNotes, &result, started);
    result
}

async fn relay_notes(
    state: &AppState,
    request_id: &RequestId,
    credential: &Credential,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    if state.settings.require_auth {
        credential.require()?;
    }

    let body = body.map_err(|rejection| RelayError::Validation {
        status: rejection.status(),
        detail: rejection.body_text(),
    })?;
    let text = extract_text(&body);
    let text = validate_text(text.as_deref(), state.settings.max_text_chars)?;

    tracing::info!(
        request_id = %request_id.as_str(),
        chars = text.chars().count(),
        "Relaying visual notes request"
    );

    let response = state
        .backend
        .post_json(RelayRoute::VisualNotes, &NotesPayload { text }, credential, request_id)
        .await?;

    into_relay_response(RelayRoute::VisualNotes, response).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn empty_and_blank_text_are_required() {
        for text in [None, Some(""), Some("   \n\t")] {
            let err = validate_text(text, 5000).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.detail(), "Text is required");
        }
    }

    #[test]
    fn limit_is_inclusive() {
        let text = "a".repeat(5000);
        assert_eq!(validate_text(Some(&text), 5000).unwrap(), text);

        let text = "a".repeat(5001);
        let err = validate_text(Some(&text), 5000).unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.detail(), "Text must be less than 5000 characters");
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let text = "é".repeat(5000);
        assert!(validate_text(Some(&text), 5000).is_ok());
    }

    #[test]
    fn text_is_not_trimmed() {
        assert_eq!(validate_text(Some("  photosynthesis "), 5000).unwrap(), "  photosynthesis ");
    }

    #[test]
    fn extract_text_tolerates_bad_bodies() {
        assert_eq!(extract_text(br#"{"text":"cells"}"#).as_deref(), Some("cells"));
        assert_eq!(extract_text(br#"{"text":42}"#), None);
        assert_eq!(extract_text(b"not json"), None);
        assert_eq!(extract_text(b""), None);
        assert_eq!(extract_text(br#"["text"]"#), None);
    }
}
