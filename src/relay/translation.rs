//! File relay: `POST /api/visual-translation`.

use std::time::Instant;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    response::Response,
};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::error::RelayError;
use crate::http::request::RequestId;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::upstream::into_relay_response;
use crate::relay::RelayRoute;
use crate::security::Credential;

const MISSING_FIELDS: &str = "File and target_lang are required";
const DEFAULT_FILE_NAME: &str = "upload";

/// The uploaded image as received.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Validated translation request.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub file: UploadedFile,
    pub target_lang: String,
}

impl TranslationRequest {
    /// Both fields must be present; an empty file or blank language counts
    /// as missing.
    pub fn from_parts(
        file: Option<UploadedFile>,
        target_lang: Option<String>,
    ) -> Result<Self, RelayError> {
        let file = file.filter(|f| !f.bytes.is_empty());
        let target_lang = target_lang.filter(|lang| !lang.trim().is_empty());

        match (file, target_lang) {
            (Some(file), Some(target_lang)) => Ok(Self { file, target_lang }),
            _ => Err(RelayError::bad_request(MISSING_FIELDS)),
        }
    }

    /// Encode a fresh multipart form for the backend.
    pub fn into_form(self) -> Form {
        let UploadedFile {
            file_name,
            content_type,
            bytes,
        } = self.file;
        let file_name = file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let length = bytes.len() as u64;

        let part = || Part::stream_with_length(bytes.clone(), length).file_name(file_name.clone());
        let part = match content_type.as_deref() {
            Some(mime) => part().mime_str(mime).unwrap_or_else(|_| part()),
            None => part(),
        };

        Form::new()
            .part("file", part)
            .text("target_lang", self.target_lang)
    }
}

fn multipart_error(err: MultipartError) -> RelayError {
    RelayError::Validation {
        status: err.status(),
        detail: err.body_text(),
    }
}

/// Read the `file` and `target_lang` fields; other fields are ignored.
async fn read_fields(mut multipart: Multipart) -> Result<TranslationRequest, RelayError> {
    let mut file = None;
    let mut target_lang = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("target_lang") => {
                target_lang = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    TranslationRequest::from_parts(file, target_lang)
}

pub async fn visual_translation(
    State(state): State<AppState>,
    request_id: RequestId,
    credential: Credential,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RelayError> {
    let started = Instant::now();
    let result = relay_translation(&state, &request_id, &credential, multipart).await;
    metrics::record_relay(RelayRoute::VisualTranslation, &result, started);
    result
}

async fn relay_translation(
    state: &AppState,
    request_id: &RequestId,
    credential: &Credential,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RelayError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Unreadable multipart body");
        RelayError::bad_request(MISSING_FIELDS)
    })?;
    let request = read_fields(multipart).await?;

    tracing::info!(
        request_id = %request_id.as_str(),
        file_name = ?request.file.file_name,
        file_size = request.file.bytes.len(),
        target_lang = %request.target_lang,
        "Relaying visual translation request"
    );

    let response = state
        .backend
        .post_multipart(
            RelayRoute::VisualTranslation,
            request.into_form(),
            credential,
            request_id,
        )
        .await?;

    into_relay_response(RelayRoute::VisualTranslation, response).await
}
