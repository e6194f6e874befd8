//! Backend client and backend response normalization.
//!
//! # Responsibilities
//! - Build backend URLs from the configured origin
//! - Send exactly one request per relayed call (no retries)
//! - Carry the caller's Authorization and request ID onto the backend call
//! - Turn a backend answer into either buffered bytes or a `RelayError`
//!
//! # Error body resolution
//! ```text
//! JSON with string "detail"  → Detail
//! JSON with string "error"   → Error
//! JSON string                → Raw
//! other JSON                 → route fallback message
//! non-JSON, non-empty text   → Raw
//! empty body                 → route fallback message
//! ```
//!
//! Backend messages are passed through verbatim; whitespace only decides
//! whether a message counts as empty.

use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue,
    },
    response::Response,
};
use reqwest::{multipart::Form, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::{BackendConfig, ConfigError};
use crate::error::RelayError;
use crate::http::request::{RequestId, X_REQUEST_ID};
use crate::http::response;
use crate::relay::RelayRoute;
use crate::security::Credential;

/// Longest raw backend text echoed back as a detail.
const MAX_RAW_DETAIL_CHARS: usize = 1024;

/// Error payload shapes the backend is known to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendErrorBody {
    /// `{ "detail": "..." }`
    Detail(String),
    /// `{ "error": "..." }`
    Error(String),
    /// Plain text, or a bare JSON string.
    Raw(String),
}

impl BackendErrorBody {
    /// Classify a backend error body. `None` means no usable message.
    pub fn parse(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::String(text)) => non_empty(&text).map(Self::Raw),
            Ok(value) => string_field(&value, "detail")
                .map(Self::Detail)
                .or_else(|| string_field(&value, "error").map(Self::Error)),
            Err(_) => non_empty(String::from_utf8_lossy(body).as_ref()).map(Self::Raw),
        }
    }

    pub fn into_detail(self) -> String {
        match self {
            Self::Detail(detail) | Self::Error(detail) => detail,
            Self::Raw(text) => truncate(text),
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(non_empty)
}

fn non_empty(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_string())
}

fn truncate(text: String) -> String {
    match text.char_indices().nth(MAX_RAW_DETAIL_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

/// Resolve the client-facing detail for a failed backend call. Never empty.
pub fn resolve_detail(route: RelayRoute, body: &[u8]) -> String {
    BackendErrorBody::parse(body)
        .map(BackendErrorBody::into_detail)
        .unwrap_or_else(|| route.failure_message().to_string())
}

/// HTTP client bound to the backend origin.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    origin: String,
}

impl BackendClient {
    pub fn from_config(config: &BackendConfig) -> Result<Self, ConfigError> {
        let origin = Url::parse(&config.url)
            .map_err(|e| ConfigError::Backend(format!("invalid url '{}': {}", config.url, e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| ConfigError::Backend(e.to_string()))?;

        Ok(Self::new(http, &origin))
    }

    pub fn new(http: reqwest::Client, origin: &Url) -> Self {
        Self {
            http,
            origin: origin.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Full backend URL for a route.
    pub fn endpoint(&self, route: RelayRoute) -> String {
        format!("{}{}", self.origin, route.backend_path())
    }

    /// POST a JSON body.
    pub async fn post_json<T>(
        &self,
        route: RelayRoute,
        body: &T,
        credential: &Credential,
        request_id: &RequestId,
    ) -> Result<reqwest::Response, RelayError>
    where
        T: Serialize + ?Sized,
    {
        let request = self.http.post(self.endpoint(route)).json(body);
        self.send(route, request, credential, request_id).await
    }

    /// POST a multipart form. The client computes the content type and
    /// boundary; nothing here sets it.
    pub async fn post_multipart(
        &self,
        route: RelayRoute,
        form: Form,
        credential: &Credential,
        request_id: &RequestId,
    ) -> Result<reqwest::Response, RelayError> {
        let request = self.http.post(self.endpoint(route)).multipart(form);
        self.send(route, request, credential, request_id).await
    }

    async fn send(
        &self,
        route: RelayRoute,
        mut request: RequestBuilder,
        credential: &Credential,
        request_id: &RequestId,
    ) -> Result<reqwest::Response, RelayError> {
        if let Some(auth) = credential.header() {
            request = request.header(AUTHORIZATION, auth.clone());
        }
        if let Some(id) = request_id.header() {
            request = request.header(X_REQUEST_ID, id.clone());
        }

        tracing::debug!(
            request_id = %request_id.as_str(),
            route = %route,
            url = %self.endpoint(route),
            authenticated = credential.is_present(),
            "Forwarding to backend"
        );

        request
            .send()
            .await
            .map_err(|source| RelayError::Transport { route, source })
    }
}

/// Buffer a backend response and convert it for the client.
pub async fn into_relay_response(
    route: RelayRoute,
    response: reqwest::Response,
) -> Result<Response, RelayError> {
    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let disposition = response.headers().get(CONTENT_DISPOSITION).cloned();

    let body = response
        .bytes()
        .await
        .map_err(|source| RelayError::Transport { route, source })?;

    if !status.is_success() {
        return Err(RelayError::Upstream {
            status,
            detail: resolve_detail(route, &body),
        });
    }

    tracing::debug!(route = %route, bytes = body.len(), "Backend returned payload");

    Ok(response::binary(
        body,
        content_type.unwrap_or_else(|| HeaderValue::from_static(route.default_content_type())),
        disposition.unwrap_or_else(|| HeaderValue::from_static(route.default_disposition())),
    ))
}
