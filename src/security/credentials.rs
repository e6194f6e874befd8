//! Inbound credential extraction.
//!
//! The relay never inspects a credential. It only notices whether one is
//! present and, if so, hands the exact header value to the backend.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};

use crate::error::RelayError;

/// The inbound `Authorization` header, if any. Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct Credential(Option<HeaderValue>);

impl Credential {
    pub fn new(value: Option<HeaderValue>) -> Self {
        Self(value.filter(|v| !v.as_bytes().iter().all(u8::is_ascii_whitespace)))
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn header(&self) -> Option<&HeaderValue> {
        self.0.as_ref()
    }

    /// Fail with `Unauthenticated` when no credential was sent.
    pub fn require(&self) -> Result<&HeaderValue, RelayError> {
        self.0.as_ref().ok_or(RelayError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(parts.headers.get(AUTHORIZATION).cloned()))
    }
}
