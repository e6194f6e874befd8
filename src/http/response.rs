//! Response construction for relayed binaries.
//!
//! # Responsibilities
//! - Re-emit a fully buffered backend body to the client
//! - Set content type, disposition and `Cache-Control: no-store`
//!
//! # Design Decisions
//! - Bodies are buffered, not streamed; the backend call completes first
//! - Only the three headers above are copied from the backend decision

use axum::{
    body::Body,
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::Response,
};
use bytes::Bytes;

/// Build a `200` response carrying `body` as an uncacheable attachment.
pub fn binary(body: Bytes, content_type: HeaderValue, disposition: HeaderValue) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(CONTENT_DISPOSITION, disposition);
    response
}
