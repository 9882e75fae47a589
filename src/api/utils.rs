//! API utility functions
//!
//! Pure, stateless helpers for turning a raw request into a JSON value.
//! Kept apart from the handlers so they can be unit tested without a router.

use axum::http::{HeaderMap, header};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use thiserror::Error;

/// Reasons a request body could not be read as JSON
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("missing Content-Type header")]
    MissingContentType,
    #[error("{0}")]
    UnsupportedContentType(String),
    #[error("payload too large (limit {limit} bytes)")]
    TooLarge { limit: usize },
    #[error("failed to read request body: {0}")]
    Unreadable(String),
    #[error("malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// Parses and validates Content-Type header for application/json
///
/// Accepts:
/// - `application/json`
/// - `application/json; charset=utf-8`
///
/// Rejects:
/// - `application/jsonp`
/// - `application/json-patch+json`
/// - `text/json`
/// - Malformed media types
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, PayloadError> {
    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        PayloadError::UnsupportedContentType(format!("invalid Content-Type: {content_type}"))
    })?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(PayloadError::UnsupportedContentType(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Rejects a request whose declared `Content-Length` is over `max_size`
///
/// A missing or unparseable header passes; the streamed read is capped anyway.
pub fn validate_content_length(headers: &HeaderMap, max_size: usize) -> Result<(), PayloadError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(len) if len > max_size as u64 => Err(PayloadError::TooLarge { limit: max_size }),
        _ => Ok(()),
    }
}

/// Checks the Content-Type, reads at most `max_size` bytes and parses JSON
///
/// Decompression is handled by `RequestDecompressionLayer`, so the limit
/// applies to the decoded body. Reading stops as soon as it is exceeded.
pub async fn read_json(
    headers: &HeaderMap,
    body: axum::body::Body,
    max_size: usize,
) -> Result<Value, PayloadError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(PayloadError::MissingContentType)?;
    parse_content_type(content_type)?;
    validate_content_length(headers, max_size)?;

    let data = Limited::new(body, max_size)
        .collect()
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                PayloadError::TooLarge { limit: max_size }
            } else {
                PayloadError::Unreadable(err.to_string())
            }
        })?
        .to_bytes();

    Ok(serde_json::from_slice(&data)?)
}
