//! API utility functions
//!
//! Pure, stateless helpers for HTTP request processing.

use http_body_util::{BodyExt, Limited};

use crate::api::error::ApiError;

/// Validates that body size does not exceed the maximum allowed size
pub fn validate_body_size(data: &[u8], max_size: usize) -> Result<(), ApiError> {
    if data.len() > max_size {
        return Err(ApiError::PayloadTooLarge(data.len()));
    }
    Ok(())
}

/// Reads the whole request body, refusing anything over `max_size` bytes
///
/// Decompression is handled by `RequestDecompressionLayer`, so the limit
/// applies to the decoded body.
pub async fn read_body(body: axum::body::Body, max_size: usize) -> Result<Vec<u8>, ApiError> {
    // one extra byte lets an oversized body be reported with its size
    let data = Limited::new(body, max_size.saturating_add(1))
        .collect()
        .await
        .map_err(|err| match err.downcast::<http_body_util::LengthLimitError>() {
            Ok(_) => ApiError::PayloadTooLarge(max_size.saturating_add(1)),
            Err(err) => ApiError::Internal(err.to_string()),
        })?
        .to_bytes()
        .to_vec();

    validate_body_size(&data, max_size)?;
    Ok(data)
}
