use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::ApiError;
use crate::router::{DispatchResult, DownloadRequest};

/// Content type of every plain-text reply
pub const TEXT_CONTENT_TYPE: &str = "application/text";

/// Webhook body accepted by `POST /api/v1/download`
#[derive(Debug, Deserialize, Clone)]
pub struct WebhookRequest {
    #[serde(rename = "dataSource")]
    pub data_source: String,
    #[serde(default)]
    pub path: String,
}

impl WebhookRequest {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let request: WebhookRequest = serde_json::from_slice(body)?;
        if request.data_source.trim().is_empty() {
            return Err(ApiError::InvalidPayload("dataSource must not be empty".to_string()));
        }
        Ok(request)
    }
}

impl From<WebhookRequest> for DownloadRequest {
    fn from(value: WebhookRequest) -> Self {
        DownloadRequest::new(value.data_source, value.path)
    }
}

/// `{name: enabled}` listing of a provider collection
pub type ProviderStatusResponse = BTreeMap<String, bool>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

/// Plain-text `200 OK`
pub fn ok_response() -> Response {
    text_response(StatusCode::OK, "OK".to_string())
}

/// Map a dispatch outcome to the wire: success is `200 OK`, any failure is
/// `500` carrying the error text
pub fn encode_dispatch(result: &DispatchResult) -> Response {
    match result {
        Ok(_) => ok_response(),
        Err(e) => text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn text_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response()
}
