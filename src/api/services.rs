use axum::{Json, extract::State, response::IntoResponse, response::Response};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::{
    error::ApiError,
    models::{ProviderStatusResponse, WebhookRequest, encode_dispatch, ok_response},
    state::AppState,
    utils::read_body,
};
use crate::providers::provider_status;
use crate::router::{DownloadRequest, match_source};

/// Webhook endpoint (POST /api/v1/download)
///
/// ## Flow:
/// 1. Read the body under the configured size limit and parse `{dataSource, path}`
/// 2. Match the source against the enabled source providers (last match wins)
/// 3. Dispatch: fallback download, batch download or watch-list update
/// 4. Encode the outcome as `200 OK` or `500 <error>`
///
/// Malformed bodies are rejected with a JSON error and never reach the dispatcher.
pub async fn download(State(state): State<AppState>, body: axum::body::Body) -> Result<Response, ApiError> {
    let body = read_body(body, state.config.server.max_payload_bytes).await?;
    let request: DownloadRequest = WebhookRequest::parse(&body)?.into();
    state.metrics.webhook_received();

    let request_id = Uuid::now_v7();
    let span = info_span!("webhook", %request_id, source = %request.source);

    let response = async move {
        info!(path = %request.path, "Webhook received");

        let outcome = match_source(&request.source, state.registry.enabled_source_providers());
        let result = state.dispatcher.dispatch(&request, outcome).await;

        match &result {
            Ok(path) => {
                state.metrics.dispatched(*path);
                info!(%path, "Webhook dispatched");
            }
            Err(e) => {
                state.metrics.dispatch_failed();
                warn!(error = %e, "Webhook dispatch failed");
            }
        }

        encode_dispatch(&result)
    }
    .instrument(span)
    .await;

    Ok(response)
}

/// Scheduler nudge (GET /api/v1/refresh)
pub async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    state.scheduler.trigger_run();
    state.metrics.scheduler_triggered();
    info!("Periodic run requested");
    ok_response()
}

/// GET /api/v1/downloadproviders
pub async fn list_download_providers(State(state): State<AppState>) -> Json<ProviderStatusResponse> {
    Json(provider_status(state.registry.download_providers()))
}

/// GET /api/v1/sourceproviders
pub async fn list_source_providers(State(state): State<AppState>) -> Json<ProviderStatusResponse> {
    Json(provider_status(state.registry.source_providers()))
}

/// GET /api/v1/ptproviders
pub async fn list_pt_providers(State(state): State<AppState>) -> Json<ProviderStatusResponse> {
    Json(provider_status(state.registry.pt_providers()))
}

/// Liveness probe (GET /healthz), outside the auth gate
pub async fn healthz() -> impl IntoResponse {
    ok_response()
}
