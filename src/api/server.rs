use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, middleware, routing::get, routing::post};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{decompression::RequestDecompressionLayer, trace::TraceLayer};
use tracing::{error, info};

use super::{
    auth::require_bearer_token,
    services::{download, healthz, list_download_providers, list_pt_providers, list_source_providers, refresh},
    state::AppState,
};
use crate::config::Config;
use crate::download::http::{HttpConfig, build_client};
use crate::download::{DefaultLinkClassifier, DownloadTrigger, LinkClassifier, PathConvention};
use crate::providers::ProviderRegistry;
use crate::router::Dispatcher;
use crate::scheduler::PeriodServer;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Assemble the HTTP surface around `state`
///
/// Everything under `/api/v1` sits behind the bearer token gate;
/// `/healthz` does not.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/downloadproviders", get(list_download_providers))
        .route("/sourceproviders", get(list_source_providers))
        .route("/ptproviders", get(list_pt_providers))
        .route("/download", post(download))
        .route("/refresh", get(refresh))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // gzip request bodies are decoded before the size limit applies
                .layer(RequestDecompressionLayer::new()),
        )
}

/// Wire registry, download trigger, periodic server and dispatcher from `config`
pub fn build_state(config: Config) -> Result<(AppState, Arc<PeriodServer>), AnyError> {
    let client = build_client(&HttpConfig::default()).map_err(|e| format!("Failed to build HTTP client: {e}"))?;

    let registry = Arc::new(
        ProviderRegistry::from_config(&config, client.clone())
            .map_err(|e| format!("Failed to build provider registry: {e}"))?,
    );

    let executor = Arc::new(DownloadTrigger::new(
        registry.download_providers().to_vec(),
        config.download.timeout.as_duration(),
    ));
    let paths = PathConvention::new(config.paths.clone());

    let period_server = Arc::new(PeriodServer::new(
        registry.clone(),
        executor.clone(),
        paths.clone(),
        config.scheduler.interval.as_duration(),
    ));

    let classifier: Arc<dyn LinkClassifier> = if config.download.probe_link_type {
        Arc::new(DefaultLinkClassifier::with_probe(client))
    } else {
        Arc::new(DefaultLinkClassifier::new())
    };

    let dispatcher = Dispatcher::new(executor, period_server.clone(), classifier, paths);
    let state = AppState::new(config, registry, dispatcher, period_server.clone());

    Ok((state, period_server))
}

pub async fn run(address: Option<SocketAddr>, config_path: Option<PathBuf>) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let address = address.unwrap_or(config.server.bind_addr);

    if config.server.auth_token.is_none() {
        info!("No auth token configured, API is open");
    }

    let (state, period_server) = build_state(config)?;
    let metrics = state.metrics.clone();
    let scheduler_handle = period_server.spawn();

    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "spiderhook webhook server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler_handle.abort();
    info!(metrics = ?metrics.snapshot(), "Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
