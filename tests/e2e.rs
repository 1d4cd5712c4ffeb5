//! End-to-end tests for spiderhook
//!
//! These tests drive the fully wired server (configuration file, provider
//! registry, download trigger, periodic server) against a mock file server:
//! 1. Write a TOML configuration into a temp dir
//! 2. Build the application state from it
//! 3. Send webhooks through the router
//! 4. Verify the downloaded files on disk

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spiderhook::api::{build_router, build_state};
use spiderhook::config::Config;
use spiderhook::scheduler::PeriodServer;

const ISO_BYTES: &[u8] = b"not really an iso image";
const EPISODE_BYTES: &[u8] = b"d8:announce...e";

struct E2EContext {
    router: Router,
    period_server: Arc<PeriodServer>,
    server: MockServer,
    temp_dir: TempDir,
}

impl E2EContext {
    async fn setup() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mirror/debian.iso"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(ISO_BYTES))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/plain/readme.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/series/s01e01.torrent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(EPISODE_BYTES))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mirror/missing.iso"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_dir = temp_dir.path().join("downloads");
        let state_file = temp_dir.path().join("state/series.json");

        let config_toml = format!(
            r#"
[download]
base_dir = "{base_dir}"
timeout = "10s"

[scheduler]
interval = "1h"

[[download_providers]]
name = "http"
kind = "http"

[[source_providers]]
name = "isos"
kind = "pattern"
pattern = '\.iso$'
file_type = "common"
link_type = "general"
path = "isos"

[[source_providers]]
name = "series"
kind = "watch_list"
pattern = '/series/'
file_type = "tv"
link_type = "torrent"
path = "series"
state_file = "{state_file}"
"#,
            base_dir = base_dir.display(),
            state_file = state_file.display(),
        );
        let config_path = temp_dir.path().join("spiderhook.toml");
        std::fs::write(&config_path, config_toml).expect("Failed to write config");

        let config = Config::load_from_path(config_path).expect("Failed to load config");
        let (state, period_server) = build_state(config).expect("Failed to build state");

        Self {
            router: build_router(state),
            period_server,
            server,
            temp_dir,
        }
    }

    fn base_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("downloads")
    }

    async fn send_webhook(&self, source: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/download")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "dataSource": source }).to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("missing {}: {e}", path.display()))
}

#[tokio::test]
async fn test_disposable_provider_downloads_to_type_path() {
    let ctx = E2EContext::setup().await;

    let (status, body) = ctx
        .send_webhook(&format!("{}/mirror/debian.iso", ctx.server.uri()))
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(read(&ctx.base_dir().join("common/isos/debian.iso")), ISO_BYTES);
}

#[tokio::test]
async fn test_unmatched_source_downloads_to_common() {
    let ctx = E2EContext::setup().await;

    let (status, body) = ctx
        .send_webhook(&format!("{}/plain/readme.txt", ctx.server.uri()))
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(read(&ctx.base_dir().join("common/readme.txt")), b"hello");
}

#[tokio::test]
async fn test_download_failure_reported_as_500() {
    let ctx = E2EContext::setup().await;

    let (status, body) = ctx
        .send_webhook(&format!("{}/mirror/missing.iso", ctx.server.uri()))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("404"), "{body}");
    assert!(!ctx.base_dir().join("common/isos/missing.iso").exists());
}

#[tokio::test]
async fn test_persistent_provider_downloads_on_scheduled_run() {
    let ctx = E2EContext::setup().await;
    let source = format!("{}/series/s01e01.torrent", ctx.server.uri());

    let (status, _) = ctx.send_webhook(&source).await;
    assert_eq!(status, StatusCode::OK);

    // nothing is fetched until the periodic server runs
    let episode = ctx.base_dir().join("tv/series/s01e01.torrent");
    assert!(!episode.exists());

    let summary = ctx.period_server.run_once().await;
    assert_eq!(summary.links, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(read(&episode), EPISODE_BYTES);

    // the watch list survives on disk
    let state = read(&ctx.temp_dir.path().join("state/series.json"));
    let state: serde_json::Value = serde_json::from_slice(&state).unwrap();
    assert_eq!(state["sources"], json!([source]));

    // already seen links are not downloaded twice
    assert_eq!(ctx.period_server.run_once().await.links, 0);
}
