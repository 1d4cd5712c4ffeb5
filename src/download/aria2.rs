//! aria2 JSON-RPC download provider

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use super::paths::resolve_destination;
use super::{DownloadError, DownloadProvider, Result};
use crate::providers::{LinkType, Provider};

/// Hands every link to a running aria2 daemon via `aria2.addUri`
pub struct Aria2Provider {
    name: String,
    enabled: bool,
    client: Client,
    endpoint: String,
    secret: Option<String>,
    base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl Aria2Provider {
    pub fn new(
        name: impl Into<String>,
        enabled: bool,
        client: Client,
        endpoint: impl Into<String>,
        secret: Option<String>,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            name: name.into(),
            enabled,
            client,
            endpoint: endpoint.into(),
            secret,
            base_dir,
        }
    }

    fn add_uri_request(&self, link: &str, dir: &str) -> Value {
        let mut params = Vec::with_capacity(3);
        if let Some(secret) = &self.secret {
            params.push(json!(format!("token:{secret}")));
        }
        params.push(json!([link]));
        params.push(json!({ "dir": dir }));

        json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": "aria2.addUri",
            "params": params,
        })
    }
}

impl Provider for Aria2Provider {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl DownloadProvider for Aria2Provider {
    fn supports(&self, _link_type: LinkType) -> bool {
        true
    }

    async fn send_task(&self, link: &str, dest: &str, link_type: LinkType) -> Result<()> {
        let dir = resolve_destination(&self.base_dir, dest)?;
        let request = self.add_uri_request(link, &dir.to_string_lossy());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DownloadError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| DownloadError::Rpc(format!("invalid response (HTTP {}): {}", status.as_u16(), e)))?;

        if let Some(error) = body.error {
            return Err(DownloadError::Rpc(format!("{} (code {})", error.message, error.code)));
        }

        let gid = body
            .result
            .ok_or_else(|| DownloadError::Rpc("response carries neither result nor error".to_string()))?;

        info!(provider = %self.name, %link_type, gid = %gid, dir = %dir.display(), "Task sent to aria2");
        Ok(())
    }
}
