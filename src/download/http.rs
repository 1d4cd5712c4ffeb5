//! Plain HTTP download provider

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::paths::resolve_destination;
use super::{DownloadError, DownloadProvider, Result};
use crate::providers::{LinkType, Provider};

const FALLBACK_FILE_NAME: &str = "download";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("spiderhook/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Build the shared reqwest client
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| DownloadError::RequestFailed(e.to_string()))
}

/// Removes a file on drop unless [`PartialFile::keep`] was called
///
/// Covers error returns and cancellation of the download future alike.
struct PartialFile {
    path: PathBuf,
    keep: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial download"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove partial download"),
        }
    }
}

/// Streams general links and `.torrent` files straight to disk
pub struct HttpDownloadProvider {
    name: String,
    enabled: bool,
    client: Client,
    base_dir: PathBuf,
}

impl HttpDownloadProvider {
    pub fn new(name: impl Into<String>, enabled: bool, client: Client, base_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            enabled,
            client,
            base_dir,
        }
    }

    async fn fetch_to(&self, url: Url, dir: &Path) -> Result<PathBuf> {
        debug!(%url, "Starting download");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloadError::RequestFailed(format!("timed out fetching {url}"))
                } else {
                    DownloadError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        tokio::fs::create_dir_all(dir).await?;
        let partial = PartialFile::new(dir.join(file_name(&url)));
        let mut file = tokio::fs::File::create(&partial.path).await?;

        let mut size = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DownloadError::RequestFailed(format!("Failed to read body: {}", e)))?
        {
            size += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);
        let target = partial.keep();

        debug!(%url, size, path = %target.display(), "Download completed");

        Ok(target)
    }
}

/// Last non-empty path segment, or a fixed fallback name
fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

impl Provider for HttpDownloadProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl DownloadProvider for HttpDownloadProvider {
    fn supports(&self, link_type: LinkType) -> bool {
        matches!(link_type, LinkType::General | LinkType::Torrent)
    }

    async fn send_task(&self, link: &str, dest: &str, _link_type: LinkType) -> Result<()> {
        let url = Url::parse(link).map_err(|e| DownloadError::InvalidUrl(format!("{link}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl(link.to_string()));
        }

        let dir = resolve_destination(&self.base_dir, dest)?;
        self.fetch_to(url, &dir).await?;
        Ok(())
    }
}
