//! Link type classification for sources no provider claimed

use async_trait::async_trait;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use tracing::debug;

use crate::providers::LinkType;

const TORRENT_CONTENT_TYPE: &str = "application/x-bittorrent";

#[async_trait]
pub trait LinkClassifier: Send + Sync {
    async fn classify(&self, source: &str) -> LinkType;
}

/// Scheme and extension based classifier with an optional HEAD probe
#[derive(Debug, Clone, Default)]
pub struct DefaultLinkClassifier {
    probe: Option<Client>,
}

impl DefaultLinkClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the remote server for the content type when the URL itself is inconclusive
    pub fn with_probe(client: Client) -> Self {
        Self {
            probe: Some(client),
        }
    }

    async fn probe_is_torrent(&self, client: &Client, url: Url) -> bool {
        match client.head(url.clone()).send().await {
            Ok(response) => response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.to_ascii_lowercase().starts_with(TORRENT_CONTENT_TYPE)),
            Err(e) => {
                debug!(%url, error = %e, "Link type probe failed");
                false
            }
        }
    }
}

/// Classification that needs no network access
pub fn classify_static(source: &str) -> Option<LinkType> {
    let trimmed = source.trim();
    if trimmed
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("magnet:"))
    {
        return Some(LinkType::Magnet);
    }

    let url = Url::parse(trimmed).ok()?;
    if url.path().to_ascii_lowercase().ends_with(".torrent") {
        return Some(LinkType::Torrent);
    }

    None
}

#[async_trait]
impl LinkClassifier for DefaultLinkClassifier {
    async fn classify(&self, source: &str) -> LinkType {
        if let Some(link_type) = classify_static(source) {
            return link_type;
        }

        if let Some(client) = &self.probe {
            if let Ok(url) = Url::parse(source.trim()) {
                if matches!(url.scheme(), "http" | "https") && self.probe_is_torrent(client, url).await {
                    return LinkType::Torrent;
                }
            }
        }

        LinkType::General
    }
}
