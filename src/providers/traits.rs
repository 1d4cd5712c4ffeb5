use async_trait::async_trait;
use thiserror::Error;

use super::types::{LinkDescriptor, LinkType, ListenType};

/// Source provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("no links found in {0}")]
    NoLinks(String),
    #[error("state file error: {0}")]
    State(#[from] std::io::Error),
    #[error("state encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Identity shared by every provider collection (download, source, pt)
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool;
}

/// Capability contract of a source provider
///
/// A source provider recognizes sources it can handle and either turns them
/// into download links right away ([`ListenType::Disposable`]) or records them
/// in its own state for the periodic server ([`ListenType::Persistent`]).
#[async_trait]
pub trait SourceProvider: Provider {
    /// Whether webhook calls may be routed to this provider
    fn webhook_enabled(&self) -> bool;

    fn listen_type(&self) -> ListenType;

    /// Link type handed to the download trigger for every link of this provider
    fn link_type(&self) -> LinkType;

    /// Name of the download provider to try first, if any
    fn prefer_download_provider(&self) -> Option<&str> {
        None
    }

    fn should_handle(&self, source: &str) -> bool;

    /// Extract downloadable links for `source`, in download order
    async fn get_links(&self, source: &str) -> Result<Vec<LinkDescriptor>, ProviderError>;

    /// Fold `source` into the provider's own durable configuration
    async fn update_config(&self, source: &str) -> Result<(), ProviderError>;

    /// Links to download on a scheduled run
    ///
    /// Links stay scheduled until [`SourceProvider::mark_downloaded`] is called.
    async fn scheduled_links(&self) -> Result<Vec<LinkDescriptor>, ProviderError> {
        Ok(Vec::new())
    }

    /// Record that a scheduled link was downloaded
    async fn mark_downloaded(&self, _link: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}
