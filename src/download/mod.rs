//! Download execution
//!
//! The dispatcher only sees [`DownloadExecutor`]; the concrete executor is a
//! [`DownloadTrigger`] that hands links to the registered
//! [`DownloadProvider`]s (plain HTTP, aria2).

pub mod aria2;
pub mod classifier;
pub mod http;
pub mod paths;
mod trigger;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{LinkType, Provider, SourceProvider};

pub use aria2::Aria2Provider;
pub use classifier::{DefaultLinkClassifier, LinkClassifier};
pub use http::HttpDownloadProvider;
pub use paths::PathConvention;
pub use trigger::DownloadTrigger;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("download provider '{provider}' timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid destination path: {0}")]
    InvalidPath(String),

    #[error("aria2 RPC error: {0}")]
    Rpc(String),

    #[error("no download provider available for {0} links")]
    NoProvider(LinkType),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DownloadError>;

/// A backend able to fetch links (`[[download_providers]]`)
#[async_trait]
pub trait DownloadProvider: Provider {
    fn supports(&self, link_type: LinkType) -> bool;

    /// Queue or perform the download of `link` into `dest` (relative to the download root)
    async fn send_task(&self, link: &str, dest: &str, link_type: LinkType) -> Result<()>;
}

/// Download collaborator of the dispatcher
#[async_trait]
pub trait DownloadExecutor: Send + Sync {
    async fn download(
        &self,
        link: &str,
        dest: &str,
        link_type: LinkType,
        provider: Option<&dyn SourceProvider>,
    ) -> Result<()>;
}
