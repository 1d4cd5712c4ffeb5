use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::matcher::MatchOutcome;
use crate::download::{DownloadError, DownloadExecutor, LinkClassifier, PathConvention};
use crate::providers::{FileType, ListenType, ProviderError, SourceProvider};
use crate::scheduler::Scheduler;

/// One inbound webhook call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub source: String,
    /// Destination fragment, empty when the caller gave none
    pub path: String,
}

impl DownloadRequest {
    pub fn new(source: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
        }
    }
}

/// Route taken by a successful dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPath {
    Fallback,
    Batch { downloaded: usize },
    Persist,
}

impl fmt::Display for DispatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPath::Fallback => f.write_str("fallback"),
            DispatchPath::Batch { .. } => f.write_str("batch"),
            DispatchPath::Persist => f.write_str("persist"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Executor failure, reported verbatim
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("provider '{provider}' failed to extract links: {source}")]
    LinkExtraction {
        provider: String,
        #[source]
        source: ProviderError,
    },
}

pub type DispatchResult = Result<DispatchPath, DispatchError>;

/// Dispatch decision engine
///
/// Picks one of three paths from the match outcome:
///
/// - no provider: classify the source and download it once into the common path
/// - disposable provider: download every extracted link, stopping at the first failure
/// - persistent provider: update the provider's watch state and nudge the scheduler
pub struct Dispatcher {
    executor: Arc<dyn DownloadExecutor>,
    scheduler: Arc<dyn Scheduler>,
    classifier: Arc<dyn LinkClassifier>,
    paths: PathConvention,
}

impl Dispatcher {
    pub fn new(
        executor: Arc<dyn DownloadExecutor>,
        scheduler: Arc<dyn Scheduler>,
        classifier: Arc<dyn LinkClassifier>,
        paths: PathConvention,
    ) -> Self {
        Self {
            executor,
            scheduler,
            classifier,
            paths,
        }
    }

    pub async fn dispatch(&self, request: &DownloadRequest, outcome: MatchOutcome) -> DispatchResult {
        let provider = match outcome {
            MatchOutcome::Unmatched => return self.fallback(request).await,
            MatchOutcome::Matched { provider, .. } => provider,
        };

        match provider.listen_type() {
            ListenType::Disposable => self.batch(request, provider.as_ref()).await,
            ListenType::Persistent => {
                self.persist(request, provider.as_ref()).await;
                Ok(DispatchPath::Persist)
            }
        }
    }

    async fn fallback(&self, request: &DownloadRequest) -> DispatchResult {
        let link_type = self.classifier.classify(&request.source).await;
        let dest = self.paths.destination(FileType::Common, &request.path);
        info!(source = %request.source, %dest, %link_type, "No provider matched, downloading source directly");

        self.executor
            .download(&request.source, &dest, link_type, None)
            .await?;
        Ok(DispatchPath::Fallback)
    }

    async fn batch(&self, request: &DownloadRequest, provider: &dyn SourceProvider) -> DispatchResult {
        let links = provider
            .get_links(&request.source)
            .await
            .map_err(|source| DispatchError::LinkExtraction {
                provider: provider.name().to_string(),
                source,
            })?;
        info!(provider = provider.name(), links = links.len(), "Dispatching extracted links");

        let link_type = provider.link_type();
        for (index, descriptor) in links.iter().enumerate() {
            let dest = self.paths.destination(descriptor.file_type, &descriptor.path);
            debug!(provider = provider.name(), index, link = %descriptor.link, %dest, "Downloading link");

            if let Err(e) = self
                .executor
                .download(&descriptor.link, &dest, link_type, Some(provider))
                .await
            {
                warn!(
                    provider = provider.name(),
                    index,
                    remaining = links.len() - index - 1,
                    error = %e,
                    "Download failed, aborting batch"
                );
                return Err(e.into());
            }
        }

        Ok(DispatchPath::Batch {
            downloaded: links.len(),
        })
    }

    async fn persist(&self, request: &DownloadRequest, provider: &dyn SourceProvider) {
        if let Err(e) = provider.update_config(&request.source).await {
            warn!(provider = provider.name(), source = %request.source, error = %e, "Provider config update failed");
        }
        self.scheduler.trigger_run();
        info!(provider = provider.name(), "Scheduler run triggered");
    }
}
