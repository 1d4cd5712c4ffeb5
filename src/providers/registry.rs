use regex::Regex;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use super::page_scrape::PageScrapeProvider;
use super::pattern::PatternProvider;
use super::traits::{Provider, ProviderError, SourceProvider};
use super::watch_list::WatchListProvider;
use crate::config::{
    Config, DownloadProviderConfig, DownloadProviderKind, SourceProviderConfig, SourceProviderKind,
};
use crate::download::{Aria2Provider, DownloadProvider, HttpDownloadProvider};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("provider '{provider}' has invalid regex: {source}")]
    InvalidPattern {
        provider: String,
        #[source]
        source: regex::Error,
    },
    #[error("provider '{provider}' is missing required option '{option}'")]
    MissingOption { provider: String, option: &'static str },
    #[error("provider '{provider}' failed to load its state: {source}")]
    State {
        provider: String,
        #[source]
        source: ProviderError,
    },
}

/// Private tracker provider entry; only exposed for introspection
#[derive(Debug, Clone)]
pub struct PtProviderEntry {
    name: String,
    enabled: bool,
}

impl PtProviderEntry {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

impl Provider for PtProviderEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Process-wide provider registry
///
/// Built once at startup and shared read-only. Each collection keeps its
/// registration order, which the source matcher relies on.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    download_providers: Vec<Arc<dyn DownloadProvider>>,
    source_providers: Vec<Arc<dyn SourceProvider>>,
    pt_providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_download(&mut self, provider: Arc<dyn DownloadProvider>) -> &mut Self {
        self.download_providers.push(provider);
        self
    }

    pub fn register_source(&mut self, provider: Arc<dyn SourceProvider>) -> &mut Self {
        self.source_providers.push(provider);
        self
    }

    pub fn register_pt(&mut self, provider: Arc<dyn Provider>) -> &mut Self {
        self.pt_providers.push(provider);
        self
    }

    pub fn download_providers(&self) -> &[Arc<dyn DownloadProvider>] {
        &self.download_providers
    }

    pub fn source_providers(&self) -> &[Arc<dyn SourceProvider>] {
        &self.source_providers
    }

    pub fn pt_providers(&self) -> &[Arc<dyn Provider>] {
        &self.pt_providers
    }

    /// Enabled source providers in registration order
    pub fn enabled_source_providers(&self) -> impl Iterator<Item = &Arc<dyn SourceProvider>> {
        self.source_providers.iter().filter(|p| p.enabled())
    }

    /// Build every provider described by the configuration
    pub fn from_config(config: &Config, client: Client) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        for entry in &config.download_providers {
            registry.register_download(build_download_provider(config, entry, client.clone())?);
        }

        // page fetches share the download deadline
        let fetch_timeout = config.download.timeout.as_duration();
        for entry in &config.source_providers {
            registry.register_source(build_source_provider(entry, client.clone(), fetch_timeout)?);
        }

        for entry in &config.pt_providers {
            registry.register_pt(Arc::new(PtProviderEntry::new(entry.name.clone(), entry.enabled)));
        }

        info!(
            download = registry.download_providers.len(),
            source = registry.source_providers.len(),
            pt = registry.pt_providers.len(),
            "Provider registry built"
        );

        Ok(registry)
    }
}

/// `{name: enabled}` view of a provider collection
pub fn provider_status<'a, P>(providers: impl IntoIterator<Item = &'a Arc<P>>) -> BTreeMap<String, bool>
where
    P: Provider + ?Sized + 'a,
{
    providers
        .into_iter()
        .map(|p| (p.name().to_string(), p.enabled()))
        .collect()
}

fn build_download_provider(
    config: &Config,
    entry: &DownloadProviderConfig,
    client: Client,
) -> Result<Arc<dyn DownloadProvider>, RegistryError> {
    let base_dir = config.download.base_dir.clone();

    let provider: Arc<dyn DownloadProvider> = match entry.kind {
        DownloadProviderKind::Http => Arc::new(HttpDownloadProvider::new(
            entry.name.clone(),
            entry.enabled,
            client,
            base_dir,
        )),
        DownloadProviderKind::Aria2 => {
            let endpoint = entry.rpc_endpoint.clone().ok_or_else(|| RegistryError::MissingOption {
                provider: entry.name.clone(),
                option: "rpc_endpoint",
            })?;
            Arc::new(Aria2Provider::new(
                entry.name.clone(),
                entry.enabled,
                client,
                endpoint,
                entry.rpc_secret.clone(),
                base_dir,
            ))
        }
    };

    Ok(provider)
}

fn compile(provider: &str, pattern: &str) -> Result<Regex, RegistryError> {
    Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
        provider: provider.to_string(),
        source,
    })
}

fn build_source_provider(
    entry: &SourceProviderConfig,
    client: Client,
    fetch_timeout: Duration,
) -> Result<Arc<dyn SourceProvider>, RegistryError> {
    let pattern = compile(&entry.name, &entry.pattern)?;
    let link_pattern = entry
        .link_pattern
        .as_deref()
        .map(|p| compile(&entry.name, p))
        .transpose()?;
    let preferred = entry.prefer_download_provider.clone();

    let provider: Arc<dyn SourceProvider> = match entry.kind {
        SourceProviderKind::Pattern => Arc::new(
            PatternProvider::new(entry.name.clone(), pattern)
                .with_flags(entry.enabled, entry.webhook_enabled)
                .with_target(entry.file_type, entry.link_type, entry.path.clone())
                .with_preferred_download_provider(preferred),
        ),
        SourceProviderKind::PageScrape => {
            let link_pattern = link_pattern.ok_or_else(|| RegistryError::MissingOption {
                provider: entry.name.clone(),
                option: "link_pattern",
            })?;
            Arc::new(
                PageScrapeProvider::new(entry.name.clone(), pattern, link_pattern, client)
                    .with_flags(entry.enabled, entry.webhook_enabled)
                    .with_target(entry.file_type, entry.link_type, entry.path.clone())
                    .with_preferred_download_provider(preferred)
                    .with_fetch_timeout(fetch_timeout),
            )
        }
        SourceProviderKind::WatchList => {
            let mut provider = WatchListProvider::new(entry.name.clone(), pattern, client)
                .with_flags(entry.enabled, entry.webhook_enabled)
                .with_target(entry.file_type, entry.link_type, entry.path.clone())
                .with_link_pattern(link_pattern)
                .with_preferred_download_provider(preferred)
                .with_fetch_timeout(fetch_timeout);
            if let Some(state_file) = &entry.state_file {
                provider = provider
                    .with_state_file(state_file.clone())
                    .map_err(|source| RegistryError::State {
                        provider: entry.name.clone(),
                        source,
                    })?;
            }
            Arc::new(provider)
        }
    };

    Ok(provider)
}
