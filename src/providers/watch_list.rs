use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::page_scrape::{DEFAULT_FETCH_TIMEOUT, scrape_links};
use super::traits::{Provider, ProviderError, SourceProvider};
use super::types::{FileType, LinkDescriptor, LinkType, ListenType};

/// Durable state of a watch list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchState {
    /// Watched sources in the order they were added
    #[serde(default)]
    pub sources: Vec<String>,
    /// Links the periodic server has downloaded
    #[serde(default)]
    pub seen: BTreeSet<String>,
}

/// Read a state file; a missing file is an empty watch list
pub fn load_state(path: &Path) -> Result<WatchState, ProviderError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WatchState::default()),
        Err(e) => Err(e.into()),
    }
}

async fn save_state(path: &Path, state: &WatchState) -> Result<(), ProviderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(state)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Persistent provider keeping a watch list of sources
///
/// Webhook calls add sources to the list; scheduled runs turn every watched
/// source into links. With a `link_pattern` each source is fetched and its
/// matching links are emitted, otherwise the source itself is the link. A link
/// is emitted on every run until [`SourceProvider::mark_downloaded`] records it.
///
/// State mutations are serialised by one async mutex, which is never held
/// across a page fetch. The in-memory state only changes once the state file
/// has been written.
pub struct WatchListProvider {
    name: String,
    enabled: bool,
    webhook_enabled: bool,
    pattern: Regex,
    link_pattern: Option<Regex>,
    file_type: FileType,
    link_type: LinkType,
    path: String,
    prefer_download_provider: Option<String>,
    state_file: Option<PathBuf>,
    state: Mutex<WatchState>,
    fetch_timeout: Duration,
    client: Client,
}

impl WatchListProvider {
    pub fn new(name: impl Into<String>, pattern: Regex, client: Client) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            webhook_enabled: true,
            pattern,
            link_pattern: None,
            file_type: FileType::Common,
            link_type: LinkType::General,
            path: String::new(),
            prefer_download_provider: None,
            state_file: None,
            state: Mutex::new(WatchState::default()),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            client,
        }
    }

    pub fn with_flags(mut self, enabled: bool, webhook_enabled: bool) -> Self {
        self.enabled = enabled;
        self.webhook_enabled = webhook_enabled;
        self
    }

    pub fn with_target(mut self, file_type: FileType, link_type: LinkType, path: impl Into<String>) -> Self {
        self.file_type = file_type;
        self.link_type = link_type;
        self.path = path.into();
        self
    }

    pub fn with_link_pattern(mut self, link_pattern: Option<Regex>) -> Self {
        self.link_pattern = link_pattern;
        self
    }

    pub fn with_preferred_download_provider(mut self, name: Option<String>) -> Self {
        self.prefer_download_provider = name;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Back the watch list with `path`, loading whatever it already holds
    pub fn with_state_file(mut self, path: PathBuf) -> Result<Self, ProviderError> {
        let state = load_state(&path)?;
        self.state = Mutex::new(state);
        self.state_file = Some(path);
        Ok(self)
    }

    pub async fn snapshot(&self) -> WatchState {
        self.state.lock().await.clone()
    }

    async fn persist(&self, state: &WatchState) -> Result<(), ProviderError> {
        match &self.state_file {
            Some(path) => save_state(path, state).await,
            None => Ok(()),
        }
    }

    async fn links_for(&self, source: &str) -> Result<Vec<String>, ProviderError> {
        match &self.link_pattern {
            Some(link_pattern) => scrape_links(&self.client, source, link_pattern, self.fetch_timeout).await,
            None => Ok(vec![source.to_string()]),
        }
    }
}

impl Provider for WatchListProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl SourceProvider for WatchListProvider {
    fn webhook_enabled(&self) -> bool {
        self.webhook_enabled
    }

    fn listen_type(&self) -> ListenType {
        ListenType::Persistent
    }

    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn prefer_download_provider(&self) -> Option<&str> {
        self.prefer_download_provider.as_deref()
    }

    fn should_handle(&self, source: &str) -> bool {
        self.pattern.is_match(source)
    }

    async fn get_links(&self, source: &str) -> Result<Vec<LinkDescriptor>, ProviderError> {
        Ok(self
            .links_for(source)
            .await?
            .into_iter()
            .map(|link| LinkDescriptor::new(link, self.file_type, self.path.clone()))
            .collect())
    }

    async fn update_config(&self, source: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        if state.sources.iter().any(|s| s == source) {
            return Ok(());
        }

        let mut next = state.clone();
        next.sources.push(source.to_string());
        self.persist(&next).await?;
        *state = next;

        info!(provider = %self.name, source, watched = state.sources.len(), "Source added to watch list");
        Ok(())
    }

    async fn scheduled_links(&self) -> Result<Vec<LinkDescriptor>, ProviderError> {
        let (sources, seen) = {
            let state = self.state.lock().await;
            (state.sources.clone(), state.seen.clone())
        };

        let mut emitted = BTreeSet::new();
        let mut fresh = Vec::new();
        for source in sources {
            match self.links_for(&source).await {
                Ok(links) => {
                    for link in links {
                        if !seen.contains(&link) && emitted.insert(link.clone()) {
                            fresh.push(LinkDescriptor::new(link, self.file_type, self.path.clone()));
                        }
                    }
                }
                Err(e) => warn!(provider = %self.name, %source, error = %e, "Skipping watched source"),
            }
        }

        Ok(fresh)
    }

    async fn mark_downloaded(&self, link: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        if state.seen.contains(link) {
            return Ok(());
        }

        let mut next = state.clone();
        next.seen.insert(link.to_string());
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }
}
