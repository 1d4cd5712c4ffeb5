use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

use super::traits::{Provider, ProviderError, SourceProvider};
use super::types::{FileType, LinkDescriptor, LinkType, ListenType};

/// Upper bound on a single page fetch unless configured otherwise
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch `url` and return every `link_pattern` match in page order, without duplicates
///
/// `timeout` covers the whole exchange, body included.
pub(crate) async fn scrape_links(
    client: &Client,
    url: &str,
    link_pattern: &Regex,
    timeout: Duration,
) -> Result<Vec<String>, ProviderError> {
    let fetch_error = |message: String| ProviderError::Fetch {
        url: url.to_string(),
        message,
    };

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status.as_u16())));
    }

    let body = response.text().await.map_err(|e| fetch_error(e.to_string()))?;

    let mut seen = HashSet::new();
    let links: Vec<String> = link_pattern
        .find_iter(&body)
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|link| seen.insert(link.clone()))
        .collect();

    debug!(url, count = links.len(), "Scraped links");
    Ok(links)
}

/// Disposable provider that fetches the source page and downloads every link on it
#[derive(Debug, Clone)]
pub struct PageScrapeProvider {
    name: String,
    enabled: bool,
    webhook_enabled: bool,
    pattern: Regex,
    link_pattern: Regex,
    file_type: FileType,
    link_type: LinkType,
    path: String,
    prefer_download_provider: Option<String>,
    fetch_timeout: Duration,
    client: Client,
}

impl PageScrapeProvider {
    pub fn new(name: impl Into<String>, pattern: Regex, link_pattern: Regex, client: Client) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            webhook_enabled: true,
            pattern,
            link_pattern,
            file_type: FileType::Common,
            link_type: LinkType::General,
            path: String::new(),
            prefer_download_provider: None,
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

    pub fn with_preferred_download_provider(mut self, name: Option<String>) -> Self {
        self.prefer_download_provider = name;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

impl Provider for PageScrapeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl SourceProvider for PageScrapeProvider {
    fn webhook_enabled(&self) -> bool {
        self.webhook_enabled
    }

    fn listen_type(&self) -> ListenType {
        ListenType::Disposable
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
        let links = scrape_links(&self.client, source, &self.link_pattern, self.fetch_timeout).await?;
        if links.is_empty() {
            return Err(ProviderError::NoLinks(source.to_string()));
        }

        Ok(links
            .into_iter()
            .map(|link| LinkDescriptor::new(link, self.file_type, self.path.clone()))
            .collect())
    }

    async fn update_config(&self, _source: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}
