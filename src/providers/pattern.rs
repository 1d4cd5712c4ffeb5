use async_trait::async_trait;
use regex::Regex;

use super::traits::{Provider, ProviderError, SourceProvider};
use super::types::{FileType, LinkDescriptor, LinkType, ListenType};

/// Capture group naming the destination fragment
const TITLE_GROUP: &str = "title";

/// Disposable provider that downloads the source itself
///
/// The source is claimed when it matches `pattern`. If the pattern has a
/// `title` capture group, its text becomes the destination fragment,
/// otherwise the configured `path` is used.
#[derive(Debug, Clone)]
pub struct PatternProvider {
    name: String,
    enabled: bool,
    webhook_enabled: bool,
    pattern: Regex,
    file_type: FileType,
    link_type: LinkType,
    path: String,
    prefer_download_provider: Option<String>,
}

impl PatternProvider {
    pub fn new(name: impl Into<String>, pattern: Regex) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            webhook_enabled: true,
            pattern,
            file_type: FileType::Common,
            link_type: LinkType::General,
            path: String::new(),
            prefer_download_provider: None,
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

    fn fragment_for(&self, source: &str) -> String {
        self.pattern
            .captures(source)
            .and_then(|caps| caps.name(TITLE_GROUP))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| self.path.clone())
    }
}

impl Provider for PatternProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl SourceProvider for PatternProvider {
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
        Ok(vec![LinkDescriptor::new(
            source,
            self.file_type,
            self.fragment_for(source),
        )])
    }

    async fn update_config(&self, _source: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}
