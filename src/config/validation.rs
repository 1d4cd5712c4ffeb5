use super::models::{Config, DownloadProviderKind, SourceProviderKind};
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duplicate {collection} provider name '{name}'")]
    DuplicateProviderName { collection: &'static str, name: String },

    #[error("Source provider '{provider}' has invalid {field}: {message}")]
    InvalidPattern {
        provider: String,
        field: &'static str,
        message: String,
    },

    #[error("Source provider '{provider}' of kind page_scrape requires link_pattern")]
    MissingLinkPattern { provider: String },

    #[error("Download provider '{provider}' of kind aria2 requires rpc_endpoint")]
    MissingRpcEndpoint { provider: String },

    #[error("Source provider '{provider}' prefers non-existent download provider '{preferred}'")]
    InvalidPreferredProvider { provider: String, preferred: String },

    #[error("Duration must be positive: {field}")]
    ZeroDuration { field: &'static str },

    #[error("max_payload_bytes must be positive")]
    ZeroPayloadLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_unique_names(config)?;
    validate_download_providers(config)?;
    validate_source_providers(config)?;
    validate_limits(config)?;
    Ok(())
}

/// Provider names are identities; each collection must not repeat one
fn validate_unique_names(config: &Config) -> Result<(), ValidationError> {
    check_unique("download", config.download_providers.iter().map(|p| p.name.as_str()))?;
    check_unique("source", config.source_providers.iter().map(|p| p.name.as_str()))?;
    check_unique("pt", config.pt_providers.iter().map(|p| p.name.as_str()))?;
    Ok(())
}

fn check_unique<'a>(
    collection: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateProviderName {
                collection,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_download_providers(config: &Config) -> Result<(), ValidationError> {
    for provider in &config.download_providers {
        if provider.kind == DownloadProviderKind::Aria2 && provider.rpc_endpoint.is_none() {
            return Err(ValidationError::MissingRpcEndpoint {
                provider: provider.name.clone(),
            });
        }
    }
    Ok(())
}

/// Patterns must compile and preferred download providers must exist
fn validate_source_providers(config: &Config) -> Result<(), ValidationError> {
    for provider in &config.source_providers {
        check_regex(&provider.name, "pattern", &provider.pattern)?;

        match (&provider.kind, &provider.link_pattern) {
            (SourceProviderKind::PageScrape, None) => {
                return Err(ValidationError::MissingLinkPattern {
                    provider: provider.name.clone(),
                });
            }
            (_, Some(link_pattern)) => {
                check_regex(&provider.name, "link_pattern", link_pattern)?;
            }
            _ => {}
        }

        if let Some(ref preferred) = provider.prefer_download_provider {
            if !config.download_providers.iter().any(|d| &d.name == preferred) {
                return Err(ValidationError::InvalidPreferredProvider {
                    provider: provider.name.clone(),
                    preferred: preferred.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_regex(provider: &str, field: &'static str, pattern: &str) -> Result<(), ValidationError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidPattern {
            provider: provider.to_string(),
            field,
            message: e.to_string(),
        })
}

fn validate_limits(config: &Config) -> Result<(), ValidationError> {
    if config.scheduler.interval.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "scheduler.interval",
        });
    }

    if config.download.timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "download.timeout",
        });
    }

    if config.server.max_payload_bytes == 0 {
        return Err(ValidationError::ZeroPayloadLimit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::*;
    use crate::humanize::HumanDuration;
    use crate::providers::{FileType, LinkType};

    fn source(name: &str, kind: SourceProviderKind) -> SourceProviderConfig {
        SourceProviderConfig {
            name: name.to_string(),
            kind,
            enabled: true,
            webhook_enabled: true,
            pattern: "^https://".to_string(),
            link_pattern: None,
            file_type: FileType::Common,
            link_type: LinkType::General,
            path: String::new(),
            state_file: None,
            prefer_download_provider: None,
        }
    }

    fn create_test_config() -> Config {
        Config {
            download_providers: vec![DownloadProviderConfig {
                name: "http".to_string(),
                kind: DownloadProviderKind::Http,
                enabled: true,
                rpc_endpoint: None,
                rpc_secret_env: None,
                rpc_secret: None,
            }],
            source_providers: vec![source("pages", SourceProviderKind::Pattern)],
            pt_providers: vec![PtProviderConfig {
                name: "mteam".to_string(),
                enabled: true,
            }],
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_duplicate_source_names() {
        let mut config = create_test_config();
        config
            .source_providers
            .push(source("pages", SourceProviderKind::WatchList));

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::DuplicateProviderName { collection: "source", .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut config = create_test_config();
        config.source_providers[0].pattern = "([unclosed".to_string();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidPattern { field: "pattern", .. })
        ));
    }

    #[test]
    fn test_page_scrape_requires_link_pattern() {
        let mut config = create_test_config();
        config.source_providers[0].kind = SourceProviderKind::PageScrape;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::MissingLinkPattern { .. })));
    }

    #[test]
    fn test_aria2_requires_endpoint() {
        let mut config = create_test_config();
        config.download_providers[0].kind = DownloadProviderKind::Aria2;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::MissingRpcEndpoint { .. })));
    }

    #[test]
    fn test_unknown_preferred_provider() {
        let mut config = create_test_config();
        config.source_providers[0].prefer_download_provider = Some("qbittorrent".to_string());

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidPreferredProvider { .. })
        ));
    }

    #[test]
    fn test_zero_interval() {
        let mut config = create_test_config();
        config.scheduler.interval = HumanDuration::from_secs(0);

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroDuration { field: "scheduler.interval" })
        ));
    }
}
