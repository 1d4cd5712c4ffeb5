use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::providers::SourceProvider;

/// Result of matching one source against the source providers
#[derive(Clone)]
pub enum MatchOutcome {
    Unmatched,
    Matched {
        /// Last matching provider in registration order
        provider: Arc<dyn SourceProvider>,
        /// How many providers claimed the source
        candidates: usize,
    },
}

impl MatchOutcome {
    pub fn matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }

    pub fn provider(&self) -> Option<&Arc<dyn SourceProvider>> {
        match self {
            MatchOutcome::Unmatched => None,
            MatchOutcome::Matched { provider, .. } => Some(provider),
        }
    }
}

impl fmt::Debug for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Unmatched => f.write_str("Unmatched"),
            MatchOutcome::Matched {
                provider,
                candidates,
            } => f
                .debug_struct("Matched")
                .field("provider", &provider.name())
                .field("candidates", candidates)
                .finish(),
        }
    }
}

/// Find the provider responsible for `source`
///
/// Only enabled, webhook-enabled providers take part. The scan never stops
/// early: when several providers claim the source, the one registered last
/// wins, so registration order acts as priority.
pub fn match_source<'a>(
    source: &str,
    providers: impl IntoIterator<Item = &'a Arc<dyn SourceProvider>>,
) -> MatchOutcome {
    let mut matched: Option<&Arc<dyn SourceProvider>> = None;
    let mut names = Vec::new();

    for provider in providers {
        if !(provider.enabled() && provider.webhook_enabled()) {
            continue;
        }
        if provider.should_handle(source) {
            names.push(provider.name());
            matched = Some(provider);
        }
    }

    match matched {
        None => {
            debug!(source, "No source provider matched");
            MatchOutcome::Unmatched
        }
        Some(provider) => {
            if names.len() > 1 {
                warn!(
                    source,
                    candidates = ?names,
                    chosen = provider.name(),
                    "Source matched multiple providers, using the last registered one"
                );
            }
            MatchOutcome::Matched {
                provider: provider.clone(),
                candidates: names.len(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FileType, LinkType, PatternProvider};
    use regex::Regex;

    fn provider(name: &str, pattern: &str) -> PatternProvider {
        PatternProvider::new(name, Regex::new(pattern).unwrap())
    }

    fn registry(providers: Vec<PatternProvider>) -> Vec<Arc<dyn SourceProvider>> {
        providers
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn SourceProvider>)
            .collect()
    }

    #[test]
    fn test_no_providers() {
        let providers = registry(vec![]);
        assert!(!match_source("http://example.com/x", &providers).matched());
    }

    #[test]
    fn test_no_match() {
        let providers = registry(vec![provider("magnet", "^magnet:"), provider("iso", r"\.iso$")]);

        let outcome = match_source("http://example.com/x", &providers);
        assert!(!outcome.matched());
        assert!(outcome.provider().is_none());
    }

    #[test]
    fn test_single_match() {
        let providers = registry(vec![provider("magnet", "^magnet:"), provider("iso", r"\.iso$")]);

        let outcome = match_source("https://mirror.example/debian.iso", &providers);
        assert_eq!(outcome.provider().map(|p| p.name()), Some("iso"));
        assert!(matches!(outcome, MatchOutcome::Matched { candidates: 1, .. }));
    }

    #[test]
    fn test_last_match_wins() {
        let providers = registry(vec![
            provider("p1", "^https://"),
            provider("other", "^magnet:"),
            provider("p2", r"example\.com"),
        ]);

        let outcome = match_source("https://example.com/x", &providers);
        assert_eq!(outcome.provider().map(|p| p.name()), Some("p2"));
        assert!(matches!(outcome, MatchOutcome::Matched { candidates: 2, .. }));
    }

    #[test]
    fn test_disabled_providers_do_not_participate() {
        let providers = registry(vec![
            provider("p1", "^https://"),
            provider("p2", "^https://").with_flags(false, true),
        ]);

        let outcome = match_source("https://example.com/x", &providers);
        assert_eq!(outcome.provider().map(|p| p.name()), Some("p1"));
    }

    #[test]
    fn test_webhook_disabled_providers_do_not_participate() {
        let providers = registry(vec![
            provider("p1", "^https://").with_flags(true, false),
            provider("p2", "^https://")
                .with_flags(true, false)
                .with_target(FileType::Tv, LinkType::Torrent, ""),
        ]);

        assert!(!match_source("https://example.com/x", &providers).matched());
    }
}
