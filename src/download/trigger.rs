use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{DownloadError, DownloadExecutor, DownloadProvider};
use crate::providers::{LinkType, SourceProvider};

/// Download executor that walks the registered download providers
///
/// Enabled providers supporting the link type are tried in registration
/// order, with the source provider's preferred download provider moved to the
/// front. The first success wins. Every call is bounded by `timeout`.
pub struct DownloadTrigger {
    providers: Vec<Arc<dyn DownloadProvider>>,
    timeout: Duration,
}

impl DownloadTrigger {
    pub fn new(providers: Vec<Arc<dyn DownloadProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    fn candidates(
        &self,
        link_type: LinkType,
        preferred: Option<&str>,
    ) -> Vec<&Arc<dyn DownloadProvider>> {
        let mut candidates: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.enabled() && p.supports(link_type))
            .collect();

        if let Some(preferred) = preferred {
            if let Some(pos) = candidates.iter().position(|p| p.name() == preferred) {
                let first = candidates.remove(pos);
                candidates.insert(0, first);
            }
        }

        candidates
    }
}

#[async_trait]
impl DownloadExecutor for DownloadTrigger {
    async fn download(
        &self,
        link: &str,
        dest: &str,
        link_type: LinkType,
        provider: Option<&dyn SourceProvider>,
    ) -> Result<(), DownloadError> {
        let preferred = provider.and_then(|p| p.prefer_download_provider());
        let candidates = self.candidates(link_type, preferred);

        let mut last_error = None;
        for candidate in candidates {
            let outcome = tokio::time::timeout(self.timeout, candidate.send_task(link, dest, link_type))
                .await
                .unwrap_or_else(|_| {
                    Err(DownloadError::Timeout {
                        provider: candidate.name().to_string(),
                        after: self.timeout,
                    })
                });

            match outcome {
                Ok(()) => {
                    info!(link, dest, %link_type, download_provider = candidate.name(), "Download task accepted");
                    return Ok(());
                }
                Err(e) => {
                    warn!(link, %link_type, download_provider = candidate.name(), error = %e, "Download provider failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(DownloadError::NoProvider(link_type)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Provider;
    use std::sync::Mutex;

    struct RecordingProvider {
        name: &'static str,
        enabled: bool,
        supported: LinkType,
        fail: bool,
        delay: Option<Duration>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingProvider {
        fn new(name: &'static str, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                enabled: true,
                supported: LinkType::General,
                fail: false,
                delay: None,
                calls: calls.clone(),
            }
        }
    }

    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }
    }

    #[async_trait]
    impl DownloadProvider for RecordingProvider {
        fn supports(&self, link_type: LinkType) -> bool {
            link_type == self.supported
        }

        async fn send_task(&self, _link: &str, _dest: &str, _link_type: LinkType) -> Result<(), DownloadError> {
            self.calls.lock().unwrap().push(self.name.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(DownloadError::RequestFailed(format!("{} is down", self.name)));
            }
            Ok(())
        }
    }

    fn trigger(providers: Vec<RecordingProvider>) -> DownloadTrigger {
        DownloadTrigger::new(
            providers
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn DownloadProvider>)
                .collect(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let trigger = trigger(vec![
            RecordingProvider::new("a", &calls),
            RecordingProvider::new("b", &calls),
        ]);

        trigger.download("http://x", "common/", LinkType::General, None).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_falls_through_failures_and_returns_last_error() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut a = RecordingProvider::new("a", &calls);
        a.fail = true;
        let mut b = RecordingProvider::new("b", &calls);
        b.fail = true;

        let err = trigger(vec![a, b])
            .download("http://x", "common/", LinkType::General, None)
            .await
            .unwrap_err();

        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(err.to_string(), "HTTP request failed: b is down");
    }

    #[tokio::test]
    async fn test_skips_disabled_and_unsupported() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut disabled = RecordingProvider::new("disabled", &calls);
        disabled.enabled = false;
        let mut magnet_only = RecordingProvider::new("magnet", &calls);
        magnet_only.supported = LinkType::Magnet;

        let err = trigger(vec![disabled, magnet_only])
            .download("http://x", "common/", LinkType::General, None)
            .await
            .unwrap_err();

        assert!(calls.lock().unwrap().is_empty());
        assert!(matches!(err, DownloadError::NoProvider(LinkType::General)));
    }

    #[tokio::test]
    async fn test_timeout_bounds_stalled_provider() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut slow = RecordingProvider::new("slow", &calls);
        slow.delay = Some(Duration::from_secs(5));

        let err = trigger(vec![slow])
            .download("http://x", "common/", LinkType::General, None)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Timeout { .. }));
    }

    #[test]
    fn test_preferred_provider_goes_first() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let trigger = trigger(vec![
            RecordingProvider::new("a", &calls),
            RecordingProvider::new("b", &calls),
            RecordingProvider::new("c", &calls),
        ]);

        let order: Vec<_> = trigger
            .candidates(LinkType::General, Some("c"))
            .into_iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(order, vec!["c", "a", "b"]);

        let order: Vec<_> = trigger
            .candidates(LinkType::General, Some("unknown"))
            .into_iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
