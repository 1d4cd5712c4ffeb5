//! Periodic server
//!
//! Runs every enabled persistent source provider on a fixed interval and on
//! demand. Demand signals are coalesced: any number of `trigger_run` calls
//! while a run is pending or in progress result in one extra run.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::download::{DownloadExecutor, PathConvention};
use crate::providers::{ListenType, ProviderRegistry};

/// "Run now" signal consumed by the dispatcher
pub trait Scheduler: Send + Sync {
    /// Fire-and-forget; must return immediately
    fn trigger_run(&self);
}

/// Outcome counters of one scheduled run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub providers: usize,
    pub links: usize,
    pub failed: usize,
}

pub struct PeriodServer {
    registry: Arc<ProviderRegistry>,
    executor: Arc<dyn DownloadExecutor>,
    paths: PathConvention,
    interval: Duration,
    wakeup: Notify,
    runs: AtomicU64,
}

impl PeriodServer {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        executor: Arc<dyn DownloadExecutor>,
        paths: PathConvention,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            executor,
            paths,
            interval,
            wakeup: Notify::new(),
            runs: AtomicU64::new(0),
        }
    }

    /// Number of completed runs
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Spawn the run loop on the current runtime
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_forever().await })
    }

    async fn run_forever(&self) {
        info!(interval = ?self.interval, "Periodic server started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => debug!("Periodic run due"),
                _ = self.wakeup.notified() => debug!("Periodic run triggered"),
            }
            self.run_once().await;
        }
    }

    /// Download the scheduled links of every enabled persistent provider
    ///
    /// Failures are logged and do not stop the run. Only links that downloaded
    /// are marked on their provider, so failed ones come back on the next run.
    pub async fn run_once(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for provider in self.registry.enabled_source_providers() {
            if provider.listen_type() != ListenType::Persistent {
                continue;
            }
            summary.providers += 1;

            let links = match provider.scheduled_links().await {
                Ok(links) => links,
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Scheduled link extraction failed");
                    summary.failed += 1;
                    continue;
                }
            };

            for descriptor in links {
                let dest = self.paths.destination(descriptor.file_type, &descriptor.path);
                summary.links += 1;
                match self
                    .executor
                    .download(&descriptor.link, &dest, provider.link_type(), Some(provider.as_ref()))
                    .await
                {
                    Ok(()) => {
                        if let Err(e) = provider.mark_downloaded(&descriptor.link).await {
                            warn!(provider = provider.name(), link = %descriptor.link, error = %e, "Failed to record download");
                        }
                    }
                    Err(e) => {
                        warn!(provider = provider.name(), link = %descriptor.link, error = %e, "Scheduled download failed");
                        summary.failed += 1;
                    }
                }
            }
        }

        self.runs.fetch_add(1, Ordering::Relaxed);
        info!(
            providers = summary.providers,
            links = summary.links,
            failed = summary.failed,
            "Periodic run finished"
        );
        summary
    }
}

impl Scheduler for PeriodServer {
    fn trigger_run(&self) {
        // notify_one keeps at most one permit, which coalesces bursts
        self.wakeup.notify_one();
    }
}
