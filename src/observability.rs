//! In-process counters for the webhook server

use std::sync::atomic::{AtomicU64, Ordering};

use crate::router::DispatchPath;

/// Metrics handle shared by the HTTP layer
#[derive(Debug, Default)]
pub struct Metrics {
    webhooks_received: AtomicU64,
    auth_rejected: AtomicU64,
    fallback_dispatches: AtomicU64,
    batch_dispatches: AtomicU64,
    persist_dispatches: AtomicU64,
    dispatch_failed: AtomicU64,
    scheduler_triggers: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn webhook_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "webhooks_received", "Metric incremented");
    }

    pub fn auth_rejected(&self) {
        self.auth_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "auth_rejected", "Metric incremented");
    }

    pub fn dispatched(&self, path: DispatchPath) {
        let counter = match path {
            DispatchPath::Fallback => &self.fallback_dispatches,
            DispatchPath::Batch { .. } => &self.batch_dispatches,
            DispatchPath::Persist => {
                // persist always nudges the scheduler
                self.scheduler_triggers.fetch_add(1, Ordering::Relaxed);
                &self.persist_dispatches
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = %path, "Metric incremented");
    }

    pub fn dispatch_failed(&self) {
        self.dispatch_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "dispatch_failed", "Metric incremented");
    }

    pub fn scheduler_triggered(&self) {
        self.scheduler_triggers.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "scheduler_triggers", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            auth_rejected: self.auth_rejected.load(Ordering::Relaxed),
            fallback_dispatches: self.fallback_dispatches.load(Ordering::Relaxed),
            batch_dispatches: self.batch_dispatches.load(Ordering::Relaxed),
            persist_dispatches: self.persist_dispatches.load(Ordering::Relaxed),
            dispatch_failed: self.dispatch_failed.load(Ordering::Relaxed),
            scheduler_triggers: self.scheduler_triggers.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub webhooks_received: u64,
    pub auth_rejected: u64,
    pub fallback_dispatches: u64,
    pub batch_dispatches: u64,
    pub persist_dispatches: u64,
    pub dispatch_failed: u64,
    pub scheduler_triggers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_counters() {
        let metrics = Metrics::new();
        metrics.webhook_received();
        metrics.dispatched(DispatchPath::Fallback);
        metrics.dispatched(DispatchPath::Batch { downloaded: 3 });
        metrics.dispatched(DispatchPath::Persist);
        metrics.scheduler_triggered();
        metrics.dispatch_failed();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                webhooks_received: 1,
                auth_rejected: 0,
                fallback_dispatches: 1,
                batch_dispatches: 1,
                persist_dispatches: 1,
                dispatch_failed: 1,
                scheduler_triggers: 2,
            }
        );
    }
}
