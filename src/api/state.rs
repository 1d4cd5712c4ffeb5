use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::providers::ProviderRegistry;
use crate::router::Dispatcher;
use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ProviderRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub scheduler: Arc<dyn Scheduler>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: Arc<ProviderRegistry>,
        dispatcher: Dispatcher,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            dispatcher: Arc::new(dispatcher),
            scheduler,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
