use std::sync::Arc;

use crate::cache::CacheClient;
use crate::config::ServiceConfig;
use crate::instance::InstanceReporter;
use crate::service::CounterService;

/// Server state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub counter: Arc<CounterService>,
    pub reporter: Arc<InstanceReporter>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(config: ServiceConfig, cache: Arc<CacheClient>) -> Self {
        let counter = CounterService::new(
            cache,
            config.cache.counter_key.clone(),
            config.cache.counter_ttl,
        );

        Self {
            counter: Arc::new(counter),
            reporter: Arc::new(InstanceReporter::new(config.port)),
            config: Arc::new(config),
        }
    }

    pub fn cache(&self) -> &Arc<CacheClient> {
        self.counter.cache()
    }
}
