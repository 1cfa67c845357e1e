use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cache::{cache::Cache, pending_tasks_runner::PendingTasksRunner};
use crate::memcache::builder::{MemcacheStoreBuilder, MemcacheStoreConfig};
use crate::memcache::cli::parser::BloatcachedConfig;
use crate::memory_store::parallelism::get_number_of_shards;
use crate::server::timer::SystemTimer;

/// State shared by every runtime of one server: the store, the clock
/// that drives expiration, the sweeper and the token that stops them all.
pub struct ServerContext {
    cancellation_token: CancellationToken,
    system_timer: Arc<SystemTimer>,
    store: Arc<dyn Cache + Send + Sync>,
    pending_tasks_runner: Arc<PendingTasksRunner>,
}

impl ServerContext {
    /// Sizes the store for the configured worker threads and item size.
    pub fn from_config(config: &BloatcachedConfig) -> Self {
        let store_config = MemcacheStoreConfig::new()
            .with_shards(get_number_of_shards(config.threads))
            .with_item_size_limit(config.item_size_limit);
        Self::with_store_config(store_config, config.sweep_interval_ms)
    }

    pub fn with_store_config(store_config: MemcacheStoreConfig, sweep_interval_ms: u64) -> Self {
        let cancellation_token = CancellationToken::new();
        let system_timer = Arc::new(SystemTimer::new(cancellation_token.clone()));
        let store = MemcacheStoreBuilder::from_config(store_config, system_timer.clone());
        let pending_tasks_runner = Arc::new(PendingTasksRunner::new(
            Arc::clone(&store),
            cancellation_token.clone(),
            sweep_interval_ms,
        ));
        ServerContext {
            cancellation_token,
            system_timer,
            store,
            pending_tasks_runner,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Stops the listeners, the clock and the sweeper.
    pub fn shutdown(&self) {
        self.cancellation_token.cancel();
    }

    pub fn system_timer(&self) -> Arc<SystemTimer> {
        Arc::clone(&self.system_timer)
    }

    pub fn store(&self) -> Arc<dyn Cache + Send + Sync> {
        Arc::clone(&self.store)
    }

    pub fn pending_tasks_runner(&self) -> Arc<PendingTasksRunner> {
        Arc::clone(&self.pending_tasks_runner)
    }
}
