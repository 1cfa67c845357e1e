use crate::cache::cache::Cache;
use crate::memory_store::dash_map_store::{DashMapConfig, DashMapMemoryStore};
use crate::memory_store::parallelism::normalize_shards;
use crate::server::timer;
use std::sync::Arc;

pub struct MemcacheStoreConfig {
    shards: Option<usize>,
    item_size_limit: Option<u64>,
}

impl MemcacheStoreConfig {
    pub fn new() -> MemcacheStoreConfig {
        MemcacheStoreConfig {
            shards: None,
            item_size_limit: None,
        }
    }

    /// Caps the size append and prepend may grow a value to
    pub fn with_item_size_limit(mut self, item_size_limit: u64) -> MemcacheStoreConfig {
        self.item_size_limit = Some(item_size_limit);
        self
    }

    /// Overrides the shard count derived from available parallelism,
    /// rounded to a power of two
    pub fn with_shards(mut self, shards: usize) -> MemcacheStoreConfig {
        self.shards = Some(shards);
        self
    }
}

impl Default for MemcacheStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MemcacheStoreBuilder {}

impl MemcacheStoreBuilder {
    pub fn from_config(
        config: MemcacheStoreConfig,
        timer: Arc<dyn timer::Timer + Send + Sync>,
    ) -> Arc<dyn Cache + Send + Sync> {
        let mut dash_map_config = DashMapConfig::default();
        if let Some(shards) = config.shards {
            dash_map_config.shards = normalize_shards(shards);
        }
        if let Some(item_size_limit) = config.item_size_limit {
            dash_map_config.item_size_limit = item_size_limit;
        }
        Arc::new(DashMapMemoryStore::new(timer, dash_map_config))
    }
}
