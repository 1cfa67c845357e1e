use crate::cache::cache::Cache;
use crate::memcache::store::MemcStore;
use crate::memory_store::dash_map_store::{DashMapConfig, DashMapMemoryStore};
use crate::server::timer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Time every mock clock starts at, any plausible unix timestamp
/// above the relative expiration limit will do.
pub const MOCK_START_TIME: u64 = 1_700_000_000;

pub struct MockSystemTimer {
    pub current_time: AtomicU64,
}

pub trait SetableTimer: timer::Timer {
    fn set(&self, time: u64);
    fn add_seconds(&self, seconds: u64);
}

impl MockSystemTimer {
    pub fn new() -> Self {
        MockSystemTimer {
            current_time: AtomicU64::new(MOCK_START_TIME),
        }
    }
}

impl Default for MockSystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl timer::Timer for MockSystemTimer {
    fn timestamp(&self) -> u64 {
        self.current_time.load(Ordering::Acquire)
    }
}

impl SetableTimer for MockSystemTimer {
    fn set(&self, time: u64) {
        self.current_time.store(time, Ordering::Release)
    }

    fn add_seconds(&self, seconds: u64) {
        self.current_time.fetch_add(seconds, Ordering::AcqRel);
    }
}

pub struct MockServer {
    pub timer: Arc<MockSystemTimer>,
    pub storage: MemcStore,
    pub store: Arc<dyn Cache + Send + Sync>,
}

impl MockServer {
    pub fn new(store: Arc<dyn Cache + Send + Sync>, timer: Arc<MockSystemTimer>) -> Self {
        MockServer {
            timer,
            storage: MemcStore::new(store.clone()),
            store,
        }
    }
}

pub fn create_dash_map_server() -> MockServer {
    let timer = Arc::new(MockSystemTimer::new());
    let config = DashMapConfig::default();
    MockServer::new(
        Arc::new(DashMapMemoryStore::new(timer.clone(), config)),
        timer,
    )
}

pub struct StoreWithMockTimer {
    pub timer: Arc<MockSystemTimer>,
    pub memc_store: Arc<MemcStore>,
}

pub fn create_dash_map_storage() -> StoreWithMockTimer {
    let timer = Arc::new(MockSystemTimer::new());
    let config = DashMapConfig::default();
    let memc_store = Arc::new(MemcStore::new(Arc::new(DashMapMemoryStore::new(
        timer.clone(),
        config,
    ))));
    StoreWithMockTimer { timer, memc_store }
}
