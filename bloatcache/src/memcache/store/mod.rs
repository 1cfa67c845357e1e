use crate::cache::cache::{Cache, DeltaParam, DeltaResult, ExpirationType};
use crate::cache::error::Result;
use std::sync::Arc;

pub use crate::cache::cache::{DecrementParam, IncrementParam, KeyType, Record, SetStatus};

/// Memcached command semantics on top of a [`Cache`].
pub struct MemcStore {
    store: Arc<dyn Cache + Send + Sync>,
}

impl MemcStore {
    pub fn new(store: Arc<dyn Cache + Send + Sync>) -> MemcStore {
        MemcStore { store }
    }

    pub fn set(&self, key: KeyType, record: Record) -> Result<SetStatus> {
        self.store.set(key, record)
    }

    pub fn get(&self, key: &KeyType) -> Result<Record> {
        self.store.get(key)
    }

    /// Live records for `keys`, in request order. Missing and expired
    /// keys are left out, a key asked for twice is returned twice.
    pub fn get_many(&self, keys: Vec<KeyType>) -> Vec<(KeyType, Record)> {
        keys.into_iter()
            .filter_map(|key| self.store.get(&key).ok().map(|record| (key, record)))
            .collect()
    }

    /// Same as [`MemcStore::get_many`], every record found also gets the
    /// new expiration.
    pub fn get_and_touch_many(
        &self,
        keys: Vec<KeyType>,
        expiration: ExpirationType,
    ) -> Vec<(KeyType, Record)> {
        keys.into_iter()
            .filter_map(|key| {
                self.store
                    .get_and_touch(&key, expiration)
                    .ok()
                    .map(|record| (key, record))
            })
            .collect()
    }

    pub fn add(&self, key: KeyType, record: Record) -> Result<SetStatus> {
        self.store.add(key, record)
    }

    pub fn replace(&self, key: KeyType, record: Record) -> Result<SetStatus> {
        self.store.replace(key, record)
    }

    /// Only the data of `suffix` is used, flags and expiration stay.
    pub fn append(&self, key: KeyType, suffix: Record) -> Result<SetStatus> {
        self.store.append(key, suffix)
    }

    /// Only the data of `prefix` is used, flags and expiration stay.
    pub fn prepend(&self, key: KeyType, prefix: Record) -> Result<SetStatus> {
        self.store.prepend(key, prefix)
    }

    pub fn compare_and_swap(&self, key: KeyType, record: Record, cas: u64) -> Result<SetStatus> {
        self.store.compare_and_swap(key, record, cas)
    }

    pub fn increment(&self, key: KeyType, increment: IncrementParam) -> Result<DeltaResult> {
        self.apply_delta(key, increment, true)
    }

    pub fn decrement(&self, key: KeyType, decrement: DecrementParam) -> Result<DeltaResult> {
        self.apply_delta(key, decrement, false)
    }

    fn apply_delta(&self, key: KeyType, delta: DeltaParam, increment: bool) -> Result<DeltaResult> {
        self.store.incr_decr(key, delta, increment)
    }

    pub fn delete(&self, key: KeyType) -> Result<Record> {
        self.store.delete(key)
    }

    pub fn touch(&self, key: KeyType, expiration: ExpirationType) -> Result<()> {
        self.store.touch(key, expiration)
    }
}

#[cfg(test)]
mod append_prepend_tests;
