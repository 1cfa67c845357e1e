use crate::cache::cache::{
    Cache, DeltaParam, DeltaResult, ExpirationType, KeyType, Record, SetStatus,
};
use crate::cache::error::{CacheError, Result};
use crate::memory_store::parallelism::get_number_of_shards;
use crate::memory_store::shared_store_state::SharedStoreState;
use crate::server::timer;

use bytes::{Bytes, BytesMut};
use dashmap::mapref::entry::{Entry, OccupiedEntry};
use dashmap::DashMap;
use log::info;
use std::sync::Arc;

type Storage = DashMap<KeyType, Record>;

#[derive(Clone, Copy, Debug)]
pub struct DashMapConfig {
    pub shards: usize,
    /// Longest value append and prepend may grow a record to
    pub item_size_limit: u64,
}

impl Default for DashMapConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism().map_or(1, usize::from);
        DashMapConfig {
            shards: get_number_of_shards(parallelism),
            item_size_limit: u64::MAX,
        }
    }
}

/// Store backed by a sharded map. Every compound operation keeps the
/// shard of its key write locked from the read to the write.
pub struct DashMapMemoryStore {
    memory: Storage,
    store_state: SharedStoreState,
    item_size_limit: u64,
}

impl DashMapMemoryStore {
    pub fn new(
        timer: Arc<dyn timer::Timer + Send + Sync>,
        config: DashMapConfig,
    ) -> DashMapMemoryStore {
        info!("Number of shards: {}", config.shards);
        let store_state = SharedStoreState::new(timer);
        DashMapMemoryStore {
            memory: DashMap::with_shard_amount(config.shards),
            store_state,
            item_size_limit: config.item_size_limit,
        }
    }

    /// Returns the occupied entry if its record is still alive, an
    /// expired record is removed and reported as missing.
    fn live_entry<'a>(
        &self,
        entry: Entry<'a, KeyType, Record>,
    ) -> Option<OccupiedEntry<'a, KeyType, Record>> {
        match entry {
            Entry::Occupied(entry) => {
                if self.store_state.check_if_expired(entry.get()) {
                    entry.remove();
                    return None;
                }
                Some(entry)
            }
            Entry::Vacant(_) => None,
        }
    }

    fn append_prepend_common(
        &self,
        key: KeyType,
        new_record: Record,
        is_append: bool,
    ) -> Result<SetStatus> {
        let mut entry = self
            .live_entry(self.memory.entry(key))
            .ok_or(CacheError::NotFound)?;

        let prev_record = entry.get_mut();
        let combined_length = prev_record.value.len() + new_record.value.len();
        if combined_length as u64 > self.item_size_limit {
            return Err(CacheError::ValueTooLarge);
        }
        let mut new_value = BytesMut::with_capacity(combined_length);
        if is_append {
            new_value.extend_from_slice(&prev_record.value);
            new_value.extend_from_slice(&new_record.value);
        } else {
            new_value.extend_from_slice(&new_record.value);
            new_value.extend_from_slice(&prev_record.value);
        }
        prev_record.value = new_value.freeze();
        let cas = self.store_state.set_cas(prev_record);
        Ok(SetStatus { cas })
    }
}

impl Cache for DashMapMemoryStore {
    fn get(&self, key: &KeyType) -> Result<Record> {
        let expired = match self.memory.get(key) {
            Some(record) => {
                if !self.store_state.check_if_expired(record.value()) {
                    return Ok(record.value().clone());
                }
                true
            }
            None => false,
        };

        if expired {
            // read guard is gone, check again under the write lock
            self.memory
                .remove_if(key, |_key, record| self.store_state.check_if_expired(record));
        }
        Err(CacheError::NotFound)
    }

    fn get_and_touch(&self, key: &KeyType, expiration: ExpirationType) -> Result<Record> {
        let mut entry = self
            .live_entry(self.memory.entry(key.clone()))
            .ok_or(CacheError::NotFound)?;
        let record = entry.get_mut();
        record.header.time_to_live = self.store_state.deadline(expiration);
        Ok(record.clone())
    }

    fn set(&self, key: KeyType, mut record: Record) -> Result<SetStatus> {
        // the CAS is taken under the shard lock, so writers of one key
        // store their values in CAS order
        let entry = self.memory.entry(key);
        let cas = self.store_state.set_cas_ttl(&mut record);
        entry.insert(record);
        Ok(SetStatus { cas })
    }

    fn add(&self, key: KeyType, mut record: Record) -> Result<SetStatus> {
        match self.memory.entry(key) {
            Entry::Occupied(mut entry) => {
                if !self.store_state.check_if_expired(entry.get()) {
                    return Err(CacheError::KeyExists);
                }
                let cas = self.store_state.set_cas_ttl(&mut record);
                entry.insert(record);
                Ok(SetStatus { cas })
            }
            Entry::Vacant(entry) => {
                let cas = self.store_state.set_cas_ttl(&mut record);
                entry.insert(record);
                Ok(SetStatus { cas })
            }
        }
    }

    fn replace(&self, key: KeyType, mut record: Record) -> Result<SetStatus> {
        let mut entry = self
            .live_entry(self.memory.entry(key))
            .ok_or(CacheError::NotFound)?;
        let cas = self.store_state.set_cas_ttl(&mut record);
        entry.insert(record);
        Ok(SetStatus { cas })
    }

    fn append(&self, key: KeyType, new_record: Record) -> Result<SetStatus> {
        self.append_prepend_common(key, new_record, true)
    }

    fn prepend(&self, key: KeyType, new_record: Record) -> Result<SetStatus> {
        self.append_prepend_common(key, new_record, false)
    }

    fn compare_and_swap(&self, key: KeyType, mut record: Record, cas: u64) -> Result<SetStatus> {
        let mut entry = self
            .live_entry(self.memory.entry(key))
            .ok_or(CacheError::NotFound)?;
        if entry.get().header.cas != cas {
            return Err(CacheError::KeyExists);
        }
        let new_cas = self.store_state.set_cas_ttl(&mut record);
        entry.insert(record);
        Ok(SetStatus { cas: new_cas })
    }

    fn delete(&self, key: KeyType) -> Result<Record> {
        let entry = self
            .live_entry(self.memory.entry(key))
            .ok_or(CacheError::NotFound)?;
        Ok(entry.remove())
    }

    fn touch(&self, key: KeyType, expiration: ExpirationType) -> Result<()> {
        let mut entry = self
            .live_entry(self.memory.entry(key))
            .ok_or(CacheError::NotFound)?;
        entry.get_mut().header.time_to_live = self.store_state.deadline(expiration);
        Ok(())
    }

    fn incr_decr(&self, key: KeyType, delta: DeltaParam, increment: bool) -> Result<DeltaResult> {
        let mut entry = self
            .live_entry(self.memory.entry(key))
            .ok_or(CacheError::NotFound)?;
        let record = entry.get_mut();
        let new_value = self.store_state.incr_decr_common(record, delta, increment)?;
        record.value = Bytes::from(new_value.to_string());
        let cas = self.store_state.set_cas(record);
        Ok(DeltaResult {
            value: new_value,
            cas,
        })
    }

    fn run_pending_tasks(&self) {
        self.memory
            .retain(|_key, record| !self.store_state.check_if_expired(record));
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}
