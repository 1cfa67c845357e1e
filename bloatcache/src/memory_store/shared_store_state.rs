use crate::cache::cache::{
    DeltaParam, ExpirationType, Record, EXPIRED_DEADLINE, RELATIVE_EXPIRATION_LIMIT,
};
use crate::cache::error::{CacheError, Result};
use crate::server::timer::Timer;
use std::sync::atomic::Ordering;
use std::sync::{atomic::AtomicU64, Arc};

/// Longest decimal representation of u64
const MAX_U64_DIGITS: usize = 20;

/// State shared by every shard of a store: the clock and the CAS sequence.
///
/// CAS values come from a single process wide sequence, so a value is
/// never handed out twice, not even to a key that was deleted and
/// created again.
pub struct SharedStoreState {
    timer: Arc<dyn Timer + Send + Sync>,
    cas_id: AtomicU64,
}

impl SharedStoreState {
    pub fn new(timer: Arc<dyn Timer + Send + Sync>) -> SharedStoreState {
        SharedStoreState {
            timer,
            cas_id: AtomicU64::new(1),
        }
    }

    /// Assigns a fresh CAS value and turns the client expiration into
    /// an absolute deadline.
    pub fn set_cas_ttl(&self, record: &mut Record) -> u64 {
        record.header.cas = self.get_cas_id();
        record.header.time_to_live = self.deadline(record.header.time_to_live);
        record.header.cas
    }

    /// Assigns a fresh CAS value, the deadline is left as it is.
    pub fn set_cas(&self, record: &mut Record) -> u64 {
        record.header.cas = self.get_cas_id();
        record.header.cas
    }

    /// Converts a client expiration into an absolute deadline in unix seconds.
    pub fn deadline(&self, expiration: ExpirationType) -> ExpirationType {
        match expiration {
            0 => 0,
            exp if exp < 0 => EXPIRED_DEADLINE,
            exp if exp <= RELATIVE_EXPIRATION_LIMIT => self.timestamp() as ExpirationType + exp,
            exp => exp,
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timer.timestamp()
    }

    pub fn get_cas_id(&self) -> u64 {
        self.cas_id.fetch_add(1, Ordering::AcqRel)
    }

    /// Parses the record's value as a u64 and applies the delta. Increment
    /// wraps around at 2^64, decrement stops at 0. Fails if the value is
    /// not a plain unsigned decimal.
    pub fn incr_decr_common(
        &self,
        record: &Record,
        delta: DeltaParam,
        increment: bool,
    ) -> Result<u64> {
        let value = &record.value;
        if value.is_empty()
            || value.len() > MAX_U64_DIGITS
            || !value.iter().all(u8::is_ascii_digit)
        {
            return Err(CacheError::ArithOnNonNumeric);
        }

        std::str::from_utf8(value)
            .map_err(|_err| CacheError::ArithOnNonNumeric)
            .and_then(|value: &str| {
                value
                    .parse::<u64>()
                    .map_err(|_err| CacheError::ArithOnNonNumeric)
            })
            .map(|value: u64| {
                if increment {
                    value.wrapping_add(delta.delta)
                } else {
                    value.saturating_sub(delta.delta)
                }
            })
    }

    pub fn check_if_expired(&self, record: &Record) -> bool {
        let deadline = record.header.time_to_live;
        if deadline == 0 {
            return false;
        }

        if deadline > self.timestamp() as ExpirationType {
            return false;
        }
        true
    }
}
