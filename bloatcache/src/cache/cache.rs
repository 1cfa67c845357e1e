use super::error::Result;
use bytes::Bytes;

/// Cache key type
pub type KeyType = Bytes;

/// Cache value associated with a key
pub type ValueType = Bytes;

/// Expiration as sent by a client.
///
/// - `0` never expires
/// - `1..=RELATIVE_EXPIRATION_LIMIT` seconds from now
/// - above `RELATIVE_EXPIRATION_LIMIT` absolute unix time
/// - negative values expire immediately
pub type ExpirationType = i64;

/// Longest relative expiration, 30 days in seconds
pub const RELATIVE_EXPIRATION_LIMIT: ExpirationType = 60 * 60 * 24 * 30;

/// Deadline stored for records that expired on arrival
pub const EXPIRED_DEADLINE: ExpirationType = -1;

pub const MAX_KEY_LENGTH: usize = 250;

/// A key is 1..=250 bytes and carries no space, CR or LF.
pub fn is_valid_key(key: &[u8]) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && !key.iter().any(|byte| matches!(byte, b' ' | b'\r' | b'\n'))
}

#[derive(Clone, Copy, Debug)]
pub struct DeltaParam {
    pub(crate) delta: u64,
}

pub type IncrementParam = DeltaParam;
pub type DecrementParam = IncrementParam;

/// New counter value and its CAS
#[derive(Debug)]
pub struct DeltaResult {
    pub cas: u64,
    pub value: u64,
}

/// Meta data stored with cache value
///
/// `time_to_live` holds the client expiration on records handed to the
/// store and the absolute deadline (unix seconds, 0 for never) on records
/// held by the store.
#[derive(Clone, Debug)]
pub struct CacheMetaData {
    pub(crate) cas: u64,
    pub(crate) flags: u32,
    pub(crate) time_to_live: ExpirationType,
}

impl CacheMetaData {
    pub fn new(cas: u64, flags: u32, time_to_live: ExpirationType) -> CacheMetaData {
        CacheMetaData {
            cas,
            flags,
            time_to_live,
        }
    }
}

/// Value and meta data stored in cache
#[derive(Clone, Debug)]
pub struct Record {
    pub(crate) header: CacheMetaData,
    pub(crate) value: ValueType,
}

impl Record {
    pub fn new(value: ValueType, cas: u64, flags: u32, expiration: ExpirationType) -> Record {
        let header = CacheMetaData::new(cas, flags, expiration);
        Record { header, value }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Result of set operation on cache
/// cas indicates version stored in cache
#[derive(Debug)]
pub struct SetStatus {
    pub cas: u64,
}

// An abstraction over a generic store key <=> value store
//
// Every operation is atomic with respect to other operations on the same
// key. Expired records are treated as absent by every operation.
pub trait Cache {
    /// Returns a live record associated with a key
    fn get(&self, key: &KeyType) -> Result<Record>;

    /// Replaces the deadline of a live record and returns the updated record.
    fn get_and_touch(&self, key: &KeyType, expiration: ExpirationType) -> Result<Record>;

    /// Unconditionally stores a record, a new CAS value is assigned.
    fn set(&self, key: KeyType, record: Record) -> Result<SetStatus>;

    /// Adds a new key-value pair to the cache, but only if the key does not already exist.
    /// If the key exists, the operation fails with KeyExists error.
    fn add(&self, key: KeyType, record: Record) -> Result<SetStatus>;

    /// Replaces the value of an existing key in the cache, but only if the key already exists.
    /// If the key does not exist, the operation fails with NotFound error.
    fn replace(&self, key: KeyType, record: Record) -> Result<SetStatus>;

    /// Appends the new value to the existing value for the given key.
    /// Flags and expiration of the existing record are kept.
    /// The key must already exist in the cache, otherwise the operation fails with NotFound error.
    fn append(&self, key: KeyType, new_record: Record) -> Result<SetStatus>;

    /// Prepends the new value to the existing value for the given key.
    /// Flags and expiration of the existing record are kept.
    /// The key must already exist in the cache, otherwise the operation fails with NotFound error.
    fn prepend(&self, key: KeyType, new_record: Record) -> Result<SetStatus>;

    /// Stores a record only if the current CAS value of the key equals `cas`.
    ///
    /// - if key is not found NotFound is returned
    /// - if CAS values differ KeyExists is returned
    fn compare_and_swap(&self, key: KeyType, record: Record, cas: u64) -> Result<SetStatus>;

    /// Removes a value associated with a key and returns it to a caller.
    /// If key is not found NotFound is returned.
    fn delete(&self, key: KeyType) -> Result<Record>;

    /// Replaces the deadline of a record without touching its value.
    fn touch(&self, key: KeyType, expiration: ExpirationType) -> Result<()>;

    /// Performs an arithmetic operation (increment or decrement) on a numeric value stored in the cache.
    /// If `increment` is true, adds `delta` to the value wrapping at 2^64; otherwise, subtracts `delta`
    /// saturating at 0. The value must be a valid unsigned 64-bit decimal integer.
    /// Returns the new value after the operation.
    fn incr_decr(&self, key: KeyType, delta: DeltaParam, increment: bool) -> Result<DeltaResult>;

    /// Removes expired records, will be scheduled periodically
    fn run_pending_tasks(&self);

    /// Number of records physically held, expired ones included
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
