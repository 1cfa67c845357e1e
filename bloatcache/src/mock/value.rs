use crate::cache::cache::ValueType;
use bytes::Bytes;

pub fn from_string(val: &str) -> ValueType {
    from_slice(val.as_bytes())
}

pub fn from_slice(val: &[u8]) -> ValueType {
    Bytes::copy_from_slice(val)
}

/// Decimal text of `number`, the way counters are stored
pub fn from_number(number: u64) -> ValueType {
    Bytes::from(number.to_string())
}
