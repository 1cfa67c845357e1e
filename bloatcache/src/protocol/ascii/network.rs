use bytes::Bytes;

pub const CRLF: &[u8] = b"\r\n";
pub const NOREPLY: &[u8] = b"noreply";

/// Longest command line accepted without a terminator
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
    Cas,
    Get,
    Gets,
    Gat,
    Gats,
    Delete,
    Touch,
    Increment,
    Decrement,
    Version,
}

impl Command {
    pub fn from_name(name: &[u8]) -> Option<Command> {
        let command = match name {
            b"set" => Command::Set,
            b"add" => Command::Add,
            b"replace" => Command::Replace,
            b"append" => Command::Append,
            b"prepend" => Command::Prepend,
            b"cas" => Command::Cas,
            b"get" => Command::Get,
            b"gets" => Command::Gets,
            b"gat" => Command::Gat,
            b"gats" => Command::Gats,
            b"delete" => Command::Delete,
            b"touch" => Command::Touch,
            b"incr" => Command::Increment,
            b"decr" => Command::Decrement,
            b"version" => Command::Version,
            _ => return None,
        };
        Some(command)
    }
}

/// set, add, replace, append and prepend
#[derive(Debug, Clone)]
pub struct StorageRequest {
    pub key: Bytes,
    pub flags: u32,
    pub exptime: i64,
    pub value: Bytes,
    pub noreply: bool,
}

#[derive(Debug, Clone)]
pub struct CasRequest {
    pub key: Bytes,
    pub flags: u32,
    pub exptime: i64,
    pub cas: u64,
    pub value: Bytes,
    pub noreply: bool,
}

/// get and gets
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub keys: Vec<Bytes>,
}

/// gat and gats
#[derive(Debug, Clone)]
pub struct GetAndTouchRequest {
    pub exptime: i64,
    pub keys: Vec<Bytes>,
}

#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub key: Bytes,
    pub noreply: bool,
}

#[derive(Debug, Clone)]
pub struct TouchRequest {
    pub key: Bytes,
    pub exptime: i64,
    pub noreply: bool,
}

/// incr and decr
#[derive(Debug, Clone)]
pub struct DeltaRequest {
    pub key: Bytes,
    pub delta: u64,
    pub noreply: bool,
}

/// Storage command whose data block exceeds the item size limit.
/// The block itself is discarded by the decoder.
#[derive(Debug, Clone)]
pub struct ItemTooLargeRequest {
    pub key: Bytes,
    pub bytes: u64,
}

/// Single hit of a retrieval command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueResponse {
    pub key: Bytes,
    pub flags: u32,
    pub cas: u64,
    pub value: Bytes,
}

/// Hits of a retrieval command in request order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalResponse {
    pub values: Vec<ValueResponse>,
    pub with_cas: bool,
}
