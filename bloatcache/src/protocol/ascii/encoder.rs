use crate::cache::error::CacheError;
use crate::protocol::ascii::network::{RetrievalResponse, ValueResponse, CRLF};
use bytes::{BufMut, Bytes, BytesMut};

/// Server response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsciiResponse {
    Stored,
    NotStored,
    Exists,
    NotFound,
    Deleted,
    Touched,
    /// `VALUE` lines followed by `END`
    Values(RetrievalResponse),
    /// New value of incr/decr
    Number(u64),
    Error,
    ClientError(&'static str),
    ServerError(&'static str),
    Version(&'static str),
}

impl AsciiResponse {
    fn status_line(&self) -> &'static [u8] {
        match self {
            AsciiResponse::Stored => b"STORED\r\n",
            AsciiResponse::NotStored => b"NOT_STORED\r\n",
            AsciiResponse::Exists => b"EXISTS\r\n",
            AsciiResponse::NotFound => b"NOT_FOUND\r\n",
            AsciiResponse::Deleted => b"DELETED\r\n",
            AsciiResponse::Touched => b"TOUCHED\r\n",
            AsciiResponse::Values(_) => b"END\r\n",
            AsciiResponse::Error => b"ERROR\r\n",
            AsciiResponse::ClientError(_) => b"CLIENT_ERROR ",
            AsciiResponse::ServerError(_) => b"SERVER_ERROR ",
            AsciiResponse::Version(_) => b"VERSION ",
            AsciiResponse::Number(_) => b"",
        }
    }
}

pub fn storage_error_to_response(err: CacheError) -> AsciiResponse {
    match err {
        CacheError::NotFound => AsciiResponse::NotFound,
        CacheError::KeyExists => AsciiResponse::Exists,
        CacheError::ArithOnNonNumeric => AsciiResponse::ClientError(err.to_static_string()),
        CacheError::ValueTooLarge => AsciiResponse::ServerError(err.to_static_string()),
    }
}

pub struct ResponseMessage {
    pub(crate) data: Bytes,
}

pub struct MemcacheAsciiEncoder {}

impl Default for MemcacheAsciiEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemcacheAsciiEncoder {
    const VALUE_PREFIX: &'static [u8] = b"VALUE ";
    /// Longest decimal representation of u64
    const MAX_NUMBER_LENGTH: usize = 20;

    pub fn new() -> MemcacheAsciiEncoder {
        MemcacheAsciiEncoder {}
    }

    pub fn encode_message(&self, msg: &AsciiResponse) -> ResponseMessage {
        let mut dst = BytesMut::with_capacity(self.get_length(msg));
        match msg {
            AsciiResponse::Values(response) => {
                for value in &response.values {
                    self.encode_value(value, response.with_cas, &mut dst);
                }
                dst.put_slice(msg.status_line());
            }
            AsciiResponse::Number(value) => {
                dst.put_slice(value.to_string().as_bytes());
                dst.put_slice(CRLF);
            }
            AsciiResponse::ClientError(message)
            | AsciiResponse::ServerError(message)
            | AsciiResponse::Version(message) => {
                dst.put_slice(msg.status_line());
                dst.put_slice(message.as_bytes());
                dst.put_slice(CRLF);
            }
            _ => dst.put_slice(msg.status_line()),
        }
        ResponseMessage { data: dst.freeze() }
    }

    fn encode_value(&self, value: &ValueResponse, with_cas: bool, dst: &mut BytesMut) {
        dst.put_slice(Self::VALUE_PREFIX);
        dst.put_slice(&value.key);
        dst.put_u8(b' ');
        dst.put_slice(value.flags.to_string().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(value.value.len().to_string().as_bytes());
        if with_cas {
            dst.put_u8(b' ');
            dst.put_slice(value.cas.to_string().as_bytes());
        }
        dst.put_slice(CRLF);
        dst.put_slice(&value.value);
        dst.put_slice(CRLF);
    }

    /// Upper bound of the encoded size
    fn get_length(&self, msg: &AsciiResponse) -> usize {
        let status_length = msg.status_line().len();
        match msg {
            AsciiResponse::Values(response) => {
                let values_length: usize = response
                    .values
                    .iter()
                    .map(|value| {
                        Self::VALUE_PREFIX.len()
                            + value.key.len()
                            + 3 * (Self::MAX_NUMBER_LENGTH + 1)
                            + value.value.len()
                            + 2 * CRLF.len()
                    })
                    .sum();
                values_length + status_length
            }
            AsciiResponse::Number(_) => Self::MAX_NUMBER_LENGTH + CRLF.len(),
            AsciiResponse::ClientError(message)
            | AsciiResponse::ServerError(message)
            | AsciiResponse::Version(message) => {
                status_length + message.len() + CRLF.len()
            }
            _ => status_length,
        }
    }
}
