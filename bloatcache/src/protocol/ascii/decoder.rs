use crate::cache::cache::is_valid_key;
use crate::protocol::ascii::network::{
    CasRequest, Command, DeleteRequest, DeltaRequest, GetAndTouchRequest, GetRequest,
    ItemTooLargeRequest, StorageRequest, TouchRequest, CRLF, MAX_LINE_LENGTH, NOREPLY,
};
use bytes::{Buf, Bytes, BytesMut};
use log::{debug, error};
use std::io;
use std::io::{Error, ErrorKind};
use std::str::FromStr;
use tokio_util::codec::Decoder;

/// Client request
#[derive(Debug)]
pub enum AsciiRequest {
    Set(StorageRequest),
    Add(StorageRequest),
    Replace(StorageRequest),
    Append(StorageRequest),
    Prepend(StorageRequest),
    Cas(CasRequest),
    Get(GetRequest),
    Gets(GetRequest),
    Gat(GetAndTouchRequest),
    Gats(GetAndTouchRequest),
    Delete(DeleteRequest),
    Touch(TouchRequest),
    Increment(DeltaRequest),
    Decrement(DeltaRequest),
    Version,
    /// Line that does not match any command signature
    Invalid,
    ItemTooLarge(ItemTooLargeRequest),
}

impl AsciiRequest {
    pub fn command_name(&self) -> &'static str {
        match self {
            AsciiRequest::Set(_) => "set",
            AsciiRequest::Add(_) => "add",
            AsciiRequest::Replace(_) => "replace",
            AsciiRequest::Append(_) => "append",
            AsciiRequest::Prepend(_) => "prepend",
            AsciiRequest::Cas(_) => "cas",
            AsciiRequest::Get(_) => "get",
            AsciiRequest::Gets(_) => "gets",
            AsciiRequest::Gat(_) => "gat",
            AsciiRequest::Gats(_) => "gats",
            AsciiRequest::Delete(_) => "delete",
            AsciiRequest::Touch(_) => "touch",
            AsciiRequest::Increment(_) => "incr",
            AsciiRequest::Decrement(_) => "decr",
            AsciiRequest::Version => "version",
            AsciiRequest::Invalid => "invalid",
            AsciiRequest::ItemTooLarge(_) => "item_too_large",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StorageKind {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
    Cas,
}

/// Storage command line waiting for its data block
#[derive(Debug)]
struct StorageHeader {
    kind: StorageKind,
    key: Bytes,
    flags: u32,
    exptime: i64,
    bytes: u64,
    cas: u64,
    noreply: bool,
}

impl StorageHeader {
    fn into_request(self, value: Bytes) -> AsciiRequest {
        match self.kind {
            StorageKind::Set => AsciiRequest::Set(self.into_storage_request(value)),
            StorageKind::Add => AsciiRequest::Add(self.into_storage_request(value)),
            StorageKind::Replace => AsciiRequest::Replace(self.into_storage_request(value)),
            StorageKind::Append => AsciiRequest::Append(self.into_storage_request(value)),
            StorageKind::Prepend => AsciiRequest::Prepend(self.into_storage_request(value)),
            StorageKind::Cas => AsciiRequest::Cas(CasRequest {
                key: self.key,
                flags: self.flags,
                exptime: self.exptime,
                cas: self.cas,
                value,
                noreply: self.noreply,
            }),
        }
    }

    fn into_storage_request(self, value: Bytes) -> StorageRequest {
        StorageRequest {
            key: self.key,
            flags: self.flags,
            exptime: self.exptime,
            value,
            noreply: self.noreply,
        }
    }
}

#[derive(Debug, Default)]
enum RequestParserState {
    #[default]
    None,
    DataPending(StorageHeader),
    /// Bytes of an oversized data block (CRLF included) still to discard
    Skipping(u64),
}

enum Line {
    Command(Bytes),
    BadTerminator,
}

/// Splits the input into command lines and data blocks.
///
/// A line ends at the first LF which must be preceded by CR. A data
/// block is exactly the declared number of bytes followed by CRLF.
pub struct MemcacheAsciiDecoder {
    item_size_limit: u64,
    state: RequestParserState,
}

impl MemcacheAsciiDecoder {
    pub fn new(item_size_limit: u64) -> MemcacheAsciiDecoder {
        MemcacheAsciiDecoder {
            item_size_limit,
            state: RequestParserState::None,
        }
    }

    /// True when no request is partially decoded
    pub fn is_idle(&self) -> bool {
        matches!(self.state, RequestParserState::None)
    }

    fn parse_line(&mut self, line: Bytes) -> Option<AsciiRequest> {
        let tokens = tokenize(&line);
        let command = match tokens.first().and_then(|name| Command::from_name(name)) {
            Some(command) => command,
            None => {
                debug!("Unknown command: {:?}", line);
                return Some(AsciiRequest::Invalid);
            }
        };

        let args = &tokens[1..];
        let kind = match command {
            Command::Set => Some(StorageKind::Set),
            Command::Add => Some(StorageKind::Add),
            Command::Replace => Some(StorageKind::Replace),
            Command::Append => Some(StorageKind::Append),
            Command::Prepend => Some(StorageKind::Prepend),
            Command::Cas => Some(StorageKind::Cas),
            _ => None,
        };
        if let Some(kind) = kind {
            return match parse_storage_header(kind, &line, args) {
                Some(header) => self.begin_data_block(header),
                None => {
                    debug!("Malformed storage command: {:?}", line);
                    Some(AsciiRequest::Invalid)
                }
            };
        }

        let request = match command {
            Command::Get => {
                parse_keys(&line, args).map(|keys| AsciiRequest::Get(GetRequest { keys }))
            }
            Command::Gets => {
                parse_keys(&line, args).map(|keys| AsciiRequest::Gets(GetRequest { keys }))
            }
            Command::Gat => parse_get_and_touch(&line, args).map(AsciiRequest::Gat),
            Command::Gats => parse_get_and_touch(&line, args).map(AsciiRequest::Gats),
            Command::Delete => parse_delete(&line, args).map(AsciiRequest::Delete),
            Command::Touch => parse_touch(&line, args).map(AsciiRequest::Touch),
            Command::Increment => parse_delta(&line, args).map(AsciiRequest::Increment),
            Command::Decrement => parse_delta(&line, args).map(AsciiRequest::Decrement),
            Command::Version => args.is_empty().then_some(AsciiRequest::Version),
            _ => None,
        };
        if request.is_none() {
            debug!("Malformed command: {:?}", line);
        }
        Some(request.unwrap_or(AsciiRequest::Invalid))
    }

    /// Returns a request right away only if the block is going to be skipped
    fn begin_data_block(&mut self, header: StorageHeader) -> Option<AsciiRequest> {
        if header.bytes > self.item_size_limit {
            debug!(
                "Item size {} exceeds limit {}, skipping data block",
                header.bytes, self.item_size_limit
            );
            let remaining = header.bytes.saturating_add(CRLF.len() as u64);
            self.state = RequestParserState::Skipping(remaining);
            return Some(AsciiRequest::ItemTooLarge(ItemTooLargeRequest {
                key: header.key,
                bytes: header.bytes,
            }));
        }
        self.state = RequestParserState::DataPending(header);
        None
    }

    fn decode_data(
        &mut self,
        header: StorageHeader,
        src: &mut BytesMut,
    ) -> Result<Option<AsciiRequest>, io::Error> {
        let bytes = header.bytes as usize;
        let frame_length = bytes + CRLF.len();
        if src.len() < frame_length {
            src.reserve(frame_length - src.len());
            self.state = RequestParserState::DataPending(header);
            return Ok(None);
        }

        let value = src.split_to(bytes).freeze();
        if &src[..CRLF.len()] != CRLF {
            error!("Data block of {} bytes not terminated by CRLF", bytes);
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Data block not terminated by CRLF",
            ));
        }
        src.advance(CRLF.len());
        Ok(Some(header.into_request(value)))
    }
}

impl Decoder for MemcacheAsciiDecoder {
    type Item = AsciiRequest;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<AsciiRequest>, io::Error> {
        loop {
            match std::mem::take(&mut self.state) {
                RequestParserState::None => match take_line(src)? {
                    None => return Ok(None),
                    Some(Line::BadTerminator) => {
                        debug!("Line not terminated by CRLF");
                        return Ok(Some(AsciiRequest::Invalid));
                    }
                    Some(Line::Command(line)) => {
                        if let Some(request) = self.parse_line(line) {
                            return Ok(Some(request));
                        }
                    }
                },
                RequestParserState::DataPending(header) => return self.decode_data(header, src),
                RequestParserState::Skipping(remaining) => {
                    let skipped = remaining.min(src.len() as u64);
                    src.advance(skipped as usize);
                    if skipped < remaining {
                        self.state = RequestParserState::Skipping(remaining - skipped);
                        return Ok(None);
                    }
                }
            }
        }
    }
}

fn take_line(src: &mut BytesMut) -> Result<Option<Line>, io::Error> {
    match src.iter().position(|byte| *byte == b'\n') {
        Some(end) if end <= MAX_LINE_LENGTH => {
            let line = src.split_to(end + 1).freeze();
            if end == 0 || line[end - 1] != b'\r' {
                return Ok(Some(Line::BadTerminator));
            }
            Ok(Some(Line::Command(line.slice(..end - 1))))
        }
        None if src.len() <= MAX_LINE_LENGTH => Ok(None),
        _ => {
            error!("Command line longer than {} bytes", MAX_LINE_LENGTH);
            Err(Error::new(ErrorKind::InvalidData, "Line too long"))
        }
    }
}

/// Splits on single spaces, trailing empty tokens are dropped
fn tokenize(line: &[u8]) -> Vec<&[u8]> {
    let mut tokens: Vec<&[u8]> = line.split(|byte| *byte == b' ').collect();
    while tokens.last().is_some_and(|token| token.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Accepts `fixed` arguments optionally followed by `noreply`
fn parse_noreply(args: &[&[u8]], fixed: usize) -> Option<bool> {
    if args.len() == fixed {
        return Some(false);
    }
    if args.len() == fixed + 1 && args[fixed] == NOREPLY {
        return Some(true);
    }
    None
}

fn parse_key(line: &Bytes, token: &[u8]) -> Option<Bytes> {
    if !is_valid_key(token) {
        return None;
    }
    Some(line.slice_ref(token))
}

fn parse_keys(line: &Bytes, args: &[&[u8]]) -> Option<Vec<Bytes>> {
    if args.is_empty() {
        return None;
    }
    args.iter().map(|token| parse_key(line, token)).collect()
}

fn parse_unsigned<T: FromStr>(token: &[u8]) -> Option<T> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Signed 32 bit decimal
fn parse_exptime(token: &[u8]) -> Option<i64> {
    let (negative, digits) = match token.split_first() {
        Some((b'-', digits)) => (true, digits),
        _ => (false, token),
    };
    let magnitude: i64 = parse_unsigned(digits)?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok().map(i64::from)
}

fn parse_storage_header(
    kind: StorageKind,
    line: &Bytes,
    args: &[&[u8]],
) -> Option<StorageHeader> {
    let fixed = match kind {
        StorageKind::Cas => 5,
        _ => 4,
    };
    let noreply = parse_noreply(args, fixed)?;
    let cas = match kind {
        StorageKind::Cas => parse_unsigned(args[4])?,
        _ => 0,
    };
    Some(StorageHeader {
        kind,
        key: parse_key(line, args[0])?,
        flags: parse_unsigned(args[1])?,
        exptime: parse_exptime(args[2])?,
        bytes: parse_unsigned(args[3])?,
        cas,
        noreply,
    })
}

fn parse_get_and_touch(line: &Bytes, args: &[&[u8]]) -> Option<GetAndTouchRequest> {
    let (exptime, keys) = args.split_first()?;
    Some(GetAndTouchRequest {
        exptime: parse_exptime(exptime)?,
        keys: parse_keys(line, keys)?,
    })
}

fn parse_delete(line: &Bytes, args: &[&[u8]]) -> Option<DeleteRequest> {
    let noreply = parse_noreply(args, 1)?;
    Some(DeleteRequest {
        key: parse_key(line, args[0])?,
        noreply,
    })
}

fn parse_touch(line: &Bytes, args: &[&[u8]]) -> Option<TouchRequest> {
    let noreply = parse_noreply(args, 2)?;
    Some(TouchRequest {
        key: parse_key(line, args[0])?,
        exptime: parse_exptime(args[1])?,
        noreply,
    })
}

fn parse_delta(line: &Bytes, args: &[&[u8]]) -> Option<DeltaRequest> {
    let noreply = parse_noreply(args, 2)?;
    Some(DeltaRequest {
        key: parse_key(line, args[0])?,
        delta: parse_unsigned(args[1])?,
        noreply,
    })
}
