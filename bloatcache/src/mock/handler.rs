use crate::memcache_server::handler::AsciiHandler;
use crate::mock::mock_server::{create_dash_map_storage, MockSystemTimer};
use crate::protocol::ascii::decoder::{AsciiRequest, MemcacheAsciiDecoder};
use crate::protocol::ascii::encoder::{AsciiResponse, MemcacheAsciiEncoder};
use crate::protocol::ascii::network::{GetRequest, StorageRequest};

use bytes::{BufMut, Bytes, BytesMut};
use std::sync::Arc;
use tokio_util::codec::Decoder;

pub const MOCK_ITEM_SIZE_LIMIT: u64 = 1024 * 1024;
const FLAGS: u32 = 0xDEAD_BEEF;

pub struct AsciiHandlerWithTimer {
    pub handler: AsciiHandler,
    pub timer: Arc<MockSystemTimer>,
}

impl AsciiHandlerWithTimer {
    pub fn new(handler: AsciiHandler, timer: Arc<MockSystemTimer>) -> AsciiHandlerWithTimer {
        AsciiHandlerWithTimer { handler, timer }
    }

    pub fn handle_request(&self, req: AsciiRequest) -> Option<AsciiResponse> {
        self.handler.handle_request(req)
    }

    /// Runs raw protocol input through decoder, handler and encoder and
    /// returns everything that would be written back to the client.
    pub fn execute(&self, input: &[u8]) -> Bytes {
        let mut decoder = MemcacheAsciiDecoder::new(MOCK_ITEM_SIZE_LIMIT);
        let encoder = MemcacheAsciiEncoder::new();
        let mut src = BytesMut::with_capacity(input.len());
        src.put_slice(input);

        let mut output = BytesMut::new();
        while let Some(request) = decoder.decode(&mut src).expect("framing error") {
            if let Some(response) = self.handle_request(request) {
                output.put(encoder.encode_message(&response).data);
            }
        }
        output.freeze()
    }
}

pub fn create_dash_map_handler() -> AsciiHandlerWithTimer {
    let store_with_timer = create_dash_map_storage();
    AsciiHandlerWithTimer::new(
        AsciiHandler::new(store_with_timer.memc_store),
        store_with_timer.timer,
    )
}

pub fn create_storage_request(
    key: Bytes,
    value: Bytes,
    exptime: i64,
    noreply: bool,
) -> StorageRequest {
    StorageRequest {
        key,
        flags: FLAGS,
        exptime,
        value,
        noreply,
    }
}

pub fn create_set_request(key: Bytes, value: Bytes) -> AsciiRequest {
    AsciiRequest::Set(create_storage_request(key, value, 0, false))
}

pub fn create_get_request_by_key(key: &Bytes) -> AsciiRequest {
    AsciiRequest::Get(GetRequest {
        keys: vec![key.clone()],
    })
}

pub fn insert_value(handler: &AsciiHandlerWithTimer, key: Bytes, value: Bytes) {
    insert_value_with_expire(handler, key, value, 0)
}

pub fn insert_value_with_expire(
    handler: &AsciiHandlerWithTimer,
    key: Bytes,
    value: Bytes,
    exptime: i64,
) {
    let request = AsciiRequest::Set(create_storage_request(key, value, exptime, true));
    let result = handler.handle_request(request);
    assert!(result.is_none());
}

pub fn get_value(handler: &AsciiHandlerWithTimer, key: Bytes) -> Option<Bytes> {
    match handler.handle_request(create_get_request_by_key(&key)) {
        Some(AsciiResponse::Values(mut response)) => {
            if response.values.is_empty() {
                return None;
            }
            let found = response.values.remove(0);
            assert_ne!(found.cas, 0);
            assert_eq!(found.flags, FLAGS);
            Some(found.value)
        }
        _ => unreachable!(),
    }
}
