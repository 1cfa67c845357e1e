#![no_main]
use bytes::{BufMut, BytesMut};
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = bloatcache::protocol::ascii::decoder::MemcacheAsciiDecoder::new(1024);
    let mut src = BytesMut::with_capacity(data.len());
    src.put(data);
    // drain every complete frame until the decoder needs more input or fails
    while let Ok(Some(_request)) = decoder.decode(&mut src) {}
});
