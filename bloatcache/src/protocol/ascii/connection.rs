use crate::protocol::ascii::decoder::{AsciiRequest, MemcacheAsciiDecoder};
use crate::protocol::ascii::encoder::{AsciiResponse, MemcacheAsciiEncoder, ResponseMessage};
use bytes::BytesMut;
use std::io;
use std::io::{Error, ErrorKind};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Decoder;

/// Buffered ASCII protocol transport over a single client stream
pub struct MemcacheAsciiConnection<S> {
    stream: S,
    decoder: MemcacheAsciiDecoder,
    encoder: MemcacheAsciiEncoder,
    buffer: BytesMut,
}

impl<S> MemcacheAsciiConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    const READ_BUFFER_SIZE: usize = 4096;

    pub fn new(socket: S, item_size_limit: u64) -> Self {
        MemcacheAsciiConnection {
            stream: socket,
            decoder: MemcacheAsciiDecoder::new(item_size_limit),
            encoder: MemcacheAsciiEncoder::new(),
            buffer: BytesMut::with_capacity(Self::READ_BUFFER_SIZE),
        }
    }

    /// Reads the next request, `None` means the peer closed the
    /// connection between requests.
    ///
    /// Cancel safe: bytes already read stay in the connection buffer.
    pub async fn read_frame(&mut self) -> Result<Option<AsciiRequest>, io::Error> {
        loop {
            // Attempt to parse a frame from the buffered data. If enough data
            // has been buffered, the frame is returned.
            if let Some(frame) = self.decoder.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            if self.buffer.capacity() == self.buffer.len() {
                self.buffer.reserve(Self::READ_BUFFER_SIZE);
            }

            // `0` indicates "end of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // For this to be a clean shutdown, there should be no data
                // in the read buffer and no request half decoded.
                if self.buffer.is_empty() && self.decoder.is_idle() {
                    return Ok(None);
                } else {
                    return Err(Error::new(
                        ErrorKind::ConnectionReset,
                        "Connection reset by peer",
                    ));
                }
            }
        }
    }

    pub async fn write(&mut self, msg: &AsciiResponse) -> io::Result<()> {
        let message = self.encoder.encode_message(msg);
        self.write_data_to_stream(message).await?;
        Ok(())
    }

    async fn write_data_to_stream(&mut self, msg: ResponseMessage) -> io::Result<()> {
        self.stream.write_all(&msg.data[..]).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    const ITEM_SIZE_LIMIT: u64 = 1024;

    #[tokio::test]
    async fn read_frame_returns_requests_in_order() {
        let (mut client, server) = duplex(64);
        let mut connection = MemcacheAsciiConnection::new(server, ITEM_SIZE_LIMIT);

        client
            .write_all(b"set foo 0 0 3\r\nbar\r\nget foo\r\n")
            .await
            .unwrap();

        match connection.read_frame().await.unwrap() {
            Some(AsciiRequest::Set(request)) => assert_eq!(&request.value[..], b"bar"),
            _ => unreachable!(),
        }
        assert!(matches!(
            connection.read_frame().await.unwrap(),
            Some(AsciiRequest::Get(_))
        ));
    }

    #[tokio::test]
    async fn read_frame_returns_none_on_clean_close() {
        let (client, server) = duplex(64);
        let mut connection = MemcacheAsciiConnection::new(server, ITEM_SIZE_LIMIT);
        drop(client);
        assert!(connection.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_inside_data_block_is_reset() {
        let (mut client, server) = duplex(64);
        let mut connection = MemcacheAsciiConnection::new(server, ITEM_SIZE_LIMIT);
        client.write_all(b"set foo 0 0 10\r\nabc").await.unwrap();
        drop(client);
        let err = connection.read_frame().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn close_after_header_is_reset() {
        let (mut client, server) = duplex(64);
        let mut connection = MemcacheAsciiConnection::new(server, ITEM_SIZE_LIMIT);
        client.write_all(b"set foo 0 0 3\r\n").await.unwrap();
        drop(client);
        let err = connection.read_frame().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn large_data_block_is_read_across_many_reads() {
        let (mut client, server) = duplex(1024);
        let mut connection = MemcacheAsciiConnection::new(server, 64 * 1024);
        let value = vec![b'x'; 32 * 1024];

        let writer = tokio::spawn(async move {
            client.write_all(b"set big 0 0 32768\r\n").await.unwrap();
            client.write_all(&value).await.unwrap();
            client.write_all(b"\r\n").await.unwrap();
            client
        });

        match connection.read_frame().await.unwrap() {
            Some(AsciiRequest::Set(request)) => assert_eq!(request.value.len(), 32 * 1024),
            _ => unreachable!(),
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn write_sends_encoded_response() {
        let (mut client, server) = duplex(64);
        let mut connection = MemcacheAsciiConnection::new(server, ITEM_SIZE_LIMIT);
        connection.write(&AsciiResponse::Stored).await.unwrap();
        connection.shutdown().await.unwrap();

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"STORED\r\n");
    }
}
