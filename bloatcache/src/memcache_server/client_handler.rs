use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::handler;
use crate::memcache::store as storage;
use crate::protocol::ascii::connection::MemcacheAsciiConnection;
use crate::protocol::ascii::decoder::AsciiRequest;

pub struct ClientConfig {
    pub(crate) item_size_limit: u64,
}

pub struct Client<S> {
    stream: MemcacheAsciiConnection<S>,
    addr: SocketAddr,
    handler: handler::AsciiHandler,
    /// Max connection semaphore.
    ///
    /// The listener takes a permit for every client it serves and the
    /// client gives it back when dropped.
    limit_connections: Arc<Semaphore>,
    cancellation_token: CancellationToken,
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        store: Arc<storage::MemcStore>,
        socket: S,
        addr: SocketAddr,
        config: ClientConfig,
        limit_connections: Arc<Semaphore>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Client {
            stream: MemcacheAsciiConnection::new(socket, config.item_size_limit),
            addr,
            handler: handler::AsciiHandler::new(store),
            limit_connections,
            cancellation_token,
        }
    }

    pub async fn handle(&mut self) {
        debug!("New client connected: {}", self.addr);

        // Requests are served one at a time in arrival order. A shutdown is
        // only observed between requests, never while one is being handled.
        loop {
            let frame = tokio::select! {
                req_or_none = self.stream.read_frame() => Some(req_or_none),
                _ = self.cancellation_token.cancelled() => None,
            };

            match frame {
                Some(req_or_none) => {
                    let client_close = self.handle_frame(req_or_none).await;
                    if client_close {
                        return;
                    }
                }
                None => {
                    debug!("Server shutting down, closing client: {}", self.addr);
                    if let Err(_e) = self.stream.shutdown().await.map_err(log_error) {}
                    return;
                }
            }
        }
    }

    async fn handle_frame(&mut self, req: Result<Option<AsciiRequest>, io::Error>) -> bool {
        match req {
            Ok(Some(request)) => self.handle_request(request).await,
            Ok(None) => {
                debug!("Connection closed: {}", self.addr);
                true
            }
            Err(err) => {
                log_error(err);
                true
            }
        }
    }

    /// Handles single memcached text request
    /// Returns true if we should leave client receive loop
    async fn handle_request(&mut self, request: AsciiRequest) -> bool {
        debug!("Got request {} from {}", request.command_name(), self.addr);

        match self.handler.handle_request(request) {
            Some(response) => {
                debug!("Sending response {:?}", response);
                if let Err(e) = self.stream.write(&response).await {
                    error!("error on sending response; error = {:?}", e);
                    return true;
                }
                false
            }
            None => false,
        }
    }
}

impl<S> Drop for Client<S> {
    fn drop(&mut self) {
        // Runs even if the task serving this client panics, so the permit
        // can never leak.
        self.limit_connections.add_permits(1);
    }
}

fn log_error(e: io::Error) {
    // in most cases its not an error
    // client may just drop connection in the middle of a request
    match e.kind() {
        io::ErrorKind::NotConnected | io::ErrorKind::ConnectionReset => info!("Error: {}", e),
        _ => error!("Error: {}", e),
    }
}
