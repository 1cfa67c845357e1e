use socket2::{Domain, SockAddr, Socket, Type};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use tokio::io;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use tracing::{debug, error, info};

use super::client_handler;
use crate::cache::cache::Cache;
use crate::memcache::store as storage;

#[derive(Clone, Copy, Debug)]
pub struct MemcacheServerConfig {
    connection_limit: u32,
    item_size_limit: u64,
    listen_backlog: u32,
}

impl MemcacheServerConfig {
    pub fn new(connection_limit: u32, item_size_limit: u64, listen_backlog: u32) -> Self {
        MemcacheServerConfig {
            connection_limit,
            item_size_limit,
            listen_backlog,
        }
    }

    pub fn connection_limit(&self) -> u32 {
        self.connection_limit
    }
}

pub struct MemcacheTcpServer {
    storage: Arc<storage::MemcStore>,
    limit_connections: Arc<Semaphore>,
    config: MemcacheServerConfig,
    cancellation_token: CancellationToken,
    tracker: TaskTracker,
}

impl MemcacheTcpServer {
    pub fn new(
        config: MemcacheServerConfig,
        store: Arc<dyn Cache + Send + Sync>,
        cancellation_token: CancellationToken,
    ) -> MemcacheTcpServer {
        let limit_connections = Arc::new(Semaphore::new(config.connection_limit as usize));
        Self::with_connection_limiter(config, store, limit_connections, cancellation_token)
    }

    /// Servers sharing `limit_connections` share one connection limit
    pub fn with_connection_limiter(
        config: MemcacheServerConfig,
        store: Arc<dyn Cache + Send + Sync>,
        limit_connections: Arc<Semaphore>,
        cancellation_token: CancellationToken,
    ) -> MemcacheTcpServer {
        MemcacheTcpServer {
            storage: Arc::new(storage::MemcStore::new(store)),
            limit_connections,
            config,
            cancellation_token,
            tracker: TaskTracker::new(),
        }
    }

    /// Accepts clients until the cancellation token fires, then waits
    /// for connected clients to finish.
    pub async fn run<A: ToSocketAddrs>(&mut self, addr: A) -> io::Result<()> {
        let listener = self.get_tcp_listener(addr)?;
        loop {
            tokio::select! {
                connection = self.accept(&listener) => {
                    match connection {
                        Ok((socket, peer_addr)) => self.spawn_client(socket, peer_addr),
                        Err(err) => {
                            error!("Accept error: {}", err);
                        }
                    }
                }
                _ = self.cancellation_token.cancelled() => {
                    info!("Listener stopped, waiting for {} clients", self.tracker.len());
                    break;
                }
            }
        }

        drop(listener);
        self.tracker.close();
        self.tracker.wait().await;
        debug!("All clients disconnected");
        Ok(())
    }

    /// Accepts a connection, then waits for a connection permit. The
    /// client returns the permit when dropped.
    async fn accept(&self, listener: &TcpListener) -> io::Result<(TcpStream, SocketAddr)> {
        let connection = listener.accept().await?;
        match self.limit_connections.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_closed) => return Err(io::Error::other("connection limiter closed")),
        }
        Ok(connection)
    }

    fn spawn_client(&self, socket: TcpStream, peer_addr: SocketAddr) {
        if let Err(err) = socket.set_nodelay(true) {
            error!("Cannot set TCP_NODELAY for {}: {}", peer_addr, err);
        }
        if let Err(err) = socket.set_linger(None) {
            error!("Cannot set SO_LINGER for {}: {}", peer_addr, err);
        }

        let mut client = client_handler::Client::new(
            Arc::clone(&self.storage),
            socket,
            peer_addr,
            self.get_client_config(),
            Arc::clone(&self.limit_connections),
            self.cancellation_token.clone(),
        );
        // Every client runs concurrently with all the others, the tracker
        // lets shutdown wait until each of them has finished.
        self.tracker.spawn(async move { client.handle().await });
    }

    fn get_tcp_listener<A: ToSocketAddrs>(&self, addr: A) -> io::Result<TcpListener> {
        let socket_addr = resolve_listen_address(addr)?;
        debug!("Binding to addr: {:?}", socket_addr);

        let socket = Socket::new(Domain::for_address(socket_addr), Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        // every worker runtime binds its own listener to the same port
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;

        let sock_addr = SockAddr::from(socket_addr);
        if let Err(err) = socket.bind(&sock_addr) {
            error!("Can't bind to: {:?}, err {:?}", socket_addr, err);
            return Err(err);
        }

        let backlog = i32::try_from(self.config.listen_backlog).unwrap_or(i32::MAX);
        if let Err(err) = socket.listen(backlog) {
            error!("Listen error: {:?}", err);
            return Err(err);
        }

        let std_listener: std::net::TcpListener = socket.into();
        TcpListener::from_std(std_listener)
    }

    fn get_client_config(&self) -> client_handler::ClientConfig {
        client_handler::ClientConfig {
            item_size_limit: self.config.item_size_limit,
        }
    }
}

/// Picks the address to listen on, IPv4 is preferred when a host name
/// resolves to both families.
fn resolve_listen_address<A: ToSocketAddrs>(addr: A) -> io::Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no address to listen on"))
}
