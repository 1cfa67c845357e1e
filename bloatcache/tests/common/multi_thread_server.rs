use std::io;
use std::net::TcpStream;
use std::time::Duration;

use bloatcache::{
    memcache,
    memcache_server::{
        runtime_builder::start_bloatcache_server_with_ctxt, server_context::ServerContext,
    },
};
use tokio_util::sync::CancellationToken;

use crate::common::{random_port::PSEUDO_RANDOM_PORT, BloatcachedServerParamsBuilder};

const STARTUP_ATTEMPTS: u32 = 100;

/// Server running on a background thread of the test process
pub struct BloatcachedTestServer {
    thread_join_handle: Option<std::thread::JoinHandle<io::Result<()>>>,
    cancellation_token: CancellationToken,
    port: u16,
}

#[allow(dead_code)]
impl BloatcachedTestServer {
    fn new(
        thread_join_handle: std::thread::JoinHandle<io::Result<()>>,
        cancellation_token: CancellationToken,
        port: u16,
    ) -> BloatcachedTestServer {
        BloatcachedTestServer {
            thread_join_handle: Some(thread_join_handle),
            cancellation_token,
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn get_connection_string(&self) -> String {
        format!(
            "memcache://127.0.0.1:{}?protocol=ascii&timeout=5&tcp_nodelay=true",
            self.port
        )
    }

    /// Cancels the server and waits until every connection is closed
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.cancellation_token.cancel();
        match self.thread_join_handle.take() {
            Some(thread_join_handle) => thread_join_handle
                .join()
                .map_err(|_panic| io::Error::other("server thread panicked"))?,
            None => Ok(()),
        }
    }

    fn wait_until_ready(&self) {
        for _ in 0..STARTUP_ATTEMPTS {
            if TcpStream::connect(("127.0.0.1", self.port)).is_ok() {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        panic!("Server did not start on port {}", self.port);
    }
}

impl Drop for BloatcachedTestServer {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            eprintln!("Problem when stopping server: {err}");
        }
    }
}

fn spawn_server_args(args: Vec<String>) -> BloatcachedTestServer {
    let config = memcache::cli::parser::parse(args).unwrap();
    let ctxt = ServerContext::from_config(&config);
    let cancellation_token = ctxt.cancellation_token();
    let port = config.port;
    let handle = std::thread::spawn(move || start_bloatcache_server_with_ctxt(config, ctxt));
    let server = BloatcachedTestServer::new(handle, cancellation_token, port);
    server.wait_until_ready();
    server
}

pub fn spawn_server(mut params: BloatcachedServerParamsBuilder) -> BloatcachedTestServer {
    let port = PSEUDO_RANDOM_PORT.lock().unwrap().get_next_port();
    params.with_port(port);
    let args = params.build();
    spawn_server_args(args)
}
