pub mod multi_thread_server;
pub mod params_builder;
pub mod random_port;
pub mod text_client;

#[allow(unused_imports)]
pub use multi_thread_server::{spawn_server, BloatcachedTestServer};
pub use params_builder::BloatcachedServerParamsBuilder;
#[allow(unused_imports)]
pub use text_client::TextClient;

#[allow(dead_code)]
pub fn create_value_with_size(size: usize) -> Vec<u8> {
    (0..size).map(|idx| b'a' + (idx % 26) as u8).collect()
}

/// Starts a server with default parameters and connects a client to it
#[allow(dead_code)]
pub fn spawn_server_with_client() -> (BloatcachedTestServer, TextClient) {
    let server = spawn_server(BloatcachedServerParamsBuilder::new());
    let client = TextClient::connect(server.port());
    (server, client)
}
