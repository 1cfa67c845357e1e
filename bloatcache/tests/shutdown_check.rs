mod common;

use bloatcache::memcache::cli::parser::RuntimeType;
use std::net::TcpStream;
use test_case::test_case;

#[test_case(RuntimeType::CurrentThread ; "current_thread")]
#[test_case(RuntimeType::MultiThread ; "multi_thread")]
fn graceful_shutdown_closes_clients(runtime: RuntimeType) {
    let mut params = common::BloatcachedServerParamsBuilder::new();
    params.with_runtime(runtime);
    let mut server = common::spawn_server(params);
    let mut client = common::TextClient::connect(server.port());
    assert_eq!(client.set("k", 0, 0, b"A"), "STORED\r\n");

    server.shutdown().unwrap();

    assert!(client.is_closed());
    assert!(TcpStream::connect(("127.0.0.1", server.port())).is_err());
}

#[test]
fn connection_limit_check() {
    let mut params = common::BloatcachedServerParamsBuilder::new();
    params.with_connection_limit(1);
    let server = common::spawn_server(params);

    let mut first = common::TextClient::connect(server.port());
    assert_eq!(first.set("k", 0, 0, b"A"), "STORED\r\n");

    // the second client is only served once the first one goes away
    let port = server.port();
    let second = std::thread::spawn(move || {
        let mut client = common::TextClient::connect(port);
        client.get("k")
    });
    std::thread::sleep(std::time::Duration::from_millis(200));
    assert!(!second.is_finished());
    drop(first);

    assert_eq!(second.join().unwrap(), Some(b"A".to_vec()));
}
