mod common;

#[test]
fn cas_contention_check() {
    let (_server, mut client) = common::spawn_server_with_client();
    assert_eq!(client.set("k", 0, 0, b"A"), "STORED\r\n");
    let (_value, c0) = client.gets("k").unwrap();
    assert_eq!(client.set("k", 0, 0, b"B"), "STORED\r\n");
    let (_value, c1) = client.gets("k").unwrap();
    assert!(c1 > c0);

    let stale = format!("cas k 0 0 1 {}\r\nC\r\n", c0);
    assert_eq!(client.request(stale.as_bytes()), "EXISTS\r\n");
    let current = format!("cas k 0 0 1 {}\r\nC\r\n", c1);
    assert_eq!(client.request(current.as_bytes()), "STORED\r\n");
    assert_eq!(client.get("k"), Some(b"C".to_vec()));
}

#[test]
fn cas_missing_key_check() {
    let (_server, mut client) = common::spawn_server_with_client();
    assert_eq!(client.request(b"cas k 0 0 1 1\r\nC\r\n"), "NOT_FOUND\r\n");
}

#[test]
fn cas_ids_are_unique_across_keys_check() {
    let (_server, mut client) = common::spawn_server_with_client();
    assert_eq!(client.set("a", 0, 0, b"1"), "STORED\r\n");
    assert_eq!(client.set("b", 0, 0, b"1"), "STORED\r\n");
    let (_value, cas_a) = client.gets("a").unwrap();
    let (_value, cas_b) = client.gets("b").unwrap();
    assert_ne!(cas_a, cas_b);
}

#[test]
fn concurrent_cas_has_single_winner_check() {
    let (server, mut client) = common::spawn_server_with_client();
    assert_eq!(client.set("race", 0, 0, b"0"), "STORED\r\n");
    let (_value, cas) = client.gets("race").unwrap();

    let port = server.port();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(move || {
                let mut client = common::TextClient::connect(port);
                client.request(format!("cas race 0 0 1 {}\r\nX\r\n", cas).as_bytes())
            })
        })
        .collect();

    let replies: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(replies.iter().filter(|reply| *reply == "STORED\r\n").count(), 1);
    assert_eq!(replies.iter().filter(|reply| *reply == "EXISTS\r\n").count(), 7);
}
