use super::test_utils::*;
use test_case::test_case;

// APPEND TESTS

#[test_case(create_dash_map_server() ; "dash_map_backend")]
fn append_should_fail_if_not_exist(server: MockServer) {
    let key = Bytes::from("key");
    let record = Record::new(from_string("test data"), 0, 0, 0);
    let result = server.storage.append(key, record);

    match result {
        Ok(_) => unreachable!(),
        Err(err) => assert_eq!(err, CacheError::NotFound),
    }
}

#[test_case(create_dash_map_server() ; "dash_map_backend")]
fn append_should_add_at_the_end(server: MockServer) {
    let key = Bytes::from("key");
    let record = Record::new(from_string("Foo"), 0, 0, 0);
    let result = server.storage.set(key.clone(), record);

    match result {
        Ok(status) => {
            let append_data = Record::new(from_string("bar"), 0, 0, 0);
            let append_result = server.storage.append(key.clone(), append_data);
            assert!(append_result.unwrap().cas > status.cas);
            match server.storage.get(&key) {
                Ok(record) => {
                    let value = from_string("Foobar");
                    assert_eq!(record.value[..], value[..]);
                }
                Err(_) => unreachable!(),
            }
        }
        Err(_) => unreachable!(),
    }
}

#[test_case(create_dash_map_server() ; "dash_map_backend")]
fn append_should_preserve_flags_and_expiration(server: MockServer) {
    let key = Bytes::from("key");
    let record = Record::new(from_string("ab"), 0, 7, 100);
    assert!(server.storage.set(key.clone(), record).is_ok());
    let deadline = server.storage.get(&key).unwrap().header.time_to_live;

    let append_data = Record::new(from_string("cd"), 0, 0, 0);
    assert!(server.storage.append(key.clone(), append_data).is_ok());

    let found = server.storage.get(&key).unwrap();
    assert_eq!(found.value, from_string("abcd"));
    assert_eq!(found.header.flags, 7);
    assert_eq!(found.header.time_to_live, deadline);

    server.timer.add_seconds(100);
    assert_eq!(server.storage.get(&key), Err(CacheError::NotFound));
}

// PREPEND TESTS

#[test_case(create_dash_map_server() ; "dash_map_backend")]
fn prepend_should_fail_if_not_exist(server: MockServer) {
    let key = Bytes::from("key");
    let record = Record::new(from_string("test data"), 0, 0, 0);
    let result = server.storage.prepend(key, record);

    match result {
        Ok(_) => unreachable!(),
        Err(err) => assert_eq!(err, CacheError::NotFound),
    }
}

#[test_case(create_dash_map_server() ; "dash_map_backend")]
fn prepend_should_add_at_the_beginning(server: MockServer) {
    let key = Bytes::from("key");
    let record = Record::new(from_string("Foo"), 0, 5, 0);
    assert!(server.storage.set(key.clone(), record).is_ok());

    let prepend_data = Record::new(from_string("bar"), 0, 0, 0);
    assert!(server.storage.prepend(key.clone(), prepend_data).is_ok());
    match server.storage.get(&key) {
        Ok(record) => {
            assert_eq!(record.value[..], from_string("barFoo")[..]);
            assert_eq!(record.header.flags, 5);
        }
        Err(_) => unreachable!(),
    }
}

#[test_case(create_dash_map_server() ; "dash_map_backend")]
fn prepend_should_fail_if_record_expired(server: MockServer) {
    let key = Bytes::from("key");
    let record = Record::new(from_string("Foo"), 0, 0, 1);
    assert!(server.storage.set(key.clone(), record).is_ok());
    server.timer.add_seconds(2);

    let prepend_data = Record::new(from_string("bar"), 0, 0, 0);
    assert_eq!(
        server.storage.prepend(key, prepend_data).err(),
        Some(CacheError::NotFound)
    );
}
