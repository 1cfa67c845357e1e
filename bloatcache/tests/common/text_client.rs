use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Minimal blocking client speaking the text protocol byte for byte
pub struct TextClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

#[allow(dead_code)]
impl TextClient {
    pub fn connect(port: u16) -> TextClient {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.set_nodelay(true).unwrap();
        TextClient {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    pub fn send(&mut self, data: &[u8]) {
        self.writer.write_all(data).unwrap();
        self.writer.flush().unwrap();
    }

    /// Next reply line including its CRLF
    pub fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line
    }

    pub fn read_exact(&mut self, len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        self.reader.read_exact(&mut data).unwrap();
        data
    }

    /// True when the server has closed the connection
    pub fn is_closed(&mut self) -> bool {
        let mut data = Vec::new();
        match self.reader.read_to_end(&mut data) {
            Ok(_) => data.is_empty(),
            Err(err) => matches!(
                err.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
            ),
        }
    }

    /// Sends a command and returns the single reply line
    pub fn request(&mut self, data: &[u8]) -> String {
        self.send(data);
        self.read_line()
    }

    pub fn set(&mut self, key: &str, flags: u32, exptime: i64, value: &[u8]) -> String {
        self.storage("set", key, flags, exptime, value)
    }

    pub fn storage(
        &mut self,
        command: &str,
        key: &str,
        flags: u32,
        exptime: i64,
        value: &[u8],
    ) -> String {
        let mut data =
            format!("{} {} {} {} {}\r\n", command, key, flags, exptime, value.len()).into_bytes();
        data.extend_from_slice(value);
        data.extend_from_slice(b"\r\n");
        self.request(&data)
    }

    /// Reads `VALUE` lines up to `END` as (key, flags, cas, data)
    pub fn read_values(&mut self) -> Vec<(String, u32, Option<u64>, Vec<u8>)> {
        let mut values = Vec::new();
        loop {
            let line = self.read_line();
            if line == "END\r\n" {
                return values;
            }
            let fields: Vec<&str> = line.trim_end_matches("\r\n").split(' ').collect();
            assert_eq!(fields[0], "VALUE", "unexpected line {:?}", line);
            let len: usize = fields[3].parse().unwrap();
            let cas = fields.get(4).map(|cas| cas.parse().unwrap());
            let data = self.read_exact(len + 2);
            assert_eq!(&data[len..], b"\r\n");
            values.push((
                fields[1].to_string(),
                fields[2].parse().unwrap(),
                cas,
                data[..len].to_vec(),
            ));
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        self.send(format!("get {}\r\n", key).as_bytes());
        let mut values = self.read_values();
        assert!(values.len() <= 1);
        values.pop().map(|(_key, _flags, _cas, data)| data)
    }

    pub fn gets(&mut self, key: &str) -> Option<(Vec<u8>, u64)> {
        self.send(format!("gets {}\r\n", key).as_bytes());
        let mut values = self.read_values();
        assert!(values.len() <= 1);
        values.pop().map(|(_key, _flags, cas, data)| (data, cas.unwrap()))
    }
}
