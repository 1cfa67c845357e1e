use lazy_static::lazy_static;
use std::sync::Mutex;

const FIRST_PORT: u16 = 10000;
const PORT_WINDOW: u16 = 200;
const WINDOWS: u32 = 200;

/// Hands out ports from a window picked by process id, so test binaries
/// running side by side do not collide.
pub struct TestPortAllocator {
    next: u16,
    last: u16,
}

impl TestPortAllocator {
    fn new() -> TestPortAllocator {
        let window = (std::process::id() % WINDOWS) as u16;
        let next = FIRST_PORT + window * PORT_WINDOW;
        TestPortAllocator {
            next,
            last: next + PORT_WINDOW - 1,
        }
    }

    pub fn get_next_port(&mut self) -> u16 {
        let port = self.next;
        self.next = if port == self.last {
            self.last + 1 - PORT_WINDOW
        } else {
            port + 1
        };
        port
    }
}

lazy_static! {
    pub static ref PSEUDO_RANDOM_PORT: Mutex<TestPortAllocator> =
        Mutex::new(TestPortAllocator::new());
}
