use bloatcache::server;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    server::main::run(args);
}
