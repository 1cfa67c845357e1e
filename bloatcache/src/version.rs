/// Version reported by the command line interface
pub const BLOATCACHE_VERSION: &str = env!("CARGO_PKG_VERSION");
