use crate::version;
use byte_unit::{Byte, UnitType};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RuntimeType {
    /// One single threaded runtime per pinned worker thread
    CurrentThread,
    /// One work stealing runtime shared by all workers
    MultiThread,
}

impl RuntimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeType::CurrentThread => "Work handled withing current thread runtime",
            RuntimeType::MultiThread => "Work stealing threadpool runtime",
        }
    }
}

const MIN_ITEM_SIZE: u64 = 1024;
const MAX_ITEM_SIZE: u64 = 1024 * 1024 * 1024;

fn parse_item_size(value: &str) -> Result<u64, String> {
    let item_size = Byte::parse_str(value, true)
        .map_err(|err| format!("Invalid item size: {}", err))?
        .as_u64();

    if item_size < MIN_ITEM_SIZE {
        return Err(format!(
            "Max item size cannot be less than: {}",
            Byte::from_u64(MIN_ITEM_SIZE).get_appropriate_unit(UnitType::Binary)
        ));
    }

    if item_size > MAX_ITEM_SIZE {
        return Err(format!(
            "Max item size cannot be greater than: {}",
            Byte::from_u64(MAX_ITEM_SIZE).get_appropriate_unit(UnitType::Binary)
        ));
    }
    Ok(item_size)
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bloatcached",
    version = version::BLOATCACHE_VERSION,
    author,
    about = "bloatcached - in-memory cache server speaking the memcached text protocol"
)]
pub struct BloatcachedConfig {
    #[arg(
        short,
        long,
        env = "BLOATCACHE_PORT",
        value_parser = clap::value_parser!(u16).range(1..),
        default_value_t = 8081,
        help = "TCP port to listen on"
    )]
    pub port: u16,

    #[arg(
        short = 'l',
        long = "listen",
        env = "BLOATCACHE_LISTEN",
        default_value = "localhost",
        help = "host name or address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        short,
        long,
        env = "BLOATCACHE_CONNECTION_LIMIT",
        value_parser = clap::value_parser!(u32).range(1..),
        default_value_t = 1024,
        help = "max simultaneous connections"
    )]
    pub connection_limit: u32,

    #[arg(
        short = 'b',
        long,
        env = "BLOATCACHE_LISTEN_BACKLOG",
        default_value_t = 1024,
        help = "set the backlog queue limit"
    )]
    pub listen_backlog: u32,

    #[arg(
        short = 'I',
        long = "max-item-size",
        env = "BLOATCACHE_MAX_ITEM_SIZE",
        value_parser = parse_item_size,
        default_value = "1MiB",
        help = "adjusts max item size (min: 1KiB, max: 1GiB)"
    )]
    pub item_size_limit: u64,

    #[arg(
        short,
        long,
        env = "BLOATCACHE_THREADS",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..),
        default_value_t = num_cpus::get_physical(),
        help = "number of threads to use"
    )]
    pub threads: usize,

    #[arg(
        short,
        long,
        env = "BLOATCACHE_RUNTIME_TYPE",
        value_enum,
        default_value_t = RuntimeType::CurrentThread,
        help = "runtime type to use"
    )]
    pub runtime_type: RuntimeType,

    #[arg(
        short = 'e',
        long,
        env = "BLOATCACHE_SWEEP_INTERVAL_MS",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = 1000,
        help = "interval of expired items removal in milliseconds"
    )]
    pub sweep_interval_ms: u64,

    #[arg(short, action = clap::ArgAction::Count, help = "sets the level of verbosity")]
    pub verbose: u8,
}

pub fn parse(args: Vec<String>) -> Result<BloatcachedConfig, clap::Error> {
    BloatcachedConfig::try_parse_from(args)
}
