use crate::memcache;
use crate::memcache_server;
use crate::memcache_server::server_context::ServerContext;
use log::{error, info};
use std::process;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing_log::LogTracer;

#[cfg(feature = "jemallocator")]
use jemallocator::Jemalloc;

#[cfg(feature = "jemallocator")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn get_log_level(verbose: u8) -> tracing::Level {
    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'myprog -v -v -v' or 'myprog -vvv' vs 'myprog -v'
    match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Cancels the server on Ctrl-C. Runs on its own thread so it does not
/// depend on the runtime layout of the server.
fn spawn_shutdown_listener(cancellation_token: CancellationToken) {
    std::thread::spawn(move || {
        let runtime = match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("Cannot create signal runtime: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            info!("Shutdown signal received, draining connections");
                            cancellation_token.cancel();
                        }
                        Err(err) => {
                            error!("Cannot listen for shutdown signal: {}", err);
                            cancellation_token.cancelled().await;
                        }
                    }
                }
                _ = cancellation_token.cancelled() => {}
            }
        });
    });
}

pub fn run(args: Vec<String>) {
    LogTracer::init().expect("Cannot initialize logger");

    let cli_config = match memcache::cli::parser::parse(args) {
        Ok(config) => config,
        Err(err) => err.exit(),
    };

    tracing_subscriber::fmt()
        .with_max_level(get_log_level(cli_config.verbose))
        .init();

    info!("Listen address: {}", cli_config.listen_address);
    info!("Listen port: {}", cli_config.port);
    info!("Connection limit: {}", cli_config.connection_limit);
    info!("Listen backlog: {}", cli_config.listen_backlog);
    info!("Number of threads: {}", cli_config.threads);
    info!("Runtime type: {}", cli_config.runtime_type.as_str());
    info!("Sweep interval: {}ms", cli_config.sweep_interval_ms);
    info!(
        "Max item size: {}",
        byte_unit::Byte::from_u64(cli_config.item_size_limit)
            .get_appropriate_unit(byte_unit::UnitType::Binary)
    );

    let ctxt = ServerContext::from_config(&cli_config);
    spawn_shutdown_listener(ctxt.cancellation_token());

    if let Err(err) =
        memcache_server::runtime_builder::start_bloatcache_server_with_ctxt(cli_config, ctxt)
    {
        error!("Server error: {}", err);
        process::exit(1);
    }
    info!("Server stopped");
}
