use crate::memcache::cli::parser::{BloatcachedConfig, RuntimeType};
use crate::memcache_server::memc_tcp::{MemcacheServerConfig, MemcacheTcpServer};
use crate::memcache_server::server_context::ServerContext;
use std::io;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::runtime::Builder;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

fn get_worker_thread_name() -> String {
    static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
    let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
    format!("bloatcached-wrk-{}", id)
}

fn create_multi_thread_runtime(worker_threads: usize) -> io::Result<tokio::runtime::Runtime> {
    Builder::new_multi_thread()
        .thread_name_fn(get_worker_thread_name)
        .worker_threads(worker_threads)
        .enable_all()
        .build()
}

fn create_current_thread_runtime() -> io::Result<tokio::runtime::Runtime> {
    Builder::new_current_thread()
        .thread_name_fn(get_worker_thread_name)
        .enable_all()
        .build()
}

fn get_server_config(config: &BloatcachedConfig) -> MemcacheServerConfig {
    MemcacheServerConfig::new(
        config.connection_limit,
        config.item_size_limit,
        config.listen_backlog,
    )
}

fn pin_to_core(worker: usize, core_ids: &[core_affinity::CoreId]) {
    if core_ids.is_empty() {
        return;
    }
    let core_id = core_ids[worker % core_ids.len()];
    if core_affinity::set_for_current(core_id) {
        debug!(
            "Thread pinned {:?} to core {:?}",
            std::thread::current().id(),
            core_id.id
        );
    } else {
        warn!("Cannot pin thread to core {}", core_id.id);
    }
}

/// One single threaded runtime per worker thread, each with its own
/// listener on the shared port. Clock and sweeper run on the calling thread.
fn run_current_thread_server(config: BloatcachedConfig, ctxt: ServerContext) -> io::Result<()> {
    let memc_config = get_server_config(&config);
    let limit_connections = Arc::new(Semaphore::new(memc_config.connection_limit() as usize));
    let core_ids = core_affinity::get_core_ids().unwrap_or_default();

    let mut workers = Vec::with_capacity(config.threads);
    for worker in 0..config.threads {
        let store = ctxt.store();
        let cancellation_token = ctxt.cancellation_token();
        let limit_connections = Arc::clone(&limit_connections);
        let core_ids = core_ids.clone();
        let host = config.listen_address.clone();
        let port = config.port;

        let handle = std::thread::spawn(move || -> io::Result<()> {
            debug!("Creating runtime {}", worker);
            pin_to_core(worker, &core_ids);
            let result = create_current_thread_runtime().and_then(|runtime| {
                let mut tcp_server = MemcacheTcpServer::with_connection_limiter(
                    memc_config,
                    store,
                    limit_connections,
                    cancellation_token.clone(),
                );
                runtime.block_on(tcp_server.run((host.as_str(), port)))
            });
            if let Err(err) = &result {
                error!("Worker {} failed: {}", worker, err);
                cancellation_token.cancel();
            }
            result
        });
        workers.push(handle);
    }

    let control_runtime = create_current_thread_runtime()?;
    let system_timer = ctxt.system_timer();
    let pending_tasks_runner = ctxt.pending_tasks_runner();
    control_runtime.block_on(async move {
        tokio::join!(system_timer.run(), pending_tasks_runner.run());
    });

    let mut result = Ok(());
    for worker in workers {
        match worker.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if result.is_ok() {
                    result = Err(err);
                }
            }
            Err(_panic) => {
                if result.is_ok() {
                    result = Err(io::Error::other("worker thread panicked"));
                }
            }
        }
    }
    result
}

/// One work stealing runtime runs the listener, the clients, the clock
/// and the sweeper.
fn run_threadpool_server(config: BloatcachedConfig, ctxt: ServerContext) -> io::Result<()> {
    let memc_config = get_server_config(&config);
    let runtime = create_multi_thread_runtime(config.threads)?;
    let cancellation_token = ctxt.cancellation_token();

    let system_timer = ctxt.system_timer();
    runtime.spawn(async move { system_timer.run().await });
    let pending_tasks_runner = ctxt.pending_tasks_runner();
    runtime.spawn(async move { pending_tasks_runner.run().await });

    let mut tcp_server =
        MemcacheTcpServer::new(memc_config, ctxt.store(), cancellation_token.clone());
    let result = runtime.block_on(tcp_server.run((config.listen_address.as_str(), config.port)));
    // background tasks stop together with the listener
    ctxt.shutdown();
    result
}

/// Runs the server until the context's cancellation token is cancelled
/// and every client connection has been closed.
pub fn start_bloatcache_server_with_ctxt(
    config: BloatcachedConfig,
    ctxt: ServerContext,
) -> io::Result<()> {
    match config.runtime_type {
        RuntimeType::CurrentThread => run_current_thread_server(config, ctxt),
        RuntimeType::MultiThread => run_threadpool_server(config, ctxt),
    }
}
