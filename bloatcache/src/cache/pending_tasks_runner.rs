use crate::cache::cache::Cache;
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

/// Periodically reclaims expired records. Reads never rely on it,
/// they check deadlines on their own.
pub struct PendingTasksRunner {
    store: Arc<dyn Cache + Send + Sync>,
    cancellation_token: CancellationToken,
    interval: Duration,
}

impl PendingTasksRunner {
    pub const DEFAULT_INTERVAL_IN_MILIS: u64 = 1000;

    pub fn new(
        store: Arc<dyn Cache + Send + Sync>,
        cancellation_token: CancellationToken,
        interval_in_milis: u64,
    ) -> Self {
        debug!("Creating pending tasks runner");
        PendingTasksRunner {
            store,
            cancellation_token,
            interval: Duration::from_millis(interval_in_milis.max(1)),
        }
    }

    pub async fn run(&self) {
        let start = Instant::now() + self.interval;
        let mut interval = interval_at(start, self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_once();
                }
                _ = self.cancellation_token.cancelled() => {
                    debug!("Pending tasks runner cancelled");
                    return;
                }
            }
        }
    }

    fn run_once(&self) {
        let start = StdInstant::now();
        self.store.run_pending_tasks();
        let duration = start.elapsed();
        if duration > self.interval * 2 {
            warn!("Server pending tasks finished in: {:?}", duration);
        } else {
            debug!("Server pending tasks finished in: {:?}", duration);
        }
    }
}
