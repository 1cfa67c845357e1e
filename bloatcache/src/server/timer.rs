use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

/// Server clock, unix time in seconds
pub trait Timer {
    fn timestamp(&self) -> u64;
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

/// Clock read on every request. It is refreshed once per second by
/// `run` so the hot path only loads an atomic.
pub struct SystemTimer {
    seconds: AtomicU64,
    cancellation_token: CancellationToken,
}

impl SystemTimer {
    pub fn new(cancellation_token: CancellationToken) -> Self {
        debug!("Creating system timer");
        SystemTimer {
            seconds: AtomicU64::new(unix_time()),
            cancellation_token,
        }
    }

    pub async fn run(&self) {
        let start = Instant::now();
        let mut interval = interval_at(start, Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh();
                    trace!("Server tick: {}", self.timestamp());
                }
                _ = self.cancellation_token.cancelled() => {
                    debug!("System timer cancelled");
                    return;
                }
            }
        }
    }

    fn refresh(&self) {
        // never move backwards, deadlines already handed out stay valid
        self.seconds.fetch_max(unix_time(), Ordering::Release);
    }
}

impl Timer for SystemTimer {
    fn timestamp(&self) -> u64 {
        self.seconds.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_timestamp_is_unix_time() {
        let timer = SystemTimer::new(CancellationToken::new());
        let now = unix_time();
        assert!(timer.timestamp() <= now);
        assert!(timer.timestamp() + 2 >= now);
    }

    #[tokio::test]
    async fn test_run_follows_wall_clock() {
        let token = CancellationToken::new();
        let timer = Arc::new(SystemTimer::new(token.clone()));
        let timer_clone = Arc::clone(&timer);
        let started = timer.timestamp();

        let handle = tokio::spawn(async move {
            timer_clone.run().await;
        });

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(timer.timestamp() >= started + 2);
        token.cancel();
        handle.await.unwrap();
    }
}
