use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info};

use super::window::UsageWindow;
use crate::error::{AppError, Result};

/// Fallback pause when usage reads as saturated but the window holds no
/// event to expire. Transient under concurrent eviction; recheck shortly.
const INCONSISTENCY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct QuotaConfig {
    capacity: u64,
    window: Duration,
    recheck_interval: Duration,
}

impl QuotaConfig {
    pub fn new(capacity: u64, window: Duration, recheck_interval: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(AppError::Quota("capacity must be greater than zero".into()));
        }
        if window.is_zero() {
            return Err(AppError::Quota("window duration must be greater than zero".into()));
        }
        if recheck_interval.is_zero() {
            return Err(AppError::Quota("recheck interval must be greater than zero".into()));
        }
        Ok(Self {
            capacity,
            window,
            recheck_interval,
        })
    }

    /// Token spend cap over a one-minute window, rechecked every 5s while
    /// a caller is blocked.
    pub fn tokens_per_minute(capacity: u64) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(60), Duration::from_secs(5))
    }

    /// Item cap over a one-hour window, rechecked every 30s while a caller
    /// is blocked.
    pub fn items_per_hour(capacity: u64) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(3600), Duration::from_secs(30))
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

enum Admission {
    Ready,
    RetryAt(Instant),
    Inconsistent,
}

/// Sliding-window quota limiter shared by all workers of a run.
///
/// Tracks recent spends and suspends callers until admitting a planned
/// spend would keep the rolling total under capacity. The only shared
/// state is the event window, guarded by a single mutex around both
/// `record` and the evict-and-sum read.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: QuotaConfig,
    window: Mutex<UsageWindow>,
}

impl SlidingWindowLimiter {
    pub fn new(config: QuotaConfig) -> Self {
        info!(
            "Initialized rate limiter: {} units per {:?}",
            config.capacity, config.window
        );
        Self {
            config,
            window: Mutex::new(UsageWindow::new(config.window)),
        }
    }

    pub fn config(&self) -> QuotaConfig {
        self.config
    }

    /// Record a spend against the quota.
    pub fn record(&self, amount: u64) {
        self.window.lock().push(Instant::now(), amount);
    }

    /// Total spend inside the trailing window.
    pub fn current_usage(&self) -> u64 {
        let now = Instant::now();
        let mut window = self.window.lock();
        window.evict(now);
        window.total()
    }

    /// Suspend until `planned` more units fit under the cap, returning the
    /// time spent waiting.
    ///
    /// Single sleeps are capped at the configured recheck interval so
    /// concurrent spends and clock drift are picked up on the next pass
    /// instead of oversleeping one computed deadline. A plan larger than
    /// the whole capacity could never be admitted and is rejected up
    /// front.
    pub async fn wait_for(&self, planned: u64) -> Result<Duration> {
        if planned > self.config.capacity {
            return Err(AppError::Quota(format!(
                "planned spend of {} exceeds quota capacity {}",
                planned, self.config.capacity
            )));
        }

        let start = Instant::now();
        loop {
            match self.admit_or_release(planned) {
                Admission::Ready => {
                    let waited = start.elapsed();
                    if !waited.is_zero() {
                        info!(
                            "Waited {:.2}s for quota ({} units planned, {}/{} in window)",
                            waited.as_secs_f64(),
                            planned,
                            self.current_usage(),
                            self.config.capacity
                        );
                    }
                    return Ok(waited);
                }
                Admission::RetryAt(release) => {
                    // Events still in the window expire strictly in the
                    // future, so this sleep is always non-empty.
                    let now = Instant::now();
                    let until = release.min(now + self.config.recheck_interval);
                    debug!(
                        "Quota saturated, sleeping {:.2}s before recheck",
                        (until - now).as_secs_f64()
                    );
                    sleep_until(until).await;
                }
                Admission::Inconsistent => {
                    sleep(INCONSISTENCY_BACKOFF).await;
                }
            }
        }
    }

    fn admit_or_release(&self, planned: u64) -> Admission {
        let now = Instant::now();
        let mut window = self.window.lock();
        window.evict(now);

        let headroom = self.config.capacity.saturating_sub(window.total());
        if planned <= headroom {
            return Admission::Ready;
        }

        let deficit = planned - headroom;
        match window.release_instant(deficit) {
            Some(at) => Admission::RetryAt(at),
            None => Admission::Inconsistent,
        }
    }
}
