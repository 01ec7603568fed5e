use core::time::Duration;

use crate::{Error, Result};

/// Smallest buffer capacity a pool runs with.
pub const MIN_CAPACITY: usize = 100_000;

/// Largest buffer capacity a pool runs with.
pub const MAX_CAPACITY: usize = 1_000_000;

/// How long an idle worker waits for a wake token before re-checking.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(300);

/// How long a surplus runtime thread may stay idle before it is reclaimed.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(180);

/// Sizing and timing of a [`PoolManager`].
///
/// The requested capacity is clamped to [`MIN_CAPACITY`]..=[`MAX_CAPACITY`].
/// Below the low watermark (one third of capacity) workers bulk-fill the
/// buffer back to capacity; between the low and high watermark (two thirds)
/// each idle timeout adds a single identifier; above the high watermark idle
/// workers do nothing.
///
/// # Example
///
/// ```
/// use flakepool::PoolConfig;
///
/// let config = PoolConfig::new(100_000);
/// assert_eq!(config.low_watermark(), 33_333);
/// assert_eq!(config.high_watermark(), 66_666);
///
/// // Out of range requests are clamped.
/// assert_eq!(PoolConfig::new(10).capacity(), 100_000);
/// assert_eq!(PoolConfig::new(5_000_000).capacity(), 1_000_000);
/// ```
///
/// [`PoolManager`]: crate::PoolManager
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    capacity: usize,
    low: usize,
    high: usize,
    num_workers: usize,
    wake_capacity: usize,
    max_threads: usize,
    wait_timeout: Duration,
    keep_alive: Duration,
}

impl PoolConfig {
    /// Builds a configuration for `requested_capacity`, with one worker per
    /// available hardware thread.
    pub fn new(requested_capacity: usize) -> Self {
        let capacity = requested_capacity.clamp(MIN_CAPACITY, MAX_CAPACITY);
        let low = capacity / 3;
        let num_workers = num_cpus::get().max(1);
        Self {
            capacity,
            low,
            high: 2 * low,
            num_workers,
            wake_capacity: 2 * num_workers,
            max_threads: 2 * num_workers,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    /// Overrides the number of workers. Wake-channel capacity and the thread
    /// ceiling follow at twice the worker count.
    #[must_use]
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self.wake_capacity = 2 * num_workers;
        self.max_threads = 2 * num_workers;
        self
    }

    #[must_use]
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    #[must_use]
    pub fn with_wake_capacity(mut self, wake_capacity: usize) -> Self {
        self.wake_capacity = wake_capacity;
        self
    }

    /// Rejects settings the pool cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero workers, a zero wake
    /// capacity or a zero wait timeout.
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::InvalidConfig {
                reason: "number of workers must be greater than 0".into(),
            });
        }
        if self.wake_capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "wake channel capacity must be greater than 0".into(),
            });
        }
        if self.wait_timeout.is_zero() {
            return Err(Error::InvalidConfig {
                reason: "worker wait timeout must be greater than 0".into(),
            });
        }
        Ok(())
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn low_watermark(&self) -> usize {
        self.low
    }

    pub const fn high_watermark(&self) -> usize {
        self.high
    }

    pub const fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub const fn wake_capacity(&self) -> usize {
        self.wake_capacity
    }

    pub const fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub const fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub const fn keep_alive(&self) -> Duration {
        self.keep_alive
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(MIN_CAPACITY)
    }
}
