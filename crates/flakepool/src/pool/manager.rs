//! Pre-generated identifier pool backed by a supervised set of workers.
//!
//! This module defines [`PoolManager`], which hides identifier generation
//! latency behind a buffer that background workers keep filled. Consumers
//! pop from the buffer in O(1); when it runs dry they wake the workers and
//! poll until a value shows up.
//!
//! Workers run on a private multi-threaded tokio runtime sized to the
//! configured worker count. A worker whose generator call fails replaces
//! itself, so a single failure never stalls the pool.
//!
//! Shutdown is cooperative through a stop flag shared with the embedding
//! application, backed by aborting the worker tasks and closing the wake
//! channel so that no worker stays parked.

use std::sync::{Arc, atomic::AtomicBool};

use crossbeam_utils::Backoff;
use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};

use super::{config::PoolConfig, shared::PoolShared, stats::StatsSnapshot};
use crate::{
    Result,
    generator::{AtomicFlakeGenerator, IdGenerator},
    time::WallClock,
};

/// Result of a [`PoolManager::shut_down`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shutdown {
    /// This call stopped the pool and tore the workers down.
    Completed,
    /// The pool was already stopped; nothing was done.
    AlreadyStopped,
}

/// A bounded pool of pre-generated identifiers.
///
/// # Example
///
/// ```
/// use flakepool::{PoolManager, Shutdown};
/// use std::sync::{Arc, atomic::AtomicBool};
///
/// let stop = Arc::new(AtomicBool::new(false));
/// let pool = PoolManager::create(100_000, Arc::clone(&stop)).unwrap();
///
/// let a = pool.acquire().unwrap();
/// let b = pool.acquire().unwrap();
/// assert_ne!(a, b);
///
/// assert_eq!(pool.shut_down(), Shutdown::Completed);
/// assert_eq!(pool.shut_down(), Shutdown::AlreadyStopped);
/// ```
pub struct PoolManager<G = AtomicFlakeGenerator<WallClock>>
where
    G: IdGenerator + 'static,
{
    shared: Arc<PoolShared<G>>,
    runtime: Mutex<Option<Runtime>>,
}

impl PoolManager {
    /// Creates a pool over a wall-clock [`AtomicFlakeGenerator`].
    ///
    /// `capacity` is clamped as described in [`PoolConfig`]. The `stop` flag
    /// is shared with the caller, who may observe or set it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Runtime`] if the worker runtime cannot start.
    ///
    /// [`Error::Runtime`]: crate::Error::Runtime
    pub fn create(capacity: usize, stop: Arc<AtomicBool>) -> Result<Self> {
        Self::with_config(
            PoolConfig::new(capacity),
            AtomicFlakeGenerator::new(WallClock),
            stop,
        )
    }
}

impl<G> PoolManager<G>
where
    G: IdGenerator + 'static,
{
    /// Creates a pool over any [`IdGenerator`] and spawns one worker per
    /// configured worker slot.
    ///
    /// Registering [`Self::shut_down`] to run at process exit is left to the
    /// embedding application.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `config` fails validation.
    /// - [`Error::Runtime`] if the worker runtime cannot start.
    ///
    /// [`Error::InvalidConfig`]: crate::Error::InvalidConfig
    /// [`Error::Runtime`]: crate::Error::Runtime
    pub fn with_config(config: PoolConfig, generator: G, stop: Arc<AtomicBool>) -> Result<Self> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(config.num_workers())
            .max_blocking_threads(config.max_threads())
            .thread_keep_alive(config.keep_alive())
            .thread_name("flakepool-worker")
            .enable_time()
            .build()?;

        let shared = Arc::new(PoolShared::new(
            generator,
            config,
            stop,
            runtime.handle().clone(),
        ));

        for _ in 0..shared.config.num_workers() {
            shared.spawn_worker();
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Identifier pool started: capacity {}, watermarks {}/{}, {} workers",
            shared.config.capacity(),
            shared.config.low_watermark(),
            shared.config.high_watermark(),
            shared.config.num_workers()
        );

        Ok(Self {
            shared,
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// Takes one identifier from the pool.
    ///
    /// Pops from the buffer when possible. Otherwise asks every worker for an
    /// urgent refill and polls the buffer until a value appears or the pool
    /// stops. Once stopped with nothing buffered, the identifier comes
    /// straight from the generator.
    ///
    /// # Errors
    ///
    /// Only the direct generator call made after the pool stopped can fail,
    /// e.g. with [`Error::ClockRegression`]. Callers must be prepared for
    /// that single terminal error around shutdown.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    pub fn acquire(&self) -> Result<u64> {
        if let Some(id) = self.shared.pop() {
            return Ok(id);
        }

        // Best effort: a full wake channel already has enough tokens queued.
        for _ in 0..self.shared.config.num_workers() {
            self.shared.wake.offer();
        }

        let backoff = Backoff::new();
        while !self.shared.is_stopped() {
            if let Some(id) = self.shared.pop() {
                return Ok(id);
            }
            backoff.snooze();
        }

        self.shared.stats.record_fallback();

        #[cfg(feature = "tracing")]
        tracing::trace!("Pool stopped with an empty buffer, generating directly");

        self.shared.generator.next_id()
    }

    /// Stops the pool.
    ///
    /// Exactly one caller wins the transition of the shared stop flag and
    /// tears the workers down: every tracked worker is woken and cancelled,
    /// the registry is cleared and the runtime is released without waiting.
    /// Buffered identifiers stay available to in-flight [`Self::acquire`]
    /// calls.
    ///
    /// Calls made after the flag is already set, by this method or by the
    /// embedding application, return [`Shutdown::AlreadyStopped`]. They still
    /// release the runtime, so a pool stopped through the shared flag does not
    /// keep its threads until drop. Workers then exit on their own stop check.
    pub fn shut_down(&self) -> Shutdown {
        if self.shared.is_stopped() || !self.shared.try_stop() {
            self.release_runtime();
            return Shutdown::AlreadyStopped;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Stopping identifier pool");

        self.shared.teardown();
        self.release_runtime();

        #[cfg(feature = "tracing")]
        tracing::info!("Identifier pool shut down");

        Shutdown::Completed
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Approximate number of buffered identifiers.
    pub fn approx_len(&self) -> usize {
        self.shared.approx_len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.config.capacity()
    }

    pub fn low_watermark(&self) -> usize {
        self.shared.config.low_watermark()
    }

    pub fn high_watermark(&self) -> usize {
        self.shared.config.high_watermark()
    }

    /// Number of registered workers whose task is still running.
    pub fn active_workers(&self) -> usize {
        self.shared.active_workers()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    pub fn generator(&self) -> &G {
        &self.shared.generator
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// The most recent generator error that ended a worker, if any.
    pub fn last_worker_failure(&self) -> Option<String> {
        self.shared.last_failure()
    }

    /// Handles to the shared state: this manager plus one per live worker task.
    #[cfg(test)]
    pub(crate) fn shared_handles(&self) -> usize {
        Arc::strong_count(&self.shared)
    }

    #[cfg(test)]
    pub(crate) fn runtime_released(&self) -> bool {
        self.runtime.lock().is_none()
    }

    // `shutdown_background` never blocks, so this is safe from async contexts.
    fn release_runtime(&self) {
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
        }
    }
}

impl<G> Drop for PoolManager<G>
where
    G: IdGenerator + 'static,
{
    fn drop(&mut self) {
        self.release_runtime();
    }
}

impl<G> core::fmt::Debug for PoolManager<G>
where
    G: IdGenerator + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PoolManager")
            .field("config", &self.shared.config)
            .field("approx_len", &self.approx_len())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}
