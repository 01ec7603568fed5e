//! State shared between the [`PoolManager`] handle and its workers.
//!
//! [`PoolManager`]: crate::PoolManager

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering},
};

use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle};

use super::{config::PoolConfig, signal::WakeSignal, stats::PoolStats, worker::worker_loop};
use crate::{Error, Result, generator::IdGenerator};

pub(crate) struct PoolShared<G> {
    pub(crate) generator: G,
    pub(crate) config: PoolConfig,
    pub(crate) wake: WakeSignal,
    pub(crate) stats: PoolStats,
    buffer: SegQueue<u64>,
    // Approximate: not linearized with `buffer`, may transiently dip below 0.
    size: AtomicIsize,
    stop: Arc<AtomicBool>,
    workers: DashMap<usize, JoinHandle<Result<()>>>,
    next_worker_id: AtomicUsize,
    last_failure: Mutex<Option<String>>,
    runtime: Handle,
}

impl<G> PoolShared<G>
where
    G: IdGenerator + 'static,
{
    pub(crate) fn new(
        generator: G,
        config: PoolConfig,
        stop: Arc<AtomicBool>,
        runtime: Handle,
    ) -> Self {
        Self {
            generator,
            wake: WakeSignal::new(config.wake_capacity()),
            workers: DashMap::with_capacity(config.num_workers()),
            config,
            stats: PoolStats::default(),
            buffer: SegQueue::new(),
            size: AtomicIsize::new(0),
            stop,
            next_worker_id: AtomicUsize::new(0),
            last_failure: Mutex::new(None),
            runtime,
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Flips the stop flag. Only the caller that performs the transition gets
    /// `true`.
    pub(crate) fn try_stop(&self) -> bool {
        self.stop
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn approx_len(&self) -> usize {
        self.size.load(Ordering::Relaxed).max(0) as usize
    }

    /// Pushes `id` and returns the approximate length afterwards.
    pub(crate) fn push(&self, id: u64) -> usize {
        self.buffer.push(id);
        (self.size.fetch_add(1, Ordering::Relaxed) + 1).max(0) as usize
    }

    pub(crate) fn pop(&self) -> Option<u64> {
        let id = self.buffer.pop()?;
        self.size.fetch_sub(1, Ordering::Relaxed);
        Some(id)
    }

    /// Workers whose task is still running.
    pub(crate) fn active_workers(&self) -> usize {
        self.workers
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    /// Spawns a worker on the pool runtime and registers it under a fresh id.
    pub(crate) fn spawn_worker(self: &Arc<Self>) -> usize {
        let worker_id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let handle = self
            .runtime
            .spawn(worker_loop(worker_id, Arc::clone(self)));
        self.workers.insert(worker_id, handle);

        // Shutdown may have swept the registry between spawn and insert.
        if self.is_stopped() {
            if let Some((_, handle)) = self.workers.remove(&worker_id) {
                handle.abort();
            }
        }
        worker_id
    }

    /// Keeps the cause of a worker failure readable after the task is gone.
    pub(crate) fn record_failure(&self, worker_id: usize, error: &Error) {
        self.stats.record_worker_failure();
        *self.last_failure.lock() = Some(format!("worker {worker_id}: {error}"));
    }

    pub(crate) fn last_failure(&self) -> Option<String> {
        self.last_failure.lock().clone()
    }

    /// Deregisters a failed worker and starts its replacement.
    ///
    /// Called by the failing worker itself, right before it returns.
    pub(crate) fn replace_worker(self: &Arc<Self>, worker_id: usize) {
        if self.is_stopped() {
            return;
        }
        if let Some((_, handle)) = self.workers.remove(&worker_id) {
            handle.abort();
        }
        self.stats.record_replacement();
        let _replacement = self.spawn_worker();

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {worker_id} replaced by worker {_replacement}");
    }

    /// Wakes, cancels and forgets every tracked worker.
    ///
    /// The buffer is left as is: other threads may still be draining it.
    pub(crate) fn teardown(&self) {
        let tracked = self.workers.len();
        for _ in 0..tracked {
            self.wake.offer();
        }
        self.wake.close();

        self.workers.retain(|_worker_id, handle| {
            handle.abort();
            false
        });

        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelled {tracked} workers");
    }
}
