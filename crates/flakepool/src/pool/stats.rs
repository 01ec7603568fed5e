use std::sync::atomic::{AtomicU64, Ordering};

/// Relaxed event counters describing what the pool's workers have done.
///
/// Counters are independent and only eventually consistent with each other;
/// they exist to observe refill behaviour, not to account for identifiers.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    bulk_fills: AtomicU64,
    top_ups: AtomicU64,
    idle_ticks: AtomicU64,
    wake_tokens: AtomicU64,
    replacements: AtomicU64,
    worker_failures: AtomicU64,
    fallbacks: AtomicU64,
    generated: AtomicU64,
}

impl PoolStats {
    pub(crate) fn record_bulk_fill(&self) {
        self.bulk_fills.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_top_up(&self) {
        self.top_ups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_idle_tick(&self) {
        self.idle_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wake_token(&self) {
        self.wake_tokens.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_replacement(&self) {
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_worker_failure(&self) {
        self.worker_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_generated(&self, count: u64) {
        self.generated.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bulk_fills: self.bulk_fills.load(Ordering::Relaxed),
            top_ups: self.top_ups.load(Ordering::Relaxed),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
            wake_tokens: self.wake_tokens.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            worker_failures: self.worker_failures.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            generated: self.generated.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a pool's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Bulk-fill passes started (below the low watermark or on a wake token).
    pub bulk_fills: u64,
    /// Single identifiers added after an idle timeout below the high watermark.
    pub top_ups: u64,
    /// Idle timeouts at or above the high watermark.
    pub idle_ticks: u64,
    /// Wake tokens consumed by workers.
    pub wake_tokens: u64,
    /// Workers replaced after a generator failure.
    pub replacements: u64,
    /// Generator errors that ended a worker, including ones seen while
    /// stopping that did not lead to a replacement.
    pub worker_failures: u64,
    /// `acquire()` calls served by a direct generator call during shutdown.
    pub fallbacks: u64,
    /// Identifiers pushed into the buffer by workers.
    pub generated: u64,
}
