//! Error types for identifier generation and the pool supervisor.
//!
//! ## Error Cases
//! - `ClockRegression`: the wall clock moved behind the last published
//!   timestamp. Confirmed against the live generator state, never raised on a
//!   stale read.
//! - `ClockBeforeEpoch`: the clock reads earlier than the generator's epoch.
//! - `TimestampOverflow`: the elapsed time no longer fits the timestamp field.
//! - `WorkerFailure`: a pool worker hit a generator error and replaced itself.
//!   Only observed as a worker task's output, never by `acquire()` callers.
//! - `InvalidConfig`: a [`PoolConfig`] value was rejected.
//! - `Runtime`: the worker runtime could not be started.
//!
//! [`PoolConfig`]: crate::PoolConfig

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `flakepool` can produce.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The clock reported a time earlier than the last issued timestamp.
    #[error(
        "clock moved backwards: last issued timestamp {last}ms, observed {now}ms; refusing to generate id"
    )]
    ClockRegression {
        /// Last published timestamp, in milliseconds since the epoch.
        last: u64,
        /// Observed timestamp, in milliseconds since the epoch.
        now: u64,
    },

    /// The clock reads earlier than the generator's epoch.
    #[error("clock reads {now}ms since UNIX epoch, before the generator epoch {epoch}ms")]
    ClockBeforeEpoch { now: u64, epoch: u64 },

    /// The elapsed time since the epoch does not fit the timestamp field.
    #[error("elapsed time {elapsed}ms exceeds the timestamp field")]
    TimestampOverflow { elapsed: u64 },

    /// A pool worker failed and was replaced by a fresh worker.
    #[error("worker {worker_id} failed and was replaced: {source}")]
    WorkerFailure {
        worker_id: usize,
        #[source]
        source: Box<Error>,
    },

    /// A configuration value was rejected.
    #[error("invalid pool configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The worker runtime could not be built.
    #[error("failed to start worker runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for the clock related failures a generator can report.
    pub const fn is_clock_error(&self) -> bool {
        matches!(
            self,
            Self::ClockRegression { .. } | Self::ClockBeforeEpoch { .. }
        )
    }
}
