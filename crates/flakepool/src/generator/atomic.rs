use core::{cmp, time::Duration};

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::state::State;
use crate::{
    error::{Error, Result},
    generator::IdGenerator,
    id::{FlakeId, MAX_SEQUENCE, MAX_TIMESTAMP, SEQUENCE_BITS},
    time::{REGISTRY_EPOCH, TimeSource, WallClock},
};

/// A lock-free, clock-regression-safe identifier generator.
///
/// The timestamp, sequence and a publish version live in one [`AtomicU64`],
/// so every update is a single compare-and-swap and no thread can observe a
/// timestamp paired with another publish's sequence.
///
/// ## Features
/// - ✅ Thread-safe, lock-free
/// - ✅ Strictly increasing identifiers per instance
/// - ✅ Rejects wall-clock regression instead of reissuing old timestamps
///
/// ## Caveats
/// Identifiers carry no machine discriminator. Two independent generators
/// can produce the same value.
///
/// # Example
/// ```
/// use flakepool::{AtomicFlakeGenerator, WallClock};
///
/// let generator = AtomicFlakeGenerator::new(WallClock);
/// let a = generator.try_next_id().unwrap();
/// let b = generator.try_next_id().unwrap();
/// assert!(a < b);
/// ```
pub struct AtomicFlakeGenerator<T = WallClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    epoch: u64,
    time: T,
}

impl<T> AtomicFlakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator anchored at [`REGISTRY_EPOCH`].
    pub fn new(time: T) -> Self {
        Self::with_epoch(time, REGISTRY_EPOCH)
    }

    /// Creates a generator whose timestamps count milliseconds since `epoch`,
    /// given as a [`Duration`] since 1970-01-01 UTC.
    pub fn with_epoch(time: T, epoch: Duration) -> Self {
        Self::from_components(0, 0, time, epoch)
    }

    /// Creates a generator from explicit component values.
    ///
    /// Useful to resume after a known last-issued identifier. `timestamp` is
    /// in milliseconds since `epoch`.
    pub fn from_components(timestamp: u64, sequence: u64, time: T, epoch: Duration) -> Self {
        let initial = State::new(timestamp, sequence, 0).raw();
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial),
            epoch: epoch.as_millis() as u64,
            time,
        }
    }

    /// The generator's epoch in milliseconds since the UNIX epoch.
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch
    }

    /// The last published identifier (zero before the first call).
    pub fn last_id(&self) -> FlakeId {
        State::from_raw(self.state.load(Ordering::Acquire)).id()
    }

    /// Generates the next identifier.
    ///
    /// Retries transparently when another thread publishes first. Spins
    /// when the sequence of the current millisecond is exhausted until the
    /// clock moves on.
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] when the clock reads earlier than the
    ///   last published timestamp and the state did not change since it was
    ///   loaded.
    /// - [`Error::ClockBeforeEpoch`] / [`Error::TimestampOverflow`] when the
    ///   clock cannot be expressed in the timestamp field.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<FlakeId> {
        loop {
            // Load before reading the clock: a time below `last` is then a
            // genuine regression unless the state moved in between.
            let current = State::from_raw(self.state.load(Ordering::Acquire));
            let now = self.elapsed_millis()?;
            let last = current.timestamp();

            let (timestamp, sequence) = match now.cmp(&last) {
                cmp::Ordering::Less => {
                    if self.state.load(Ordering::Acquire) == current.raw() {
                        return Err(Self::cold_clock_behind(now, last));
                    }
                    continue;
                }
                cmp::Ordering::Equal => {
                    let sequence = (current.sequence() + 1) & MAX_SEQUENCE;
                    if sequence == 0 {
                        (self.wait_next_millis(last)?, 0)
                    } else {
                        (now, sequence)
                    }
                }
                cmp::Ordering::Greater => (now, 0),
            };

            let next = current.advance(timestamp, sequence);
            if self
                .state
                .compare_exchange_weak(
                    current.raw(),
                    next.raw(),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return Ok(next.id());
            }
        }
    }

    /// Recovers the generation time of `id` in milliseconds since the UNIX
    /// epoch.
    pub const fn reconstruct_timestamp(&self, id: u64) -> u64 {
        (id >> SEQUENCE_BITS) + self.epoch
    }

    fn elapsed_millis(&self) -> Result<u64> {
        let now = self.time.current_millis();
        let elapsed = now.checked_sub(self.epoch).ok_or(Error::ClockBeforeEpoch {
            now,
            epoch: self.epoch,
        })?;
        if elapsed > MAX_TIMESTAMP {
            return Err(Error::TimestampOverflow { elapsed });
        }
        Ok(elapsed)
    }

    /// Spins until the clock strictly passes `last`.
    fn wait_next_millis(&self, last: u64) -> Result<u64> {
        loop {
            let now = self.elapsed_millis()?;
            if now > last {
                return Ok(now);
            }
            core::hint::spin_loop();
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(last, now, "Clock moved backwards by {}ms", last - now);
        Error::ClockRegression { last, now }
    }
}

impl<T> IdGenerator for AtomicFlakeGenerator<T>
where
    T: TimeSource + Send + Sync,
{
    fn next_id(&self) -> Result<u64> {
        self.try_next_id().map(|id| id.to_raw())
    }

    fn reconstruct_timestamp(&self, id: u64) -> u64 {
        Self::reconstruct_timestamp(self, id)
    }
}

impl Default for AtomicFlakeGenerator<WallClock> {
    fn default() -> Self {
        Self::new(WallClock)
    }
}

impl<T> core::fmt::Debug for AtomicFlakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtomicFlakeGenerator")
            .field("epoch", &self.epoch)
            .field("last_id", &self.last_id())
            .finish_non_exhaustive()
    }
}
