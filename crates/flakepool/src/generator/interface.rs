use crate::Result;

/// A minimal interface for identifier generators.
///
/// This is the seam the pool builds on: every worker and the pool's direct
/// fallback path only ever call through this trait, so any strategy can be
/// substituted without touching pool logic.
pub trait IdGenerator: Send + Sync {
    /// Generates the next identifier.
    ///
    /// # Errors
    ///
    /// Implementations report conditions under which no identifier can be
    /// issued safely, such as [`Error::ClockRegression`].
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    fn next_id(&self) -> Result<u64>;

    /// Recovers the generation time, in milliseconds since the UNIX epoch,
    /// from an identifier produced by this generator.
    fn reconstruct_timestamp(&self, id: u64) -> u64;
}

impl<G: IdGenerator + ?Sized> IdGenerator for std::sync::Arc<G> {
    fn next_id(&self) -> Result<u64> {
        (**self).next_id()
    }

    fn reconstruct_timestamp(&self, id: u64) -> u64 {
        (**self).reconstruct_timestamp(id)
    }
}
