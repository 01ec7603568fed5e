use core::fmt;

/// Number of low bits holding the per-millisecond sequence.
pub const SEQUENCE_BITS: u32 = 15;

/// Number of bits holding the elapsed milliseconds since the epoch.
pub const TIMESTAMP_BITS: u32 = 41;

/// Largest sequence value within a single millisecond.
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Largest representable elapsed-millisecond value.
pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;

/// A 64-bit, time-ordered identifier.
///
/// Layout (most significant bit first):
///
/// ```text
///  Bit Index:  63 .. 56   55 .. 15    14 .. 0
///              +--------+-----------+----------+
///  Field:      | unused | timestamp | sequence |
///              +--------+-----------+----------+
///  Bits:           8         41          15
/// ```
///
/// The timestamp is counted in milliseconds since the generator's epoch.
/// Because the timestamp sits above the sequence, ordering raw values orders
/// identifiers by generation time, then by sequence.
///
/// # Example
///
/// ```
/// use flakepool::FlakeId;
///
/// let id = FlakeId::from_components(42, 7);
/// assert_eq!(id.to_raw(), (42 << 15) | 7);
/// assert_eq!(FlakeId::from_raw(id.to_raw()).sequence(), 7);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct FlakeId {
    raw: u64,
}

impl FlakeId {
    /// Packs a timestamp and sequence. Out-of-range bits are masked off.
    pub const fn from_components(timestamp: u64, sequence: u64) -> Self {
        let t = (timestamp & MAX_TIMESTAMP) << SEQUENCE_BITS;
        let s = sequence & MAX_SEQUENCE;
        Self { raw: t | s }
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self { raw }
    }

    pub const fn to_raw(&self) -> u64 {
        self.raw
    }

    /// Milliseconds since the generator's epoch.
    pub const fn timestamp(&self) -> u64 {
        self.raw >> SEQUENCE_BITS
    }

    pub const fn sequence(&self) -> u64 {
        self.raw & MAX_SEQUENCE
    }

    /// Reconstructs the generation time in milliseconds since the UNIX epoch.
    pub const fn unix_millis(&self, epoch_millis: u64) -> u64 {
        self.timestamp() + epoch_millis
    }
}

impl From<FlakeId> for u64 {
    fn from(id: FlakeId) -> Self {
        id.raw
    }
}

impl From<u64> for FlakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl fmt::Debug for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlakeId")
            .field("raw", &self.raw)
            .field("timestamp", &self.timestamp())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_are_masked() {
        let id = FlakeId::from_components(MAX_TIMESTAMP + 1, MAX_SEQUENCE + 1);
        assert_eq!(id.timestamp(), 0);
        assert_eq!(id.sequence(), 0);

        let id = FlakeId::from_components(MAX_TIMESTAMP, MAX_SEQUENCE);
        assert_eq!(id.timestamp(), MAX_TIMESTAMP);
        assert_eq!(id.sequence(), MAX_SEQUENCE);
        assert_eq!(id.to_raw() >> (TIMESTAMP_BITS + SEQUENCE_BITS), 0);
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = FlakeId::from_components(10, MAX_SEQUENCE);
        let b = FlakeId::from_components(11, 0);
        let c = FlakeId::from_components(11, 1);
        assert!(a < b && b < c);
        assert!(a.to_raw() < b.to_raw());
    }

    #[test]
    fn unix_millis_adds_epoch() {
        let id = FlakeId::from_components(1_000, 3);
        assert_eq!(id.unix_millis(1_546_272_000_000), 1_546_272_001_000);
    }
}
