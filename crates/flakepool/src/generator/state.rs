//! Packed generator state.
//!
//! Timestamp, sequence and a publish version share one `u64` so the whole
//! triple is replaced by a single compare-and-swap:
//!
//! ```text
//!  Bit Index:  63 .. 56   55 .. 15    14 .. 0
//!              +---------+-----------+----------+
//!  Field:      | version | timestamp | sequence |
//!              +---------+-----------+----------+
//! ```
//!
//! The low 56 bits are exactly the last published [`FlakeId`].

use crate::{FlakeId, SEQUENCE_BITS, TIMESTAMP_BITS};

const VERSION_SHIFT: u32 = TIMESTAMP_BITS + SEQUENCE_BITS;
const ID_MASK: u64 = (1 << VERSION_SHIFT) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct State(u64);

impl State {
    pub(crate) const fn new(timestamp: u64, sequence: u64, version: u8) -> Self {
        let id = FlakeId::from_components(timestamp, sequence).to_raw();
        Self(((version as u64) << VERSION_SHIFT) | id)
    }

    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) const fn raw(self) -> u64 {
        self.0
    }

    pub(crate) const fn id(self) -> FlakeId {
        FlakeId::from_raw(self.0 & ID_MASK)
    }

    pub(crate) const fn timestamp(self) -> u64 {
        self.id().timestamp()
    }

    pub(crate) const fn sequence(self) -> u64 {
        self.id().sequence()
    }

    pub(crate) const fn version(self) -> u8 {
        (self.0 >> VERSION_SHIFT) as u8
    }

    /// The state that publishes `(timestamp, sequence)` on top of `self`.
    pub(crate) const fn advance(self, timestamp: u64, sequence: u64) -> Self {
        Self::new(timestamp, sequence, self.version().wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_SEQUENCE, MAX_TIMESTAMP};

    #[test]
    fn fields_do_not_overlap() {
        let state = State::new(MAX_TIMESTAMP, MAX_SEQUENCE, u8::MAX);
        assert_eq!(state.timestamp(), MAX_TIMESTAMP);
        assert_eq!(state.sequence(), MAX_SEQUENCE);
        assert_eq!(state.version(), u8::MAX);
        assert_eq!(state.raw(), u64::MAX);
    }

    #[test]
    fn advance_bumps_version_and_wraps() {
        let state = State::new(5, 9, u8::MAX).advance(6, 0);
        assert_eq!(state.version(), 0);
        assert_eq!(state.timestamp(), 6);
        assert_eq!(state.sequence(), 0);
        assert_eq!(state.id(), FlakeId::from_components(6, 0));
    }

    #[test]
    fn id_excludes_version() {
        let a = State::new(100, 1, 3);
        let b = State::new(100, 1, 200);
        assert_ne!(a.raw(), b.raw());
        assert_eq!(a.id(), b.id());
    }
}
