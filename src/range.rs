use serde::{Deserialize, Serialize};

mod merge;

pub use merge::*;

/// An arc of the ring bounded exclusively below and inclusively above
/// (`(start, end]`).
///
/// A position on the ring serves every hash after its predecessor up to and
/// including itself, so this is the shape of the key space owned by a
/// position.
///
/// If `start >= end`, the range is considered wrapping and covers both
/// `(start..)` and `(..=end)`. If `start == end`, it covers the whole ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange<P> {
    pub start: P,
    pub end: P,
}

impl<P> KeyRange<P> {
    /// Creates a `KeyRange`.
    pub fn new(start: P, end: P) -> Self {
        Self { start, end }
    }
}

impl<P: Ord> KeyRange<P> {
    /// Returns `true` if the range crosses the top of the ring.
    pub fn is_wrapping(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if the range covers every hash.
    pub fn is_full(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if a key hashing to `hash` is served from this range.
    pub fn contains(&self, hash: &P) -> bool {
        if self.is_wrapping() {
            *hash > self.start || *hash <= self.end
        } else {
            *hash > self.start && *hash <= self.end
        }
    }
}

impl KeyRange<u32> {
    /// Number of hashes covered by the range.
    pub fn size(&self) -> u64 {
        let span = u64::from(self.end.wrapping_sub(self.start));
        if self.is_full() {
            1 << 32
        } else {
            span
        }
    }
}

impl KeyRange<u64> {
    /// Number of hashes covered by the range.
    pub fn size(&self) -> u128 {
        let span = u128::from(self.end.wrapping_sub(self.start));
        if self.is_full() {
            1 << 64
        } else {
            span
        }
    }
}
