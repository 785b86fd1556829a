//! Hash functions used to place targets and keys on the ring.

use {
    siphasher::sip::SipHasher,
    std::{
        fmt::Debug,
        hash::{BuildHasher, Hash, Hasher},
    },
};

/// Separator between a target name and its replica ordinal.
pub const REPLICA_SEPARATOR: char = '-';

/// A hash builder that maps byte strings to positions on the ring.
///
/// The same builder must be used for every position and every lookup of a
/// given ring, which is why `Ring` stores it for its whole lifetime.
pub trait RingHasher: BuildHasher + Clone {
    type Position: Copy + Ord + Hash + Debug + Into<u64>;

    fn position(&self, bytes: &[u8]) -> Self::Position;
}

/// Default hash builder. Based on CRC-32 (IEEE), which produces 32-bit
/// positions.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32HashBuilder;

impl BuildHasher for Crc32HashBuilder {
    type Hasher = crc32fast::Hasher;

    fn build_hasher(&self) -> Self::Hasher {
        crc32fast::Hasher::new()
    }
}

impl RingHasher for Crc32HashBuilder {
    type Position = u32;

    fn position(&self, bytes: &[u8]) -> Self::Position {
        let mut hasher = self.build_hasher();
        hasher.update(bytes);
        hasher.finalize()
    }
}

/// Hash builder based on `SipHasher`, which produces 64-bit positions.
#[derive(Debug, Default, Clone, Copy)]
pub struct SipHashBuilder;

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

impl RingHasher for SipHashBuilder {
    type Position = u64;

    fn position(&self, bytes: &[u8]) -> Self::Position {
        let mut hasher = self.build_hasher();
        hasher.write(bytes);
        hasher.finish()
    }
}

/// Returns the string hashed for replica `ordinal` of target `name`.
/// Ordinals start at 1.
#[inline]
pub fn replica_key(name: &str, ordinal: usize) -> String {
    format!("{name}{REPLICA_SEPARATOR}{ordinal}")
}
