// MIT License

// Copyright (c) 2016 Jerome Froelich

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! A consistent hashing ring as described in [Consistent Hashing and Random
//! Trees: Distributed Caching Protocols for Relieving Hot Spots on the World
//! Wide Web] (https://www.akamai.com/es/es/multimedia/documents/technical-publication/consistent-hashing-and-random-trees-distributed-caching-protocols-for-relieving-hot-spots-on-the-world-wide-web-technical-publication.pdf).
//!
//! A `Ring` assigns arbitrary keys to one of a dynamic set of named targets.
//! Every target is placed on the ring at `replication_factor` pseudo-random
//! positions, and a key is served by the first position at or after its own
//! hash, wrapping around past the highest position. Adding or removing a
//! target only remaps the keys adjacent to its positions.
//!
//! `Ring`'s API consists of three methods: `insert`, `remove`, and `find`
//! for adding a target to the ring, removing a target from the ring, and
//! getting the target responsible for the provided key.
//!
//! ## Example
//!
//! ``` rust
//! use consistent_hashring::Ring;
//!
//! let mut ring = Ring::new(100).unwrap();
//!
//! ring.insert("10.0.0.1:11211").unwrap();
//! ring.insert("10.0.0.2:11211").unwrap();
//! ring.insert("10.0.0.3:11211").unwrap();
//!
//! let target = ring.find("user:1234").unwrap();
//! assert!(ring.contains(target));
//!
//! // A preference list of distinct targets, e.g. for replicated writes.
//! let targets = ring.find_n("user:1234", 2).unwrap();
//! assert_eq!(targets[0], target);
//! assert_eq!(targets.len(), 2);
//! ```
//!
//! For concurrent use wrap the ring in a [`SharedRing`].

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
};

pub use {
    config::{RingConfig, DEFAULT_REPLICATION_FACTOR},
    hasher::{replica_key, Crc32HashBuilder, RingHasher, SipHashBuilder, REPLICA_SEPARATOR},
    range::{merge_adjacent, KeyRange},
    shared::SharedRing,
};

pub mod config;
pub mod hasher;
pub mod range;
pub mod shared;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Position {position:#x} is already occupied by {occupant:?}")]
    Collision { position: u64, occupant: String },

    #[error("Ring is empty")]
    EmptyRing,
}

/// Hash Ring
///
/// The ring keeps two structures in lockstep: `index`, the sorted list of
/// occupied positions, and `catalog`, which maps each position to the target
/// that owns it.
#[derive(Clone)]
pub struct Ring<S: RingHasher = Crc32HashBuilder> {
    hash_builder: S,
    replication_factor: usize,
    index: Vec<S::Position>,
    catalog: HashMap<S::Position, String>,
}

impl<S: RingHasher> fmt::Debug for Ring<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("replication_factor", &self.replication_factor)
            .field("positions", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl Ring {
    /// Creates an empty `Ring` placing `replication_factor` positions per
    /// target. Fails if `replication_factor` is zero.
    pub fn new(replication_factor: usize) -> Result<Self, Error> {
        Self::with_hasher(replication_factor, Crc32HashBuilder)
    }

    /// Creates an empty `Ring` from `config`.
    pub fn from_config(config: &RingConfig) -> Result<Self, Error> {
        Self::new(config.replication_factor)
    }
}

impl<S: RingHasher> Ring<S> {
    /// Creates an empty `Ring` which will use the given hash builder.
    pub fn with_hasher(replication_factor: usize, hash_builder: S) -> Result<Self, Error> {
        RingConfig::new(replication_factor).validate()?;

        Ok(Ring {
            hash_builder,
            replication_factor,
            index: Vec::new(),
            catalog: HashMap::new(),
        })
    }

    /// Returns the configuration this ring was built with.
    pub fn config(&self) -> RingConfig {
        RingConfig::new(self.replication_factor)
    }

    #[inline]
    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// Get the number of occupied positions in the ring.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the ring has no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Occupied positions, ascending.
    #[inline]
    pub fn positions(&self) -> &[S::Position] {
        &self.index
    }

    /// Hashes `key` and returns its position on the ring.
    #[inline]
    pub fn key(&self, key: impl AsRef<[u8]>) -> S::Position {
        self.hash_builder.position(key.as_ref())
    }

    /// Adds every replica of `name` to the ring.
    ///
    /// Fails with `Error::Collision` if any replica position is already
    /// occupied, in which case the ring is left untouched.
    pub fn insert(&mut self, name: &str) -> Result<(), Error> {
        let positions = self.replica_positions(name);

        let mut seen = HashSet::with_capacity(positions.len());

        for position in &positions {
            let occupant = match self.catalog.get(position) {
                Some(occupant) => occupant.as_str(),
                None if !seen.insert(*position) => name,
                None => continue,
            };

            tracing::debug!(name, ?position, occupant, "ring position collision");

            return Err(Error::Collision {
                position: (*position).into(),
                occupant: occupant.to_owned(),
            });
        }

        for &position in &positions {
            self.catalog.insert(position, name.to_owned());
        }
        self.index.extend(positions);
        self.index.sort_unstable();

        tracing::debug!(name, positions = self.replication_factor, "inserted target");

        Ok(())
    }

    /// Removes every replica position owned by `name` and returns how many
    /// were removed. Positions `name` doesn't own are skipped, so removing an
    /// unknown target is a no-op.
    ///
    /// A replica hash of `name` that is occupied by another target is left
    /// in place even though the position exists: only positions whose owner
    /// is `name` are removed, so every remaining target keeps all of its
    /// replicas.
    pub fn remove(&mut self, name: &str) -> usize {
        let mut removed = 0;

        for position in self.replica_positions(name) {
            let owned = self
                .catalog
                .get(&position)
                .is_some_and(|occupant| occupant.as_str() == name);

            if !owned {
                continue;
            }

            self.catalog.remove(&position);
            if let Ok(index) = self.find_index(&position) {
                self.index.remove(index);
            }
            removed += 1;
        }

        tracing::debug!(name, positions = removed, "removed target");

        removed
    }

    /// Returns the target responsible for `key`, or an error if the ring is
    /// empty.
    pub fn find(&self, key: impl AsRef<[u8]>) -> Result<&str, Error> {
        let position = self.get(key)?;

        tracing::trace!(
            position = ?position.position(),
            name = position.target(),
            "resolved key"
        );

        Ok(position.target())
    }

    /// Returns up to `n` distinct targets for `key`, in the order they are
    /// met walking clockwise from the key's position. The first one is the
    /// target `find` returns.
    pub fn find_n(&self, key: impl AsRef<[u8]>, n: usize) -> Result<Vec<&str>, Error> {
        let start = self.get(key)?;
        let mut targets: Vec<&str> = Vec::with_capacity(n.min(self.index.len()));

        for position in Iter::new(start) {
            if targets.len() == n {
                break;
            }

            let target = position.target();
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        Ok(targets)
    }

    /// Returns the `PositionRef` serving `key`, or an error if the ring is
    /// empty.
    #[inline]
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<PositionRef<'_, S>, Error> {
        self.get_by_position(self.key(key))
    }

    /// Returns the `PositionRef` serving the hash `position`: the first
    /// occupied position at or after it, wrapping to the lowest one.
    pub fn get_by_position(&self, position: S::Position) -> Result<PositionRef<'_, S>, Error> {
        if self.index.is_empty() {
            return Err(Error::EmptyRing);
        }

        let index = self.find_index(&position).unwrap_or_else(|index| index);
        let index = if index == self.index.len() { 0 } else { index };

        Ok(PositionRef { ring: self, index })
    }

    /// Number of positions currently owned by `name`. Equals the
    /// replication factor for any inserted target.
    pub fn count_for(&self, name: &str) -> usize {
        self.replica_positions(name)
            .iter()
            .filter(|position| {
                self.catalog
                    .get(*position)
                    .is_some_and(|occupant| occupant.as_str() == name)
            })
            .count()
    }

    /// Returns true if `name` owns any position on the ring.
    pub fn contains(&self, name: &str) -> bool {
        self.count_for(name) > 0
    }

    /// Distinct targets on the ring, sorted by name.
    pub fn targets(&self) -> Vec<&str> {
        self.catalog
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Key ranges served by `name`, with adjacent ranges merged.
    pub fn ranges_for(&self, name: &str) -> Vec<KeyRange<S::Position>> {
        merge_adjacent(
            self.iter(None)
                .filter(|position| position.target() == name)
                .map(|position| position.range()),
        )
    }

    /// Walks every position once, clockwise, starting from the position
    /// serving `start` (or the lowest position).
    pub fn iter(&self, start: impl Into<Option<S::Position>>) -> Iter<'_, S> {
        let start = match start.into() {
            Some(position) => self.get_by_position(position).ok(),
            None if self.index.is_empty() => None,
            None => Some(PositionRef {
                ring: self,
                index: 0,
            }),
        };

        start.map(Iter::new).unwrap_or(Iter::empty())
    }

    fn replica_positions(&self, name: &str) -> Vec<S::Position> {
        (1..=self.replication_factor)
            .map(|ordinal| self.key(replica_key(name, ordinal)))
            .collect()
    }

    #[inline]
    fn find_index(&self, position: &S::Position) -> Result<usize, usize> {
        self.index.binary_search(position)
    }

    #[inline]
    fn wrap_index(&self, index: usize) -> usize {
        index % self.index.len()
    }
}

/// Reference to an occupied position. Acts as an iterator (using `prev()` and
/// `next()` methods), and exposes the owning target and the range served.
#[derive(Clone)]
pub struct PositionRef<'a, S: RingHasher> {
    ring: &'a Ring<S>,
    index: usize,
}

impl<'a, S: RingHasher> fmt::Debug for PositionRef<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionRef")
            .field("position", &self.position())
            .field("target", &self.target())
            .finish()
    }
}

impl<'a, S: RingHasher> PositionRef<'a, S> {
    #[inline]
    pub fn position(&self) -> S::Position {
        self.ring.index[self.index]
    }

    /// Name of the target owning this position.
    #[inline]
    pub fn target(&self) -> &'a str {
        // Index and catalog hold the same positions.
        &self.ring.catalog[&self.ring.index[self.index]]
    }

    /// Returns the previous position on the ring. If the ring contains only
    /// one position, the returned reference will be for the same position.
    #[inline]
    pub fn prev(&self) -> Self {
        let ring = self.ring;

        Self {
            ring,
            index: ring.wrap_index(ring.len() + self.index - 1),
        }
    }

    /// Returns the next position on the ring. If the ring contains only one
    /// position, the returned reference will be for the same position.
    #[inline]
    pub fn next(&self) -> Self {
        let ring = self.ring;

        Self {
            ring,
            index: ring.wrap_index(self.index + 1),
        }
    }

    /// Returns the range of hashes served by this position.
    #[inline]
    pub fn range(&self) -> KeyRange<S::Position> {
        KeyRange::new(self.prev().position(), self.position())
    }
}

pub struct Iter<'a, S: RingHasher> {
    start: usize,
    next: Option<PositionRef<'a, S>>,
}

impl<'a, S: RingHasher> Iter<'a, S> {
    pub fn new(position: PositionRef<'a, S>) -> Self {
        Self {
            start: position.index,
            next: Some(position),
        }
    }

    pub fn empty() -> Self {
        Self {
            start: 0,
            next: None,
        }
    }
}

impl<'a, S: RingHasher> Iterator for Iter<'a, S> {
    type Item = PositionRef<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take();

        if let Some(current) = &current {
            let next = current.next();

            if next.index != self.start {
                self.next = Some(next);
            }
        }

        current
    }
}
