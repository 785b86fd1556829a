//! A `Ring` that can be shared between threads.
//!
//! Lookups take a read lock and run in parallel. `insert` and `remove` take
//! the write lock, so a lookup never observes a half-updated index.

use {
    crate::{Crc32HashBuilder, Error, Ring, RingHasher},
    std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Cloneable handle to a ring guarded by a reader/writer lock.
pub struct SharedRing<S: RingHasher = Crc32HashBuilder> {
    inner: Arc<RwLock<Ring<S>>>,
}

impl<S: RingHasher> Clone for SharedRing<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl SharedRing {
    pub fn new(replication_factor: usize) -> Result<Self, Error> {
        Ring::new(replication_factor).map(Self::from)
    }
}

impl<S: RingHasher> From<Ring<S>> for SharedRing<S> {
    fn from(ring: Ring<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ring)),
        }
    }
}

impl<S: RingHasher> SharedRing<S> {
    pub fn insert(&self, name: &str) -> Result<(), Error> {
        self.write().insert(name)
    }

    pub fn remove(&self, name: &str) -> usize {
        self.write().remove(name)
    }

    pub fn find(&self, key: impl AsRef<[u8]>) -> Result<String, Error> {
        self.read().find(key).map(str::to_owned)
    }

    pub fn find_n(&self, key: impl AsRef<[u8]>, n: usize) -> Result<Vec<String>, Error> {
        let ring = self.read();
        let targets = ring.find_n(key, n)?;

        Ok(targets.into_iter().map(str::to_owned).collect())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn count_for(&self, name: &str) -> usize {
        self.read().count_for(name)
    }

    /// Returns a copy of the ring as it is right now.
    pub fn snapshot(&self) -> Ring<S> {
        self.read().clone()
    }

    // Mutations validate before touching the ring, so a panicking writer
    // can't leave it inconsistent and poisoning is safe to ignore.
    fn read(&self) -> RwLockReadGuard<'_, Ring<S>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ring<S>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
