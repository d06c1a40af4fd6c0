//! Value interning.
//!
//! This module provides the process-wide interning infrastructure used
//! for truncation tags: equal values share a single storage cell, so
//! comparison degenerates to a pointer check and the storage lives
//! exactly as long as the last handle referencing it.

use std::hash::Hash;
use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use parking_lot::RwLock;

/// A concurrent interning table.
///
/// Values are stored behind [`Arc`]s; the table itself only holds weak
/// references, so interned values are released once the last external
/// handle is dropped. Insertion is idempotent: interning an equal value
/// twice yields the same storage.
#[derive(Debug)]
pub struct Interner<T> {
    inner: RwLock<InternerInner<T>>,
}

#[derive(Debug)]
struct InternerInner<T> {
    map: HashMap<T, Weak<T>>,
    /// Dead weak entries are purged when the map grows past this mark.
    purge_at: usize,
}

impl<T: Clone + Eq + Hash> Default for Interner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> Interner<T> {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(InternerInner {
                map: HashMap::new(),
                purge_at: 64,
            }),
        }
    }

    /// Interns a value, returning a shared handle to canonical storage.
    ///
    /// If an equal value is already interned, its existing storage is
    /// returned.
    pub fn intern(&self, value: T) -> Arc<T> {
        if let Some(existing) = self
            .inner
            .read()
            .map
            .get(&value)
            .and_then(Weak::upgrade)
        {
            return existing;
        }

        let mut inner = self.inner.write();

        // Re-check under the write lock; another thread may have
        // interned the value in the meantime.
        if let Some(existing) = inner.map.get(&value).and_then(Weak::upgrade) {
            return existing;
        }

        if inner.map.len() >= inner.purge_at {
            inner.map.retain(|_, w| w.strong_count() > 0);
            inner.purge_at = (inner.map.len() * 2).max(64);
        }

        let arc = Arc::new(value.clone());
        inner.map.insert(value, Arc::downgrade(&arc));
        arc
    }

    /// Returns the number of live interned values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .map
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Returns true if no live values are interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
