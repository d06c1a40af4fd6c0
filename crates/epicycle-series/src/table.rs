//! The segmented term container.
//!
//! Terms live in `2^L` independent open-addressed hash maps; a key's
//! segment is selected by the low `L` bits of its hash, and the full
//! hash drives probing inside the segment. The split gives the
//! multiplier, the filter and the byte-size accountant natural
//! parallel granules while keeping monomials unique across the whole
//! container.

use std::iter;
use std::mem;
use std::vec;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use rayon::prelude::*;

use epicycle_core::{ByteSize, Coefficient, Result};
use epicycle_monomial::Key;

/// Nominal per-segment capacity used by the growth policy.
pub const SEGMENT_TARGET: usize = 2048;

/// A hash table of (key, coefficient) bindings, sharded into `2^L`
/// segments by the low bits of the key hash.
///
/// The container never stores a zero coefficient: combining
/// coefficients to zero erases the binding.
#[derive(Clone, Debug)]
pub struct SegmentedTable<K, C> {
    segments: Vec<HashMap<K, C>>,
    log2_segments: u32,
    len: usize,
}

impl<K: Key, C: Coefficient> Default for SegmentedTable<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, C: Coefficient> SegmentedTable<K, C> {
    /// Creates an empty table with a single segment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_log2(0)
    }

    /// Creates an empty table with `2^log2` segments.
    #[must_use]
    pub fn with_log2(log2: u32) -> Self {
        Self {
            segments: (0..1_usize << log2).map(|_| HashMap::new()).collect(),
            log2_segments: log2,
            len: 0,
        }
    }

    /// Assembles a table from pre-filled segments.
    ///
    /// Callers must have placed every key in the segment selected by
    /// its hash; the multiplier's per-range workers guarantee this by
    /// construction.
    #[must_use]
    pub fn from_segments(log2: u32, segments: Vec<HashMap<K, C>>) -> Self {
        debug_assert_eq!(segments.len(), 1_usize << log2);
        let len = segments.iter().map(HashMap::len).sum();
        let table = Self {
            segments,
            log2_segments: log2,
            len,
        };
        debug_assert!(table.check_placement());
        table
    }

    /// Returns the number of stored terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no terms are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the log2 of the segment count.
    #[must_use]
    pub fn log2_segments(&self) -> u32 {
        self.log2_segments
    }

    /// Returns the segment count.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Direct read access to the segments.
    #[must_use]
    pub fn segments(&self) -> &[HashMap<K, C>] {
        &self.segments
    }

    fn segment_for(&self, key: &K) -> usize {
        #[allow(clippy::cast_possible_truncation)]
        {
            (key.key_hash() & ((1_u64 << self.log2_segments) - 1)) as usize
        }
    }

    /// Looks up the coefficient bound to `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&C> {
        self.segments[self.segment_for(key)].get(key)
    }

    /// Inserts a binding known not to collide with a stored key.
    ///
    /// Skips the combine lookup; only call this when uniqueness has
    /// been established independently (fresh multiplier buckets,
    /// injective re-indexing).
    pub fn insert_unique(&mut self, key: K, cf: C) {
        debug_assert!(!cf.is_zero());
        self.reserve(1);
        let seg = self.segment_for(&key);
        let prev = self.segments[seg].insert(key, cf);
        debug_assert!(prev.is_none());
        self.len += 1;
    }

    /// Inserts a binding, combining coefficients on collision.
    ///
    /// If the combined coefficient tests zero the binding is erased.
    pub fn insert_or_combine(&mut self, key: K, cf: C) -> Result<()> {
        if cf.is_zero() {
            return Ok(());
        }
        self.reserve(1);
        let seg = self.segment_for(&key);
        match self.segments[seg].entry(key) {
            Entry::Occupied(mut e) => {
                e.get_mut().try_add_assign(&cf)?;
                if e.get().is_zero() {
                    e.remove();
                    self.len -= 1;
                }
            }
            Entry::Vacant(v) => {
                v.insert(cf);
                self.len += 1;
            }
        }
        Ok(())
    }

    /// Retains the bindings satisfying `pred`, scanning segments in
    /// parallel.
    pub fn retain<P>(&mut self, pred: P)
    where
        P: Fn(&K, &C) -> bool + Sync,
    {
        self.segments
            .par_iter_mut()
            .for_each(|seg| seg.retain(|k, c| pred(k, c)));
        self.len = self.segments.iter().map(HashMap::len).sum();
    }

    /// Removes every binding, keeping the segment layout.
    pub fn clear(&mut self) {
        for seg in &mut self.segments {
            seg.clear();
        }
        self.len = 0;
    }

    /// Iterates over all stored terms, segment by segment.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &C)> {
        self.segments.iter().flat_map(HashMap::iter)
    }

    /// Grows the table until `additional` more terms fit under the
    /// load ceiling (7/8 of `SEGMENT_TARGET` terms per segment on
    /// average). Growing increments `L` and re-shards; it runs on the
    /// calling thread.
    fn reserve(&mut self, additional: usize) {
        while (self.len + additional) * 8 > (SEGMENT_TARGET << self.log2_segments) * 7 {
            self.grow();
        }
    }

    fn grow(&mut self) {
        let old = mem::take(&mut self.segments);
        self.log2_segments += 1;
        self.segments = (0..1_usize << self.log2_segments)
            .map(|_| HashMap::new())
            .collect();
        let mask = (1_u64 << self.log2_segments) - 1;
        for seg in old {
            for (key, cf) in seg {
                #[allow(clippy::cast_possible_truncation)]
                let idx = (key.key_hash() & mask) as usize;
                self.segments[idx].insert(key, cf);
            }
        }
    }

    #[cfg(debug_assertions)]
    fn check_placement(&self) -> bool {
        self.segments.iter().enumerate().all(|(i, seg)| {
            seg.keys().all(|k| self.segment_for(k) == i)
        })
    }

    #[cfg(not(debug_assertions))]
    fn check_placement(&self) -> bool {
        true
    }
}

impl<K: Key, C: Coefficient> IntoIterator for SegmentedTable<K, C> {
    type Item = (K, C);
    type IntoIter = iter::FlatMap<
        vec::IntoIter<HashMap<K, C>>,
        hashbrown::hash_map::IntoIter<K, C>,
        fn(HashMap<K, C>) -> hashbrown::hash_map::IntoIter<K, C>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        let drain: fn(HashMap<K, C>) -> hashbrown::hash_map::IntoIter<K, C> = HashMap::into_iter;
        self.segments.into_iter().flat_map(drain)
    }
}

impl<K: Key + ByteSize, C: Coefficient + ByteSize> ByteSize for SegmentedTable<K, C> {
    fn byte_size(&self) -> usize {
        let owned: usize = self
            .segments
            .par_iter()
            .map(|seg| {
                let buckets = seg.capacity() * (mem::size_of::<(K, C)>() + 1);
                let spill: usize = seg
                    .iter()
                    .map(|(k, c)| {
                        (k.byte_size() - mem::size_of::<K>())
                            + (c.byte_size() - mem::size_of::<C>())
                    })
                    .sum();
                mem::size_of::<HashMap<K, C>>() + buckets + spill
            })
            .sum();
        mem::size_of::<Self>() + owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epicycle_monomial::PackedMonomial;

    fn key(exps: &[i64]) -> PackedMonomial {
        PackedMonomial::from_exponents(exps).unwrap()
    }

    #[test]
    fn test_combine_and_cancel() {
        let mut table = SegmentedTable::<PackedMonomial, i64>::new();
        table.insert_or_combine(key(&[1, 0]), 2).unwrap();
        table.insert_or_combine(key(&[1, 0]), 3).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key(&[1, 0])), Some(&5));

        // Exact cancellation leaves no trace.
        table.insert_or_combine(key(&[1, 0]), -5).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.get(&key(&[1, 0])), None);
    }

    #[test]
    fn test_zero_insert_is_ignored() {
        let mut table = SegmentedTable::<PackedMonomial, i64>::new();
        table.insert_or_combine(key(&[2, 1]), 0).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_growth_preserves_bindings() {
        let mut table = SegmentedTable::<PackedMonomial, i64>::new();
        let n = SEGMENT_TARGET * 2;
        for i in 0..n {
            table.insert_or_combine(key(&[i as i64, 1]), 1).unwrap();
        }

        assert_eq!(table.len(), n);
        assert!(table.log2_segments() >= 1);
        for i in 0..n {
            assert_eq!(table.get(&key(&[i as i64, 1])), Some(&1));
        }
    }

    #[test]
    fn test_segment_placement_invariant() {
        let mut table = SegmentedTable::<PackedMonomial, i64>::with_log2(3);
        for i in 0..500 {
            table.insert_or_combine(key(&[i, i + 1]), 7).unwrap();
        }

        let mask = (1_u64 << table.log2_segments()) - 1;
        for (idx, seg) in table.segments().iter().enumerate() {
            for k in seg.keys() {
                assert_eq!((k.key_hash() & mask) as usize, idx);
            }
        }
    }

    #[test]
    fn test_retain() {
        let mut table = SegmentedTable::<PackedMonomial, i64>::new();
        for i in 0..100 {
            table.insert_or_combine(key(&[i, 0]), i).unwrap();
        }
        table.retain(|k, _| k.exponent(0, 2) % 2 == 0);
        assert_eq!(table.len(), 49);
    }

    #[test]
    fn test_flat_iteration_covers_all_segments() {
        let mut table = SegmentedTable::<PackedMonomial, i64>::with_log2(2);
        for i in 0..64 {
            table.insert_or_combine(key(&[i, 3]), 1).unwrap();
        }
        assert_eq!(table.iter().count(), 64);
        let total: i64 = table.iter().map(|(_, c)| *c).sum();
        assert_eq!(total, 64);
    }
}
