//! Ordered symbol sets.
//!
//! A symbol set is an immutable sorted sequence of distinct variable
//! names; the index of a name is its position. Two series over
//! different symbol sets are combined by first merging the sets and
//! re-indexing the exponents of each operand into the merged set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maps the indices of one symbol set into the indices of a merged set.
///
/// `map[i]` is the position in the merged set of the symbol that sat at
/// position `i` in the operand set.
pub type SymbolMap = Vec<usize>;

/// An ordered set of distinct symbol names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolSet {
    /// Sorted, duplicate-free names.
    names: Vec<String>,
}

impl SymbolSet {
    /// Creates an empty symbol set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a symbol set from names.
    ///
    /// Names are sorted and duplicates removed.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort_unstable();
        names.dedup();
        Self { names }
    }

    /// Returns the number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the set holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the name at position `idx`.
    #[must_use]
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    /// Returns the position of `name`, if present.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    /// Returns true if `name` belongs to the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns true if every symbol of `other` belongs to this set.
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.iter().all(|n| self.contains(n))
    }

    /// Iterates over the names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Merges two symbol sets into their sorted union.
    ///
    /// Returns the merged set and, for each operand, the map from its
    /// indices to the merged indices. Merging is commutative and
    /// idempotent; merging a set with itself yields identity maps.
    #[must_use]
    pub fn merge(&self, other: &Self) -> (Self, SymbolMap, SymbolMap) {
        let mut names = Vec::with_capacity(self.len() + other.len());
        let mut left = Vec::with_capacity(self.len());
        let mut right = Vec::with_capacity(other.len());

        let (mut i, mut j) = (0, 0);
        while i < self.len() || j < other.len() {
            let take_left = match (self.names.get(i), other.names.get(j)) {
                (Some(a), Some(b)) => a <= b,
                (Some(_), None) => true,
                (None, _) => false,
            };

            if take_left {
                if other.names.get(j) == self.names.get(i) {
                    right.push(names.len());
                    j += 1;
                }
                left.push(names.len());
                names.push(self.names[i].clone());
                i += 1;
            } else {
                right.push(names.len());
                names.push(other.names[j].clone());
                j += 1;
            }
        }

        (Self { names }, left, right)
    }

    /// Returns the indices in this set of the symbols shared with `subset`.
    ///
    /// Used to evaluate partial degrees: the result is sorted and
    /// contains one entry per symbol of `subset` that is also present
    /// here.
    #[must_use]
    pub fn intersection_indices(&self, subset: &Self) -> Vec<usize> {
        subset.iter().filter_map(|n| self.index_of(n)).collect()
    }
}

impl fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.names.join(", "))
    }
}
