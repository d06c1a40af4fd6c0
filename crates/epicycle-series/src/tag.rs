//! Series tags.
//!
//! The tag is a phantom discriminator that specializes a series's
//! algebraic behavior. Plain polynomials use [`Untagged`]; the
//! power-series layer supplies a truncation-carrying tag. Binary
//! operators combine the operand tags through [`SeriesTag::try_combine`]
//! and apply the resulting retention predicate to every inserted term.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use epicycle_core::{Degree, Result, SymbolSet};
use epicycle_monomial::{HasDegree, Key};

/// A degree bound resolved against a concrete symbol set, consumed by
/// the multiplier for early pair rejection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DegreeBound {
    /// Bound on the total degree.
    Total(Degree),
    /// Bound on the partial degree over the given symbol positions.
    Partial(Degree, Vec<usize>),
}

impl DegreeBound {
    /// The bounding degree.
    #[must_use]
    pub fn limit(&self) -> Degree {
        match self {
            Self::Total(d) | Self::Partial(d, _) => *d,
        }
    }

    /// The (partial) degree of a key under this bound's metric.
    #[must_use]
    pub fn key_degree<K: HasDegree>(&self, key: &K, arity: usize) -> Degree {
        match self {
            Self::Total(_) => key.degree(arity),
            Self::Partial(_, subset) => key.degree_over(subset, arity),
        }
    }
}

/// The behavior a tag contributes to its series.
pub trait SeriesTag<K: Key>:
    Clone + Debug + Default + PartialEq + Send + Sync + 'static
{
    /// Combines the tags of two operands of a binary operation.
    ///
    /// Fails with
    /// [`epicycle_core::KernelError::IncompatibleTruncation`] when the
    /// tags disagree.
    fn try_combine(&self, other: &Self) -> Result<Self>;

    /// Returns true if a term with this key may be stored in a series
    /// carrying this tag.
    fn retains(&self, key: &K, symbols: &SymbolSet) -> bool;

    /// The degree bound enforced by this tag, resolved against
    /// `symbols`, or `None` when the tag does not truncate.
    fn degree_bound(&self, symbols: &SymbolSet) -> Option<DegreeBound>;

    /// Returns true if the tag retains every term.
    fn is_trivial(&self) -> bool;
}

/// The trivial tag: a plain polynomial with no attached policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Untagged;

impl<K: Key> SeriesTag<K> for Untagged {
    fn try_combine(&self, _other: &Self) -> Result<Self> {
        Ok(Self)
    }

    fn retains(&self, _key: &K, _symbols: &SymbolSet) -> bool {
        true
    }

    fn degree_bound(&self, _symbols: &SymbolSet) -> Option<DegreeBound> {
        None
    }

    fn is_trivial(&self) -> bool {
        true
    }
}
