//! The key abstraction.
//!
//! A key is the monomial part of a term. The traits here are the
//! customization points the container, the operators and the
//! multiplier are generic over; packed monomial types implement them.

use std::fmt::Debug;
use std::hash::Hash;

use epicycle_core::{ByteSize, Degree, Result, SymbolMap};

/// A series key.
///
/// Implementations are compact packed values; all operations that need
/// the exponent count take the symbol-set size (`arity`) explicitly,
/// so the key itself stores nothing but packed words.
pub trait Key:
    Clone + Eq + Hash + Debug + ByteSize + Send + Sync + 'static
{
    /// The unit key (all exponents zero) for `arity` symbols.
    fn unit(arity: usize) -> Self;

    /// Builds a key from an exponent vector.
    ///
    /// Fails with [`epicycle_core::KernelError::InvalidShape`] if an
    /// exponent does not fit the packed layout.
    fn from_exponents(exps: &[i64]) -> Result<Self>;

    /// Returns true if this key has the layout expected for `arity`
    /// symbols.
    fn is_compatible(&self, arity: usize) -> bool;

    /// Returns true if this key is the unit for `arity` symbols.
    fn is_unit(&self, arity: usize) -> bool;

    /// Returns true if this key is identically zero as a factor, so
    /// any term carrying it is zero regardless of its coefficient.
    ///
    /// Polynomial keys are never zero; the sine monomial with an
    /// all-zero multiplier vector is. The container never stores a
    /// term with a zero key.
    fn is_zero_key(&self, arity: usize) -> bool;

    /// Writes the exponent vector into `out` (cleared first).
    fn unpack(&self, arity: usize, out: &mut Vec<i64>);

    /// A stable 64-bit hash of the packed representation.
    ///
    /// Equal keys hash equal; the low bits select the destination
    /// segment in the term container.
    fn key_hash(&self) -> u64;

    /// Re-indexes the key into a merged symbol set.
    ///
    /// `map[i]` gives the merged position of operand position `i`;
    /// positions of the merged set not covered by the map get exponent
    /// zero.
    fn remap(&self, map: &SymbolMap, new_arity: usize) -> Result<Self>;

    /// Re-packs the key keeping only the exponents at the `kept`
    /// positions, in order.
    ///
    /// The shrink-direction counterpart of [`Key::remap`]: series use
    /// it to compact their symbol set after identifying positions with
    /// a zero exponent in every term.
    fn trim(&self, kept: &[usize], arity: usize) -> Result<Self>;
}

/// Keys that multiply by exponent-wise addition.
pub trait KeyMul: Key {
    /// Multiplies two keys, failing with
    /// [`epicycle_core::KernelError::MonomialOverflow`] if a packed
    /// slot overflows.
    fn try_mul(&self, rhs: &Self, arity: usize) -> Result<Self>;
}

/// Keys with a degree that is additive under multiplication:
/// `degree(a * b) == degree(a) + degree(b)`.
pub trait HasDegree: Key {
    /// The total degree (sum of exponents).
    fn degree(&self, arity: usize) -> Degree;

    /// The partial degree: the sum of exponents at the given symbol
    /// positions. `subset` must be sorted and in range.
    fn degree_over(&self, subset: &[usize], arity: usize) -> Degree;
}
