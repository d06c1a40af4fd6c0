//! Trigonometric monomials.
//!
//! A trigonometric monomial is `cos(k · x)` or `sin(k · x)` for an
//! integer multiplier vector `k`: the dynamic packed layout plus a
//! type bit (true for cosine). Since `cos(-k·x) = cos(k·x)` and
//! `sin(-k·x) = -sin(k·x)`, only one sign of each multiplier vector is
//! canonical: the first nonzero multiplier must be positive.
//! Constructors reject non-canonical inputs.

use std::mem;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use epicycle_core::{ByteSize, KernelError, Result, SymbolMap};

use crate::dynamic::DynMonomial;
use crate::key::Key;

/// A packed trigonometric monomial.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrigMonomial<const PSIZE: u32 = 8> {
    multipliers: DynMonomial<PSIZE>,
    cosine: bool,
}

impl<const PSIZE: u32> Default for TrigMonomial<PSIZE> {
    fn default() -> Self {
        Self {
            multipliers: DynMonomial::default(),
            cosine: true,
        }
    }
}

impl<const PSIZE: u32> TrigMonomial<PSIZE> {
    /// Builds a trigonometric monomial from a multiplier vector and a
    /// type bit.
    ///
    /// Fails with [`KernelError::InvalidShape`] if a multiplier does
    /// not fit the packed layout or if the first nonzero multiplier is
    /// negative.
    pub fn from_multipliers(mults: &[i64], cosine: bool) -> Result<Self> {
        Self::from_parts(DynMonomial::from_exponents(mults)?, cosine)
    }

    /// Assembles a trigonometric monomial from already packed parts,
    /// re-validating canonicity.
    pub fn from_parts(multipliers: DynMonomial<PSIZE>, cosine: bool) -> Result<Self> {
        if let Some(first) = multipliers.first_nonzero() {
            if first < 0 {
                return Err(KernelError::InvalidShape(
                    "first nonzero exponent is negative".to_string(),
                ));
            }
        }
        Ok(Self { multipliers, cosine })
    }

    /// Returns true for a cosine monomial, false for a sine one.
    #[must_use]
    pub fn is_cosine(&self) -> bool {
        self.cosine
    }

    /// Returns the packed multiplier vector.
    #[must_use]
    pub fn multipliers(&self) -> &DynMonomial<PSIZE> {
        &self.multipliers
    }

    /// Returns the multiplier at position `i`.
    #[must_use]
    pub fn multiplier(&self, i: usize) -> i64 {
        self.multipliers.exponent(i)
    }
}

impl<const PSIZE: u32> ByteSize for TrigMonomial<PSIZE> {
    fn byte_size(&self) -> usize {
        mem::size_of::<Self>() + self.multipliers.byte_size()
            - mem::size_of::<DynMonomial<PSIZE>>()
    }
}

impl<const PSIZE: u32> Key for TrigMonomial<PSIZE> {
    fn unit(arity: usize) -> Self {
        // cos(0) = 1 is the multiplicative unit.
        Self {
            multipliers: DynMonomial::unit(arity),
            cosine: true,
        }
    }

    fn from_exponents(exps: &[i64]) -> Result<Self> {
        Self::from_multipliers(exps, true)
    }

    fn is_compatible(&self, arity: usize) -> bool {
        self.multipliers.is_compatible(arity)
    }

    fn is_unit(&self, arity: usize) -> bool {
        self.cosine && self.multipliers.is_unit(arity)
    }

    fn is_zero_key(&self, arity: usize) -> bool {
        // sin(0 · x) is identically zero, whatever the coefficient.
        !self.cosine && self.multipliers.is_unit(arity)
    }

    fn unpack(&self, arity: usize, out: &mut Vec<i64>) {
        self.multipliers.unpack(arity, out);
    }

    fn key_hash(&self) -> u64 {
        // Flip a high bit for sine so cos(k·x) and sin(k·x) land apart.
        self.multipliers.key_hash() ^ (u64::from(!self.cosine) << 63)
    }

    fn remap(&self, map: &SymbolMap, new_arity: usize) -> Result<Self> {
        Self::from_parts(self.multipliers.remap(map, new_arity)?, self.cosine)
    }

    fn trim(&self, kept: &[usize], arity: usize) -> Result<Self> {
        Self::from_parts(self.multipliers.trim(kept, arity)?, self.cosine)
    }
}

impl<const PSIZE: u32> Serialize for TrigMonomial<PSIZE> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.multipliers, self.cosine).serialize(serializer)
    }
}

impl<'de, const PSIZE: u32> Deserialize<'de> for TrigMonomial<PSIZE> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (multipliers, cosine) = <(DynMonomial<PSIZE>, bool)>::deserialize(deserializer)?;
        Self::from_parts(multipliers, cosine).map_err(D::Error::custom)
    }
}
