//! Fixed-size packed monomials.
//!
//! All exponents share a single `u64`, each in a slot of `64 / n` bits
//! for `n` symbols. Exponents are unsigned; the high-order exponent
//! occupies the most significant slot.

use std::mem;

use serde::{Deserialize, Serialize};

use epicycle_core::{ByteSize, Degree, KernelError, Result, SymbolMap};

use crate::key::{HasDegree, Key, KeyMul};
use crate::kpack;

/// A monomial packed into one machine word.
///
/// Supports up to 64 symbols; with `n` symbols each exponent gets
/// `64 / n` bits. The unit monomial is the all-zero word.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PackedMonomial(u64);

impl PackedMonomial {
    /// Most symbols a single word can hold.
    pub const MAX_SYMBOLS: usize = 64;

    #[allow(clippy::cast_possible_truncation)]
    fn width(arity: usize) -> u32 {
        debug_assert!(arity >= 1 && arity <= Self::MAX_SYMBOLS);
        64 / arity as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    fn shift(i: usize, arity: usize) -> u32 {
        // Exponent 0 sits in the most significant slot.
        (arity - 1 - i) as u32 * Self::width(arity)
    }

    /// Returns the exponent at position `i` for `arity` symbols.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn exponent(&self, i: usize, arity: usize) -> i64 {
        let w = Self::width(arity);
        ((self.0 >> Self::shift(i, arity)) & kpack::slot_mask(w)) as i64
    }

    /// Returns the raw packed word.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl ByteSize for PackedMonomial {
    fn byte_size(&self) -> usize {
        mem::size_of::<Self>()
    }
}

impl Key for PackedMonomial {
    fn unit(_arity: usize) -> Self {
        Self(0)
    }

    #[allow(clippy::cast_sign_loss)]
    fn from_exponents(exps: &[i64]) -> Result<Self> {
        let arity = exps.len();
        if arity == 0 {
            return Ok(Self(0));
        }
        if arity > Self::MAX_SYMBOLS {
            return Err(KernelError::InvalidShape(format!(
                "{arity} exponents do not fit a single packed word"
            )));
        }

        let w = Self::width(arity);
        let max = kpack::unsigned_max(w);
        let mut word = 0_u64;
        for (i, &e) in exps.iter().enumerate() {
            if e < 0 || e > max {
                return Err(KernelError::InvalidShape(format!(
                    "exponent {e} at position {i} is outside [0, {max}]"
                )));
            }
            word |= (e as u64) << Self::shift(i, arity);
        }
        Ok(Self(word))
    }

    fn is_compatible(&self, arity: usize) -> bool {
        arity <= Self::MAX_SYMBOLS && (arity > 0 || self.0 == 0)
    }

    fn is_unit(&self, _arity: usize) -> bool {
        self.0 == 0
    }

    fn is_zero_key(&self, _arity: usize) -> bool {
        false
    }

    fn unpack(&self, arity: usize, out: &mut Vec<i64>) {
        out.clear();
        out.extend((0..arity).map(|i| self.exponent(i, arity)));
    }

    fn key_hash(&self) -> u64 {
        kpack::mix64(self.0)
    }

    fn remap(&self, map: &SymbolMap, new_arity: usize) -> Result<Self> {
        let mut exps = vec![0_i64; new_arity];
        for (i, &mi) in map.iter().enumerate() {
            exps[mi] = self.exponent(i, map.len());
        }
        Self::from_exponents(&exps)
    }

    fn trim(&self, kept: &[usize], arity: usize) -> Result<Self> {
        let trimmed: Vec<i64> = kept.iter().map(|&i| self.exponent(i, arity)).collect();
        Self::from_exponents(&trimmed)
    }
}

impl KeyMul for PackedMonomial {
    fn try_mul(&self, rhs: &Self, arity: usize) -> Result<Self> {
        if arity == 0 {
            return Ok(Self(0));
        }

        let w = Self::width(arity);
        let max = kpack::unsigned_max(w);
        let mut word = 0_u64;
        for i in 0..arity {
            let sum = self.exponent(i, arity) + rhs.exponent(i, arity);
            if sum > max {
                return Err(KernelError::MonomialOverflow(format!(
                    "exponent sum {sum} at position {i} exceeds {max}"
                )));
            }
            #[allow(clippy::cast_sign_loss)]
            {
                word |= (sum as u64) << Self::shift(i, arity);
            }
        }
        Ok(Self(word))
    }
}

impl HasDegree for PackedMonomial {
    fn degree(&self, arity: usize) -> Degree {
        (0..arity).map(|i| self.exponent(i, arity)).sum()
    }

    fn degree_over(&self, subset: &[usize], arity: usize) -> Degree {
        subset.iter().map(|&i| self.exponent(i, arity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_round_trip() {
        let m = PackedMonomial::from_exponents(&[3, 0, 7]).unwrap();
        let mut exps = Vec::new();
        m.unpack(3, &mut exps);
        assert_eq!(exps, vec![3, 0, 7]);
        assert_eq!(PackedMonomial::from_exponents(&exps).unwrap(), m);
    }

    #[test]
    fn test_unit() {
        let u = PackedMonomial::unit(4);
        assert!(u.is_unit(4));
        assert_eq!(u.degree(4), 0);
        // Polynomial keys are never identically zero.
        assert!(!u.is_zero_key(4));
    }

    #[test]
    fn test_trim_keeps_selected_positions() {
        let m = PackedMonomial::from_exponents(&[3, 0, 7]).unwrap();
        let t = m.trim(&[0, 2], 3).unwrap();
        let mut exps = Vec::new();
        t.unpack(2, &mut exps);
        assert_eq!(exps, vec![3, 7]);
    }

    #[test]
    fn test_rejects_out_of_range() {
        // Two symbols leave 32 bits per slot.
        assert!(PackedMonomial::from_exponents(&[1_i64 << 33, 0]).is_err());
        assert!(PackedMonomial::from_exponents(&[-1, 0]).is_err());
        assert!(PackedMonomial::from_exponents(&[0; 65]).is_err());
    }

    #[test]
    fn test_mul_adds_exponents() {
        let a = PackedMonomial::from_exponents(&[1, 0, 2]).unwrap();
        let b = PackedMonomial::from_exponents(&[0, 4, 1]).unwrap();
        let ab = a.try_mul(&b, 3).unwrap();

        let mut exps = Vec::new();
        ab.unpack(3, &mut exps);
        assert_eq!(exps, vec![1, 4, 3]);
        assert_eq!(ab.degree(3), 8);
    }

    #[test]
    fn test_mul_overflow() {
        // 16 symbols leave 4 bits per slot: max exponent 15.
        let mut exps = vec![0_i64; 16];
        exps[5] = 15;
        let a = PackedMonomial::from_exponents(&exps).unwrap();
        exps[5] = 1;
        let b = PackedMonomial::from_exponents(&exps).unwrap();
        assert!(matches!(
            a.try_mul(&b, 16),
            Err(KernelError::MonomialOverflow(_))
        ));
    }

    #[test]
    fn test_equal_monomials_hash_equal() {
        let a = PackedMonomial::from_exponents(&[2, 5]).unwrap();
        let b = PackedMonomial::from_exponents(&[2, 5]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key_hash(), b.key_hash());
    }

    #[test]
    fn test_degree_over() {
        let m = PackedMonomial::from_exponents(&[1, 2, 3, 4]).unwrap();
        assert_eq!(m.degree_over(&[0, 2], 4), 4);
        assert_eq!(m.degree_over(&[], 4), 0);
    }

    #[test]
    fn test_remap_pads_with_zeros() {
        let m = PackedMonomial::from_exponents(&[2, 3]).unwrap();
        // Old positions 0, 1 move to merged positions 0, 2 of 3.
        let r = m.remap(&vec![0, 2], 3).unwrap();
        let mut exps = Vec::new();
        r.unpack(3, &mut exps);
        assert_eq!(exps, vec![2, 0, 3]);
    }

    #[test]
    fn test_serde_round_trip() {
        let m = PackedMonomial::from_exponents(&[9, 1, 0, 4]).unwrap();
        let bytes = bincode::serialize(&m).unwrap();
        let back: PackedMonomial = bincode::deserialize(&bytes).unwrap();
        assert_eq!(m, back);
    }
}
