//! Dynamically sized packed monomials.
//!
//! Exponents are signed and packed `PSIZE` to a word, each in a
//! two's-complement slot of `64 / PSIZE` bits. The number of words
//! grows with the symbol count; the final word may be partially
//! filled, with its unused low slots kept at zero so equality and
//! hashing stay exponent-wise. `PSIZE = 1` degenerates to one exponent
//! per word; it is supported as a correctness path.

use std::mem;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use epicycle_core::{ByteSize, Degree, KernelError, Result, SymbolMap};

use crate::key::{HasDegree, Key, KeyMul};
use crate::kpack;

/// The default packed size: eight exponents per word, each in
/// `[-128, 127]`.
pub const DEFAULT_PSIZE: u32 = 8;

/// A packed monomial over a variable number of words.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DynMonomial<const PSIZE: u32 = 8> {
    words: SmallVec<[u64; 2]>,
}

impl<const PSIZE: u32> DynMonomial<PSIZE> {
    /// Bits per exponent slot.
    pub const WIDTH: u32 = {
        assert!(PSIZE >= 1 && PSIZE <= 64);
        64 / PSIZE
    };

    /// Smallest representable exponent.
    pub const MIN_EXPONENT: i64 = kpack::signed_min(Self::WIDTH);

    /// Largest representable exponent.
    pub const MAX_EXPONENT: i64 = kpack::signed_max(Self::WIDTH);

    fn words_for(arity: usize) -> usize {
        arity.div_ceil(PSIZE as usize)
    }

    fn shift(local: u32) -> u32 {
        // The first exponent of each word sits in the most significant
        // slot; unused low slots of the final word stay zero.
        (PSIZE - 1 - local) * Self::WIDTH
    }

    /// Returns the exponent at position `i`.
    #[must_use]
    pub fn exponent(&self, i: usize) -> i64 {
        let word = self.words[i / PSIZE as usize];
        #[allow(clippy::cast_possible_truncation)]
        let local = (i % PSIZE as usize) as u32;
        kpack::decode_signed(
            (word >> Self::shift(local)) & kpack::slot_mask(Self::WIDTH),
            Self::WIDTH,
        )
    }

    /// Iterates the decoded exponents of every slot, used slots first
    /// within each word.
    pub(crate) fn first_nonzero(&self) -> Option<i64> {
        for &word in &self.words {
            for local in 0..PSIZE {
                let bits = (word >> Self::shift(local)) & kpack::slot_mask(Self::WIDTH);
                if bits != 0 {
                    return Some(kpack::decode_signed(bits, Self::WIDTH));
                }
            }
        }
        None
    }

    /// Returns the packed words.
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

impl<const PSIZE: u32> ByteSize for DynMonomial<PSIZE> {
    fn byte_size(&self) -> usize {
        let spill = if self.words.spilled() {
            self.words.capacity() * mem::size_of::<u64>()
        } else {
            0
        };
        mem::size_of::<Self>() + spill
    }
}

impl<const PSIZE: u32> Key for DynMonomial<PSIZE> {
    fn unit(arity: usize) -> Self {
        Self {
            words: SmallVec::from_elem(0, Self::words_for(arity)),
        }
    }

    fn from_exponents(exps: &[i64]) -> Result<Self> {
        let mut words = SmallVec::from_elem(0_u64, Self::words_for(exps.len()));
        for (i, &e) in exps.iter().enumerate() {
            if e < Self::MIN_EXPONENT || e > Self::MAX_EXPONENT {
                return Err(KernelError::InvalidShape(format!(
                    "exponent {e} at position {i} is outside [{}, {}]",
                    Self::MIN_EXPONENT,
                    Self::MAX_EXPONENT
                )));
            }
            #[allow(clippy::cast_possible_truncation)]
            let local = (i % PSIZE as usize) as u32;
            words[i / PSIZE as usize] |= kpack::encode_signed(e, Self::WIDTH) << Self::shift(local);
        }
        Ok(Self { words })
    }

    fn is_compatible(&self, arity: usize) -> bool {
        self.words.len() == Self::words_for(arity)
    }

    fn is_unit(&self, _arity: usize) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    fn is_zero_key(&self, _arity: usize) -> bool {
        false
    }

    fn unpack(&self, arity: usize, out: &mut Vec<i64>) {
        out.clear();
        out.extend((0..arity).map(|i| self.exponent(i)));
    }

    fn key_hash(&self) -> u64 {
        kpack::hash_words(&self.words)
    }

    fn remap(&self, map: &SymbolMap, new_arity: usize) -> Result<Self> {
        let mut exps = vec![0_i64; new_arity];
        for (i, &mi) in map.iter().enumerate() {
            exps[mi] = self.exponent(i);
        }
        Self::from_exponents(&exps)
    }

    fn trim(&self, kept: &[usize], arity: usize) -> Result<Self> {
        debug_assert!(kept.iter().all(|&i| i < arity));
        let trimmed: Vec<i64> = kept.iter().map(|&i| self.exponent(i)).collect();
        Self::from_exponents(&trimmed)
    }
}

impl<const PSIZE: u32> KeyMul for DynMonomial<PSIZE> {
    fn try_mul(&self, rhs: &Self, arity: usize) -> Result<Self> {
        debug_assert_eq!(self.words.len(), rhs.words.len());

        let mut words = SmallVec::from_elem(0_u64, Self::words_for(arity));
        for i in 0..arity {
            let sum = i128::from(self.exponent(i)) + i128::from(rhs.exponent(i));
            if sum < i128::from(Self::MIN_EXPONENT) || sum > i128::from(Self::MAX_EXPONENT) {
                return Err(KernelError::MonomialOverflow(format!(
                    "exponent sum {sum} at position {i} is outside [{}, {}]",
                    Self::MIN_EXPONENT,
                    Self::MAX_EXPONENT
                )));
            }
            #[allow(clippy::cast_possible_truncation)]
            let local = (i % PSIZE as usize) as u32;
            #[allow(clippy::cast_possible_truncation)]
            let sum = sum as i64;
            words[i / PSIZE as usize] |= kpack::encode_signed(sum, Self::WIDTH) << Self::shift(local);
        }
        Ok(Self { words })
    }
}

impl<const PSIZE: u32> HasDegree for DynMonomial<PSIZE> {
    fn degree(&self, arity: usize) -> Degree {
        let total: i128 = (0..arity).map(|i| i128::from(self.exponent(i))).sum();
        clamp_degree(total)
    }

    fn degree_over(&self, subset: &[usize], arity: usize) -> Degree {
        debug_assert!(subset.iter().all(|&i| i < arity));
        let total: i128 = subset.iter().map(|&i| i128::from(self.exponent(i))).sum();
        clamp_degree(total)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_degree(d: i128) -> Degree {
    if d > i128::from(i64::MAX) {
        i64::MAX
    } else if d < i128::from(i64::MIN) {
        i64::MIN
    } else {
        d as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type M8 = DynMonomial<8>;
    type M1 = DynMonomial<1>;

    #[test]
    fn test_pack_unpack_round_trip() {
        let exps = [1_i64, -2, 0, 127, -128, 3, 0, 0, 9, -1];
        let m = M8::from_exponents(&exps).unwrap();
        assert_eq!(m.words().len(), 2);

        let mut out = Vec::new();
        m.unpack(exps.len(), &mut out);
        assert_eq!(out, exps);
        assert_eq!(M8::from_exponents(&out).unwrap(), m);
    }

    #[test]
    fn test_psize_one_degenerates_to_word_per_exponent() {
        let exps = [i64::MAX, i64::MIN, 0, -7];
        let m = M1::from_exponents(&exps).unwrap();
        assert_eq!(m.words().len(), 4);

        let mut out = Vec::new();
        m.unpack(4, &mut out);
        assert_eq!(out, exps);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(M8::from_exponents(&[128]).is_err());
        assert!(M8::from_exponents(&[-129]).is_err());
    }

    #[test]
    fn test_mul_and_overflow() {
        let a = M8::from_exponents(&[100, -3]).unwrap();
        let b = M8::from_exponents(&[27, 3]).unwrap();
        let ab = a.try_mul(&b, 2).unwrap();
        assert_eq!(ab.exponent(0), 127);
        assert_eq!(ab.exponent(1), 0);

        let c = M8::from_exponents(&[1, 0]).unwrap();
        assert!(matches!(
            ab.try_mul(&c, 2),
            Err(KernelError::MonomialOverflow(_))
        ));
    }

    #[test]
    fn test_degree_signed() {
        let m = M8::from_exponents(&[5, -2, 1]).unwrap();
        assert_eq!(m.degree(3), 4);
        assert_eq!(m.degree_over(&[1, 2], 3), -1);
    }

    #[test]
    fn test_unit_and_compatibility() {
        let u = M8::unit(9);
        assert!(u.is_unit(9));
        assert!(u.is_compatible(9));
        assert!(!u.is_compatible(17));
        assert_eq!(u.degree(9), 0);
        assert!(!u.is_zero_key(9));
    }

    #[test]
    fn test_trim_repacks_across_words() {
        // Ten exponents span two words; trimming to three fits one.
        let m = M8::from_exponents(&[0, -2, 0, 0, 5, 0, 0, 0, 9, 0]).unwrap();
        let t = m.trim(&[1, 4, 8], 10).unwrap();
        assert_eq!(t.words().len(), 1);

        let mut out = Vec::new();
        t.unpack(3, &mut out);
        assert_eq!(out, vec![-2, 5, 9]);
    }

    #[test]
    fn test_equal_monomials_hash_equal() {
        let a = M8::from_exponents(&[4, 0, -1]).unwrap();
        let b = M8::from_exponents(&[4, 0, -1]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key_hash(), b.key_hash());
    }

    #[test]
    fn test_remap() {
        let m = M8::from_exponents(&[2, -3]).unwrap();
        let r = m.remap(&vec![1, 2], 4).unwrap();
        let mut out = Vec::new();
        r.unpack(4, &mut out);
        assert_eq!(out, vec![0, 2, -3, 0]);
    }

    #[test]
    fn test_serde_round_trip() {
        let m = M8::from_exponents(&[1, 2, 3, -4, 5, -6, 7, 8, 9]).unwrap();
        let bytes = bincode::serialize(&m).unwrap();
        let back: DynMonomial<8> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(m, back);
    }
}
