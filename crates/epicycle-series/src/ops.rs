//! Algebraic operators on series.
//!
//! Addition and subtraction iterate the smaller operand and combine
//! into a copy of the larger one; operands over different symbol sets
//! are first rewritten into the merged set. The tag of the result is
//! the policy-consistent combination of the operand tags. All
//! in-place operators give the basic guarantee; multiplication (in
//! `mul`) gives the strong one.

use epicycle_core::{Coefficient, Result, SymbolSet};
use epicycle_monomial::Key;

use crate::series::Series;
use crate::tag::SeriesTag;

impl<K: Key, C: Coefficient, T: SeriesTag<K>> Series<K, C, T> {
    /// Adds `rhs` in place.
    pub fn try_add_assign(&mut self, rhs: &Self) -> Result<()> {
        self.combine_assign(rhs, false)
    }

    /// Subtracts `rhs` in place.
    pub fn try_sub_assign(&mut self, rhs: &Self) -> Result<()> {
        self.combine_assign(rhs, true)
    }

    /// Returns `self + rhs`, iterating the smaller operand into a copy
    /// of the larger one.
    pub fn try_add(&self, rhs: &Self) -> Result<Self> {
        let (mut out, small) = if self.len() >= rhs.len() {
            (self.clone(), rhs)
        } else {
            (rhs.clone(), self)
        };
        out.try_add_assign(small)?;
        Ok(out)
    }

    /// Returns `self - rhs`.
    pub fn try_sub(&self, rhs: &Self) -> Result<Self> {
        if self.len() >= rhs.len() {
            let mut out = self.clone();
            out.try_sub_assign(rhs)?;
            Ok(out)
        } else {
            let mut out = rhs.try_neg()?;
            out.try_add_assign(self)?;
            Ok(out)
        }
    }

    fn combine_assign(&mut self, rhs: &Self, negate: bool) -> Result<()> {
        let tag = self.tag().try_combine(rhs.tag())?;

        let (merged, lmap, rmap) = self.symbol_set().merge(rhs.symbol_set());
        let arity = merged.len();
        self.reindex(&merged, &lmap)?;

        // Adopting a stricter tag (e.g. a truncation inherited from
        // rhs) also filters the terms already present.
        if *self.tag() != tag {
            self.set_tag(tag);
            self.retain_by_tag();
        }

        let identity = *rhs.symbol_set() == merged;
        for (k, c) in rhs.iter() {
            let k = if identity {
                k.clone()
            } else {
                k.remap(&rmap, arity)?
            };
            let c = if negate { c.try_neg()? } else { c.clone() };
            self.add_term(k, c)?;
        }
        Ok(())
    }

    /// Adds a constant term in place.
    pub fn try_add_scalar_assign(&mut self, c: &C) -> Result<()> {
        self.add_term(K::unit(self.symbol_set().len()), c.clone())
    }

    /// Subtracts a constant term in place.
    pub fn try_sub_scalar_assign(&mut self, c: &C) -> Result<()> {
        self.add_term(K::unit(self.symbol_set().len()), c.try_neg()?)
    }

    /// Returns `self + c` for a constant `c`.
    pub fn try_add_scalar(&self, c: &C) -> Result<Self> {
        let mut out = self.clone();
        out.try_add_scalar_assign(c)?;
        Ok(out)
    }

    /// Multiplies every coefficient by `c`.
    ///
    /// Multiplying by a zero scalar yields the empty series over the
    /// empty symbol set; the tag is preserved.
    pub fn try_mul_scalar(&self, c: &C) -> Result<Self> {
        if c.is_zero() {
            return Ok(Self::with_tag(SymbolSet::new(), self.tag().clone()));
        }
        self.map_coefficients(|cf| cf.try_mul(c))
    }

    /// In-place scalar multiplication.
    pub fn try_mul_scalar_assign(&mut self, c: &C) -> Result<()> {
        *self = self.try_mul_scalar(c)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epicycle_monomial::PackedMonomial;

    type Poly = Series<PackedMonomial, i64>;

    fn key(exps: &[i64]) -> PackedMonomial {
        PackedMonomial::from_exponents(exps).unwrap()
    }

    fn poly(names: &[&str], terms: &[(&[i64], i64)]) -> Poly {
        let mut s = Poly::new(SymbolSet::from_names(names.iter().copied()));
        for (exps, c) in terms {
            s.add_term(key(exps), *c).unwrap();
        }
        s
    }

    #[test]
    fn test_add_commutative() {
        let a = poly(&["x", "y"], &[(&[1, 0], 2), (&[0, 1], 3)]);
        let b = poly(&["x", "y"], &[(&[1, 1], 5), (&[1, 0], -2)]);
        assert_eq!(a.try_add(&b).unwrap(), b.try_add(&a).unwrap());
    }

    #[test]
    fn test_add_cancels_terms() {
        let a = poly(&["x"], &[(&[2], 7)]);
        let b = poly(&["x"], &[(&[2], -7), (&[0], 1)]);
        let sum = a.try_add(&b).unwrap();
        assert_eq!(sum.len(), 1);
        assert_eq!(sum.coefficient(&key(&[0])), Some(&1));
    }

    #[test]
    fn test_add_identity() {
        let a = poly(&["x"], &[(&[1], 4)]);
        let zero = Poly::new(SymbolSet::from_names(["x"]));
        assert_eq!(a.try_add(&zero).unwrap(), a);
    }

    #[test]
    fn test_add_inverse_is_zero() {
        let a = poly(&["x", "y"], &[(&[1, 0], 4), (&[2, 1], -3)]);
        let sum = a.try_add(&a.try_neg().unwrap()).unwrap();
        assert!(sum.is_empty());
    }

    #[test]
    fn test_mixed_symbol_sets_merge() {
        // x over {x}, y over {y}: the sum lives over {x, y}.
        let a = poly(&["x"], &[(&[1], 1)]);
        let b = poly(&["y"], &[(&[1], 1)]);
        let sum = a.try_add(&b).unwrap();

        assert_eq!(sum.symbol_set(), &SymbolSet::from_names(["x", "y"]));
        assert_eq!(sum.len(), 2);
        assert_eq!(sum.coefficient(&key(&[1, 0])), Some(&1));
        assert_eq!(sum.coefficient(&key(&[0, 1])), Some(&1));
    }

    #[test]
    fn test_sub() {
        let a = poly(&["x"], &[(&[1], 5), (&[0], 1)]);
        let b = poly(&["x"], &[(&[1], 2)]);
        let d = a.try_sub(&b).unwrap();
        assert_eq!(d.coefficient(&key(&[1])), Some(&3));
        assert_eq!(d.coefficient(&key(&[0])), Some(&1));

        assert!(a.try_sub(&a).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_ops() {
        let a = poly(&["x"], &[(&[1], 2), (&[0], -1)]);

        let doubled = a.try_mul_scalar(&2).unwrap();
        assert_eq!(doubled.coefficient(&key(&[1])), Some(&4));
        assert_eq!(doubled.coefficient(&key(&[0])), Some(&-2));

        let shifted = a.try_add_scalar(&1).unwrap();
        assert!(shifted.coefficient(&key(&[0])).is_none());
        assert_eq!(shifted.len(), 1);
    }

    #[test]
    fn test_scalar_zero_clears_symbol_set() {
        let a = poly(&["x", "y"], &[(&[1, 1], 3)]);
        let z = a.try_mul_scalar(&0).unwrap();
        assert!(z.is_empty());
        assert!(z.symbol_set().is_empty());
    }
}
