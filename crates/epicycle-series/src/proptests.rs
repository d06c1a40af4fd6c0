//! Property-based tests for the series ring axioms.

#[cfg(test)]
mod tests {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use epicycle_core::SymbolSet;
    use epicycle_monomial::{Key, PackedMonomial};

    use crate::polynomial::Polynomial;

    type Poly = Polynomial<PackedMonomial, i64>;

    /// A random small polynomial over {x, y, z} with bounded exponents
    /// and coefficients, so products never overflow.
    fn small_poly() -> impl Strategy<Value = Poly> {
        vec(((0_i64..6, 0_i64..6, 0_i64..6), -20_i64..=20), 0..8).prop_map(|terms| {
            let mut p = Poly::new(SymbolSet::from_names(["x", "y", "z"]));
            for ((ex, ey, ez), c) in terms {
                let k = PackedMonomial::from_exponents(&[ex, ey, ez]).unwrap();
                p.add_term(k, c).unwrap();
            }
            p
        })
    }

    proptest! {
        #[test]
        fn add_commutative(a in small_poly(), b in small_poly()) {
            prop_assert_eq!(a.try_add(&b).unwrap(), b.try_add(&a).unwrap());
        }

        #[test]
        fn add_associative(a in small_poly(), b in small_poly(), c in small_poly()) {
            let lhs = a.try_add(&b).unwrap().try_add(&c).unwrap();
            let rhs = a.try_add(&b.try_add(&c).unwrap()).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn add_inverse(a in small_poly()) {
            prop_assert!(a.try_add(&a.try_neg().unwrap()).unwrap().is_empty());
        }

        #[test]
        fn sub_is_add_neg(a in small_poly(), b in small_poly()) {
            let lhs = a.try_sub(&b).unwrap();
            let rhs = a.try_add(&b.try_neg().unwrap()).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn mul_commutative(a in small_poly(), b in small_poly()) {
            prop_assert_eq!(a.try_mul(&b).unwrap(), b.try_mul(&a).unwrap());
        }

        #[test]
        fn mul_distributes_over_add(
            a in small_poly(),
            b in small_poly(),
            c in small_poly(),
        ) {
            let lhs = a.try_mul(&b.try_add(&c).unwrap()).unwrap();
            let rhs = a.try_mul(&b).unwrap().try_add(&a.try_mul(&c).unwrap()).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn no_zero_coefficients_survive(a in small_poly(), b in small_poly()) {
            let p = a.try_mul(&b).unwrap();
            prop_assert!(p.iter().all(|(_, c)| *c != 0));
            let s = a.try_add(&b).unwrap();
            prop_assert!(s.iter().all(|(_, c)| *c != 0));
        }

        #[test]
        fn serde_round_trip(a in small_poly()) {
            let bytes = bincode::serialize(&a).unwrap();
            let back: Poly = bincode::deserialize(&bytes).unwrap();
            prop_assert_eq!(a, back);
        }
    }
}
