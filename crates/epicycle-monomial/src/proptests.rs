//! Property-based tests for packed monomial layouts.

#[cfg(test)]
mod tests {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use crate::key::{HasDegree, Key, KeyMul};
    use crate::{DynMonomial, PackedMonomial};

    // Exponents that fit two packed-word slots (32 bits each).
    fn packed_exps() -> impl Strategy<Value = Vec<i64>> {
        vec(0_i64..=0xffff_ffff, 1..=2)
    }

    fn dyn_exps() -> impl Strategy<Value = Vec<i64>> {
        vec(-128_i64..=127, 0..=24)
    }

    proptest! {
        #[test]
        fn packed_round_trip(exps in packed_exps()) {
            let m = PackedMonomial::from_exponents(&exps).unwrap();
            let mut out = Vec::new();
            m.unpack(exps.len(), &mut out);
            prop_assert_eq!(&out, &exps);
            prop_assert_eq!(PackedMonomial::from_exponents(&out).unwrap(), m);
        }

        #[test]
        fn dyn_round_trip(exps in dyn_exps()) {
            let m = DynMonomial::<8>::from_exponents(&exps).unwrap();
            let mut out = Vec::new();
            m.unpack(exps.len(), &mut out);
            prop_assert_eq!(&out, &exps);
            prop_assert_eq!(DynMonomial::<8>::from_exponents(&out).unwrap(), m);
        }

        #[test]
        fn dyn_round_trip_psize_one(exps in vec(any::<i64>(), 0..=6)) {
            let m = DynMonomial::<1>::from_exponents(&exps).unwrap();
            let mut out = Vec::new();
            m.unpack(exps.len(), &mut out);
            prop_assert_eq!(&out, &exps);
        }

        #[test]
        fn equal_keys_hash_equal(exps in dyn_exps()) {
            let a = DynMonomial::<8>::from_exponents(&exps).unwrap();
            let b = DynMonomial::<8>::from_exponents(&exps).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.key_hash(), b.key_hash());
        }

        #[test]
        fn degree_is_additive(
            a in vec(-30_i64..=30, 1..=12),
            b in vec(-30_i64..=30, 1..=12),
        ) {
            let n = a.len().min(b.len());
            let ka = DynMonomial::<8>::from_exponents(&a[..n]).unwrap();
            let kb = DynMonomial::<8>::from_exponents(&b[..n]).unwrap();
            if let Ok(kab) = ka.try_mul(&kb, n) {
                prop_assert_eq!(kab.degree(n), ka.degree(n) + kb.degree(n));
            }
        }
    }
}
