//! The sparse multiplication engine.
//!
//! The product of two series is a sparse Cartesian product of their
//! term lists with on-the-fly accumulation. The kernel first samples
//! random term pairs to estimate the output density and size the
//! segmented result table, then partitions the destination segments
//! across the thread pool: each worker walks every pair, keeps only
//! the pairs whose product monomial hashes into its segment range and
//! accumulates them with combine-on-collision. Recomputing the cheap
//! exponent arithmetic in every worker buys lock-freedom; coefficient
//! work happens once, in the owning worker.
//!
//! When a truncation bound is attached, the right operand is sorted by
//! degree so the inner loop can stop at the first pair over the bound.
//! Homogeneous operands take a striped path instead: the left operand
//! is split across workers, each accumulating into a private table
//! that is merged at the end.
//!
//! Failure of any worker discards all partial output, so the operands
//! and the destination are never left half-multiplied.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use epicycle_core::{CancelToken, Coefficient, Degree, KernelError, Result, SymbolMap, SymbolSet};
use epicycle_monomial::{HasDegree, Key, KeyMul};

use crate::series::Series;
use crate::table::SegmentedTable;
use crate::tag::SeriesTag;

/// Upper bound on the log2 segment count of a product table.
const MAX_LOG2_SEGMENTS: u32 = 10;

/// Number of random term pairs sampled by the density estimator.
const ESTIMATE_SAMPLES: usize = 1024;

/// Target number of terms per segment in the product table.
const TARGET_SEGMENT_LOAD: f64 = 1.5;

const ESTIMATOR_SEED: u64 = 0x4550_4943_5943_4c45;

impl<K, C, T> Series<K, C, T>
where
    K: KeyMul + HasDegree,
    C: Coefficient,
    T: SeriesTag<K>,
{
    /// Multiplies two series.
    ///
    /// On failure the operands are untouched and no partial result
    /// escapes.
    pub fn try_mul(&self, rhs: &Self) -> Result<Self> {
        multiply(self, rhs, None)
    }

    /// Multiplies two series, observing `cancel` at granule
    /// boundaries.
    pub fn try_mul_cancellable(&self, rhs: &Self, cancel: &CancelToken) -> Result<Self> {
        multiply(self, rhs, Some(cancel))
    }

    /// In-place multiplication; the left operand is replaced by the
    /// product only on success.
    pub fn try_mul_assign(&mut self, rhs: &Self) -> Result<()> {
        *self = self.try_mul(rhs)?;
        Ok(())
    }
}

fn multiply<K, C, T>(
    a: &Series<K, C, T>,
    b: &Series<K, C, T>,
    cancel: Option<&CancelToken>,
) -> Result<Series<K, C, T>>
where
    K: KeyMul + HasDegree,
    C: Coefficient,
    T: SeriesTag<K>,
{
    let tag = a.tag().try_combine(b.tag())?;
    let (merged, lmap, rmap) = a.symbol_set().merge(b.symbol_set());
    let arity = merged.len();

    if a.is_empty() || b.is_empty() {
        return Ok(Series::with_tag(merged, tag));
    }

    let ta = remapped_terms(a, &lmap, &merged)?;
    let mut tb = remapped_terms(b, &rmap, &merged)?;

    let bound = tag.degree_bound(&merged);
    let limit = bound.as_ref().map(crate::tag::DegreeBound::limit);

    // Per-term degrees under the bound's metric (total degree when
    // unbounded; the values then only steer the homogeneity check).
    let deg_of = |k: &K| match &bound {
        Some(bnd) => bnd.key_degree(k, arity),
        None => k.degree(arity),
    };
    let da: Vec<Degree> = ta.iter().map(|(k, _)| deg_of(k)).collect();
    let mut db: Vec<Degree> = tb.iter().map(|(k, _)| deg_of(k)).collect();

    if limit.is_some() {
        // Sort the right operand by degree so the inner loop can break
        // out at the first pair over the bound.
        let mut order: Vec<usize> = (0..tb.len()).collect();
        order.sort_by_key(|&j| db[j]);
        tb = order.iter().map(|&j| tb[j].clone()).collect();
        db = order.iter().map(|&j| db[j]).collect();
    }

    if let (Some(ha), Some(hb)) = (uniform(&da), uniform(&db)) {
        // Homogeneous operands: every pair shares the same output
        // degree, so truncation is all-or-nothing and a striped
        // partition balances better than segment ranges.
        if limit.is_some_and(|d| ha + hb > d) {
            return Ok(Series::with_tag(merged, tag));
        }
        let est = estimate_output_terms(&ta, &tb, arity, limit, &da, &db);
        return stripe_multiply(&ta, &tb, arity, choose_log2(est), merged, tag, cancel);
    }

    let est = estimate_output_terms(&ta, &tb, arity, limit, &da, &db);
    range_multiply(
        &ta,
        &tb,
        &da,
        &db,
        limit,
        arity,
        choose_log2(est),
        merged,
        tag,
        cancel,
    )
}

fn remapped_terms<K: Key, C: Coefficient, T: SeriesTag<K>>(
    s: &Series<K, C, T>,
    map: &SymbolMap,
    merged: &SymbolSet,
) -> Result<Vec<(K, C)>> {
    if s.symbol_set() == merged {
        return Ok(s.to_terms());
    }
    let arity = merged.len();
    s.iter()
        .map(|(k, c)| Ok((k.remap(map, arity)?, c.clone())))
        .collect()
}

fn uniform(degrees: &[Degree]) -> Option<Degree> {
    let (&first, rest) = degrees.split_first()?;
    rest.iter().all(|&d| d == first).then_some(first)
}

/// Estimates the number of distinct monomials in the product by
/// sampling random term pairs and extrapolating the distinct count.
fn estimate_output_terms<K: KeyMul, C>(
    ta: &[(K, C)],
    tb: &[(K, C)],
    arity: usize,
    limit: Option<Degree>,
    da: &[Degree],
    db: &[Degree],
) -> usize {
    let total = ta.len().saturating_mul(tb.len());
    if total <= ESTIMATE_SAMPLES {
        return total.max(1);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(ESTIMATOR_SEED);
    let mut distinct: FxHashSet<K> = FxHashSet::default();
    for _ in 0..ESTIMATE_SAMPLES {
        let i = rng.gen_range(0..ta.len());
        let j = rng.gen_range(0..tb.len());
        if limit.is_some_and(|d| da[i] + db[j] > d) {
            continue;
        }
        // Pairs that overflow are counted in the sample size but
        // contribute no output monomial; the real kernel will surface
        // the error.
        if let Ok(m) = ta[i].0.try_mul(&tb[j].0, arity) {
            distinct.insert(m);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let est = ((distinct.len() as u128 * total as u128) / ESTIMATE_SAMPLES as u128) as usize;
    est.max(ta.len()).max(tb.len())
}

/// Picks the log2 segment count so the estimated output divided by the
/// segment count stays below the target load.
#[allow(clippy::cast_precision_loss)]
fn choose_log2(estimate: usize) -> u32 {
    let mut log2 = 0;
    while log2 < MAX_LOG2_SEGMENTS
        && estimate as f64 / (1_usize << log2) as f64 > TARGET_SEGMENT_LOAD
    {
        log2 += 1;
    }
    log2
}

fn split_ranges(nseg: usize, workers: usize) -> Vec<(usize, usize)> {
    let workers = workers.clamp(1, nseg);
    let chunk = nseg.div_ceil(workers);
    (0..workers)
        .map(|w| (w * chunk, ((w + 1) * chunk).min(nseg)))
        .filter(|(lo, hi)| lo < hi)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn range_multiply<K, C, T>(
    ta: &[(K, C)],
    tb: &[(K, C)],
    da: &[Degree],
    db: &[Degree],
    limit: Option<Degree>,
    arity: usize,
    log2: u32,
    merged: SymbolSet,
    tag: T,
    cancel: Option<&CancelToken>,
) -> Result<Series<K, C, T>>
where
    K: KeyMul + HasDegree,
    C: Coefficient,
    T: SeriesTag<K>,
{
    let nseg = 1_usize << log2;
    let mask = (1_u64 << log2) - 1;
    let ranges = split_ranges(nseg, rayon::current_num_threads());

    let parts: Vec<Vec<HashMap<K, C>>> = ranges
        .into_par_iter()
        .map(|(lo, hi)| -> Result<Vec<HashMap<K, C>>> {
            let mut segs: Vec<HashMap<K, C>> = (lo..hi).map(|_| HashMap::new()).collect();
            for (i, (ka, ca)) in ta.iter().enumerate() {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    return Err(KernelError::Cancelled);
                }
                for (j, (kb, cb)) in tb.iter().enumerate() {
                    if limit.is_some_and(|d| da[i] + db[j] > d) {
                        // tb is degree-sorted: every later pair is
                        // over the bound as well.
                        break;
                    }
                    let m = ka.try_mul(kb, arity)?;
                    #[allow(clippy::cast_possible_truncation)]
                    let s = (m.key_hash() & mask) as usize;
                    if s < lo || s >= hi {
                        continue;
                    }
                    let c = ca.try_mul(cb)?;
                    if c.is_zero() {
                        continue;
                    }
                    combine_into(&mut segs[s - lo], m, c)?;
                }
            }
            Ok(segs)
        })
        .collect::<Result<Vec<_>>>()?;

    let segments: Vec<HashMap<K, C>> = parts.into_iter().flatten().collect();
    Ok(Series::from_raw_parts(
        merged,
        SegmentedTable::from_segments(log2, segments),
        tag,
    ))
}

fn stripe_multiply<K, C, T>(
    ta: &[(K, C)],
    tb: &[(K, C)],
    arity: usize,
    log2: u32,
    merged: SymbolSet,
    tag: T,
    cancel: Option<&CancelToken>,
) -> Result<Series<K, C, T>>
where
    K: KeyMul + HasDegree,
    C: Coefficient,
    T: SeriesTag<K>,
{
    let workers = rayon::current_num_threads().max(1);
    let chunk = ta.len().div_ceil(workers);

    let maps: Vec<HashMap<K, C>> = ta
        .par_chunks(chunk)
        .map(|stripe| -> Result<HashMap<K, C>> {
            let mut acc = HashMap::new();
            for (ka, ca) in stripe {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    return Err(KernelError::Cancelled);
                }
                for (kb, cb) in tb {
                    let m = ka.try_mul(kb, arity)?;
                    let c = ca.try_mul(cb)?;
                    if c.is_zero() {
                        continue;
                    }
                    combine_into(&mut acc, m, c)?;
                }
            }
            Ok(acc)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut table = SegmentedTable::with_log2(log2);
    for map in maps {
        for (k, c) in map {
            table.insert_or_combine(k, c)?;
        }
    }
    Ok(Series::from_raw_parts(merged, table, tag))
}

fn combine_into<K: Key, C: Coefficient>(map: &mut HashMap<K, C>, key: K, cf: C) -> Result<()> {
    match map.entry(key) {
        Entry::Occupied(mut e) => {
            e.get_mut().try_add_assign(&cf)?;
            if e.get().is_zero() {
                e.remove();
            }
        }
        Entry::Vacant(v) => {
            v.insert(cf);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use epicycle_core::SymbolSet;
    use epicycle_monomial::PackedMonomial;
    use crate::polynomial::make_polynomials_in;

    type Poly = Series<PackedMonomial, i64>;

    fn key(exps: &[i64]) -> PackedMonomial {
        PackedMonomial::from_exponents(exps).unwrap()
    }

    #[test]
    fn test_cross_terms_combine() {
        // x*y + y*x == 2*x*y, built as (x)·(y) + (y)·(x).
        let ss = SymbolSet::from_names(["x", "y"]);
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x", "y"]).unwrap();
        let (x, y) = (&gens[0], &gens[1]);

        let prod = x.try_mul(y).unwrap().try_add(&y.try_mul(x).unwrap()).unwrap();
        assert_eq!(prod.len(), 1);
        assert_eq!(prod.coefficient(&key(&[1, 1])), Some(&2));
    }

    #[test]
    fn test_binomial_power() {
        // (x+1)^5 has the binomial coefficients 1 5 10 10 5 1.
        let ss = SymbolSet::from_names(["x"]);
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x"]).unwrap();
        let xp1 = gens[0].try_add_scalar(&1).unwrap();

        let mut p = xp1.clone();
        for _ in 0..4 {
            p.try_mul_assign(&xp1).unwrap();
        }

        assert_eq!(p.len(), 6);
        for (e, c) in [(0, 1), (1, 5), (2, 10), (3, 10), (4, 5), (5, 1)] {
            assert_eq!(p.coefficient(&key(&[e])), Some(&c), "coefficient of x^{e}");
        }
    }

    #[test]
    fn test_mul_identity_and_zero() {
        let ss = SymbolSet::from_names(["x", "y"]);
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x", "y"]).unwrap();
        let a = gens[0].try_add(&gens[1]).unwrap();

        let mut one = Poly::new(ss.clone());
        one.add_term(key(&[0, 0]), 1).unwrap();
        assert_eq!(a.try_mul(&one).unwrap(), a);

        let zero = Poly::new(ss);
        assert!(a.try_mul(&zero).unwrap().is_empty());
    }

    #[test]
    fn test_empty_times_empty_merges_symbols() {
        let a = Poly::new(SymbolSet::from_names(["x"]));
        let b = Poly::new(SymbolSet::from_names(["y"]));
        let p = a.try_mul(&b).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.symbol_set(), &SymbolSet::from_names(["x", "y"]));
    }

    #[test]
    fn test_distributive() {
        let ss = SymbolSet::from_names(["x", "y", "z"]);
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x", "y", "z"]).unwrap();
        let (x, y, z) = (&gens[0], &gens[1], &gens[2]);

        let a = x.try_add_scalar(&2).unwrap();
        let b = y.try_mul_scalar(&3).unwrap();
        let c = z.try_add(x).unwrap();

        let lhs = a.try_mul(&b.try_add(&c).unwrap()).unwrap();
        let rhs = a.try_mul(&b).unwrap().try_add(&a.try_mul(&c).unwrap()).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_associative() {
        let ss = SymbolSet::from_names(["x", "y"]);
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x", "y"]).unwrap();
        let a = gens[0].try_add_scalar(&1).unwrap();
        let b = gens[1].try_add_scalar(&-2).unwrap();
        let c = gens[0].try_add(&gens[1]).unwrap();

        let lhs = a.try_mul(&b).unwrap().try_mul(&c).unwrap();
        let rhs = a.try_mul(&b.try_mul(&c).unwrap()).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_sparse_product_term_count_is_stable() {
        // (x+y+z+t+u+1)^5 * (u+t+z+y+x+1)^5: the classical sparse
        // benchmark shape. Both factors expand to the same polynomial,
        // so the product is (x+y+z+t+u+1)^10 with C(10+5,5) terms.
        let ss = SymbolSet::from_names(["t", "u", "x", "y", "z"]);
        let names = ["x", "y", "z", "t", "u"];
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &names).unwrap();

        let mut f = Poly::new(ss.clone());
        for g in &gens {
            f.try_add_assign(g).unwrap();
        }
        f.try_add_scalar_assign(&1).unwrap();

        let base = f.clone();
        for _ in 0..4 {
            f.try_mul_assign(&base).unwrap();
        }

        let p1 = f.try_mul(&f).unwrap();
        let p2 = f.try_mul(&f).unwrap();
        assert_eq!(p1.len(), 3003); // C(15, 5)
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_monomial_overflow_fails_cleanly() {
        // 16 symbols leave 4-bit slots; x_0^15 * x_0 overflows.
        let mut exps = vec![0_i64; 16];
        exps[0] = 15;
        let names: Vec<String> = (0..16).map(|i| format!("s{i:02}")).collect();
        let ss = SymbolSet::from_names(names);

        let mut a = Poly::new(ss.clone());
        a.add_term(key(&exps), 1).unwrap();
        exps[0] = 1;
        let mut b = Poly::new(ss);
        b.add_term(key(&exps), 1).unwrap();

        assert!(matches!(
            a.try_mul(&b),
            Err(KernelError::MonomialOverflow(_))
        ));
    }

    #[test]
    fn test_cancellation() {
        let ss = SymbolSet::from_names(["x", "y"]);
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x", "y"]).unwrap();
        let a = gens[0].try_add(&gens[1]).unwrap();

        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            a.try_mul_cancellable(&a, &token).unwrap_err(),
            KernelError::Cancelled
        );
        // The operand is untouched.
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_coefficient_cancellation_in_product() {
        // (x + 1)(x - 1) = x^2 - 1: the cross terms cancel inside the
        // accumulator.
        let ss = SymbolSet::from_names(["x"]);
        let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x"]).unwrap();
        let p = gens[0].try_add_scalar(&1).unwrap();
        let m = gens[0].try_add_scalar(&-1).unwrap();

        let prod = p.try_mul(&m).unwrap();
        assert_eq!(prod.len(), 2);
        assert_eq!(prod.coefficient(&key(&[2])), Some(&1));
        assert_eq!(prod.coefficient(&key(&[0])), Some(&-1));
    }

    #[test]
    fn test_estimator_and_segment_choice() {
        assert_eq!(choose_log2(1), 0);
        assert_eq!(choose_log2(3), 1);
        assert!(choose_log2(1_000_000) <= MAX_LOG2_SEGMENTS);
    }

    #[test]
    fn test_split_ranges_cover_all_segments() {
        for (nseg, workers) in [(8, 3), (1, 4), (1024, 7)] {
            let ranges = split_ranges(nseg, workers);
            assert_eq!(ranges[0].0, 0);
            assert_eq!(ranges.last().unwrap().1, nseg);
            for w in ranges.windows(2) {
                assert_eq!(w[0].1, w[1].0);
            }
        }
    }
}
