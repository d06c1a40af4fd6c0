//! Term-by-term differentiation and integration.

use epicycle_core::{Coefficient, KernelError, Result};
use epicycle_monomial::Key;

use crate::series::Series;
use crate::tag::SeriesTag;

/// Differentiates a series with respect to `name`.
///
/// Each term `c·x^e` maps to `(c·e)·x^(e-1)`; terms without the
/// variable vanish. Fails with [`KernelError::UnknownSymbol`] when
/// `name` is not in the series's symbol set.
pub fn differentiate<K, C, T>(s: &Series<K, C, T>, name: &str) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: SeriesTag<K>,
{
    let idx = s
        .symbol_set()
        .index_of(name)
        .ok_or_else(|| KernelError::UnknownSymbol(name.to_string()))?;
    let arity = s.symbol_set().len();

    let mut out = Series::with_tag(s.symbol_set().clone(), s.tag().clone());
    let mut exps = Vec::with_capacity(arity);
    for (k, c) in s.iter() {
        k.unpack(arity, &mut exps);
        let e = exps[idx];
        if e == 0 {
            continue;
        }
        exps[idx] = e - 1;
        out.add_term(K::from_exponents(&exps)?, c.try_mul_int(e)?)?;
    }
    Ok(out)
}

/// Integrates a series with respect to `name`.
///
/// Each term `c·x^e` maps to `(c/(e+1))·x^(e+1)`. A term with `e == -1`
/// would produce a logarithm and fails with
/// [`KernelError::NonIntegrable`]; a coefficient that does not divide
/// exactly surfaces [`KernelError::Coefficient`].
pub fn integrate<K, C, T>(s: &Series<K, C, T>, name: &str) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: SeriesTag<K>,
{
    let idx = s
        .symbol_set()
        .index_of(name)
        .ok_or_else(|| KernelError::UnknownSymbol(name.to_string()))?;
    let arity = s.symbol_set().len();

    let mut out = Series::with_tag(s.symbol_set().clone(), s.tag().clone());
    let mut exps = Vec::with_capacity(arity);
    for (k, c) in s.iter() {
        k.unpack(arity, &mut exps);
        let e = exps[idx];
        if e == -1 {
            return Err(KernelError::NonIntegrable(format!(
                "exponent -1 in integration variable '{name}'"
            )));
        }
        exps[idx] = e + 1;
        out.add_term(K::from_exponents(&exps)?, c.try_div_int(e + 1)?)?;
    }
    Ok(out)
}
