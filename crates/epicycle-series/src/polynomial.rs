//! Plain polynomials and their generator factories.

use epicycle_core::{Coefficient, KernelError, Result, SymbolSet};
use epicycle_monomial::Key;

use crate::series::Series;
use crate::tag::Untagged;

/// A sparse multivariate polynomial: a series with the trivial tag.
pub type Polynomial<K, C> = Series<K, C, Untagged>;

/// Creates one generator polynomial `x` per requested name, each over
/// the symbol set containing just that name.
pub fn make_polynomials<K: Key, C: Coefficient>(names: &[&str]) -> Result<Vec<Polynomial<K, C>>> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut s = Polynomial::new(SymbolSet::from_names([*name]));
        s.add_term(K::from_exponents(&[1])?, C::one())?;
        out.push(s);
    }
    Ok(out)
}

/// Creates one generator polynomial per requested name, all over the
/// given symbol set.
///
/// Fails with [`KernelError::UnknownSymbol`] if a requested generator
/// is not in the symbol set.
pub fn make_polynomials_in<K: Key, C: Coefficient>(
    symbols: &SymbolSet,
    names: &[&str],
) -> Result<Vec<Polynomial<K, C>>> {
    let mut exps = vec![0_i64; symbols.len()];
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let idx = symbols
            .index_of(name)
            .ok_or_else(|| KernelError::UnknownSymbol((*name).to_string()))?;
        exps[idx] = 1;
        let key = K::from_exponents(&exps);
        exps[idx] = 0;

        let mut s = Polynomial::new(symbols.clone());
        s.add_term(key?, C::one())?;
        out.push(s);
    }
    Ok(out)
}
