//! Truncated power series.
//!
//! A power series is a series tagged with a truncation limit. The
//! limit is enforced on construction, addition and multiplication:
//! `add_term` drops over-bound terms, binary operators require
//! policy-compatible limits, and the multiplier rejects over-bound
//! pairs before computing their coefficients.

use serde::{Deserialize, Serialize};

use epicycle_core::{Coefficient, Degree, KernelError, Result, SymbolSet};
use epicycle_monomial::{HasDegree, Key};
use epicycle_series::{DegreeBound, Series, SeriesTag};

use crate::trunc::{TruncRef, Truncation};

/// The power-series tag: an interned truncation limit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowerTag {
    trunc: TruncRef,
}

impl PowerTag {
    /// The untruncated tag.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A total-degree truncation tag.
    #[must_use]
    pub fn total(d: Degree) -> Self {
        Self {
            trunc: TruncRef::total(d),
        }
    }

    /// A partial-degree truncation tag.
    #[must_use]
    pub fn partial(d: Degree, subset: SymbolSet) -> Self {
        Self {
            trunc: TruncRef::partial(d, subset),
        }
    }

    /// The truncation limit carried by this tag.
    #[must_use]
    pub fn truncation(&self) -> &Truncation {
        &self.trunc
    }
}

impl<K: HasDegree> SeriesTag<K> for PowerTag {
    fn try_combine(&self, other: &Self) -> Result<Self> {
        match (&*self.trunc, &*other.trunc) {
            (Truncation::None, _) => Ok(other.clone()),
            (_, Truncation::None) => Ok(self.clone()),
            _ if self.trunc == other.trunc => Ok(self.clone()),
            (a, b) => Err(KernelError::IncompatibleTruncation(format!(
                "{a} vs {b}"
            ))),
        }
    }

    fn retains(&self, key: &K, symbols: &SymbolSet) -> bool {
        match &*self.trunc {
            Truncation::None => true,
            Truncation::Total(d) => key.degree(symbols.len()) <= *d,
            Truncation::Partial(d, subset) => {
                let indices = symbols.intersection_indices(subset);
                key.degree_over(&indices, symbols.len()) <= *d
            }
        }
    }

    fn degree_bound(&self, symbols: &SymbolSet) -> Option<DegreeBound> {
        match &*self.trunc {
            Truncation::None => None,
            Truncation::Total(d) => Some(DegreeBound::Total(*d)),
            Truncation::Partial(d, subset) => Some(DegreeBound::Partial(
                *d,
                symbols.intersection_indices(subset),
            )),
        }
    }

    fn is_trivial(&self) -> bool {
        matches!(&*self.trunc, Truncation::None)
    }
}

/// A truncated power series.
pub type PowerSeries<K, C> = Series<K, C, PowerTag>;

/// Sets a total-degree truncation: terms over the bound are removed
/// and the limit is enforced on every later operation.
pub fn set_total_truncation<K: HasDegree, C: Coefficient>(
    ps: &mut PowerSeries<K, C>,
    d: Degree,
) -> Result<()> {
    ps.set_tag(PowerTag::total(d));
    ps.retain_by_tag();
    Ok(())
}

/// Sets a partial-degree truncation over a symbol subset.
///
/// Every subset symbol must belong to the series's symbol set; on
/// failure the series is cleared, the tag reset, and the error
/// returned.
pub fn set_partial_truncation<K: HasDegree, C: Coefficient>(
    ps: &mut PowerSeries<K, C>,
    d: Degree,
    subset: &SymbolSet,
) -> Result<()> {
    if let Some(missing) = subset.iter().find(|n| !ps.symbol_set().contains(n)) {
        let missing = missing.to_string();
        ps.clear();
        return Err(KernelError::UnknownSymbol(missing));
    }
    ps.set_tag(PowerTag::partial(d, subset.clone()));
    ps.retain_by_tag();
    Ok(())
}

/// Removes the truncation limit; no terms are filtered.
pub fn unset_truncation<K: HasDegree, C: Coefficient>(ps: &mut PowerSeries<K, C>) {
    ps.set_tag(PowerTag::none());
}

/// Re-applies the current limit as a filter.
pub fn truncate<K: HasDegree, C: Coefficient>(ps: &mut PowerSeries<K, C>) {
    ps.retain_by_tag();
}

/// Inspects the current truncation limit.
#[must_use]
pub fn get_truncation<K: HasDegree, C: Coefficient>(ps: &PowerSeries<K, C>) -> &Truncation {
    ps.tag().truncation()
}

fn generator_in<K: HasDegree, C: Coefficient>(
    symbols: &SymbolSet,
    name: &str,
) -> Result<PowerSeries<K, C>> {
    let idx = symbols
        .index_of(name)
        .ok_or_else(|| KernelError::UnknownSymbol(name.to_string()))?;
    let mut exps = vec![0_i64; symbols.len()];
    exps[idx] = 1;

    let mut s = PowerSeries::new(symbols.clone());
    s.add_term(K::from_exponents(&exps)?, C::one())?;
    Ok(s)
}

/// Creates one untruncated generator series per requested name, each
/// over the symbol set containing just that name.
pub fn make_power_series<K: HasDegree, C: Coefficient>(
    names: &[&str],
) -> Result<Vec<PowerSeries<K, C>>> {
    names
        .iter()
        .map(|n| generator_in(&SymbolSet::from_names([*n]), n))
        .collect()
}

/// Creates one untruncated generator series per requested name over a
/// shared symbol set.
///
/// Fails with [`KernelError::UnknownSymbol`] if a requested generator
/// is not in the symbol set.
pub fn make_power_series_in<K: HasDegree, C: Coefficient>(
    symbols: &SymbolSet,
    names: &[&str],
) -> Result<Vec<PowerSeries<K, C>>> {
    names.iter().map(|n| generator_in(symbols, n)).collect()
}

/// Creates total-degree-truncated generator series, each over its own
/// single-symbol set.
pub fn make_power_series_truncated<K: HasDegree, C: Coefficient>(
    d: Degree,
    names: &[&str],
) -> Result<Vec<PowerSeries<K, C>>> {
    let mut out = make_power_series(names)?;
    for ps in &mut out {
        set_total_truncation(ps, d)?;
    }
    Ok(out)
}

/// Creates total-degree-truncated generator series over a shared
/// symbol set.
pub fn make_power_series_truncated_in<K: HasDegree, C: Coefficient>(
    symbols: &SymbolSet,
    d: Degree,
    names: &[&str],
) -> Result<Vec<PowerSeries<K, C>>> {
    let mut out = make_power_series_in(symbols, names)?;
    for ps in &mut out {
        set_total_truncation(ps, d)?;
    }
    Ok(out)
}

/// Creates partial-degree-truncated generator series over a shared
/// symbol set.
pub fn make_power_series_p_truncated_in<K: HasDegree, C: Coefficient>(
    symbols: &SymbolSet,
    d: Degree,
    subset: &SymbolSet,
    names: &[&str],
) -> Result<Vec<PowerSeries<K, C>>> {
    let mut out = make_power_series_in(symbols, names)?;
    for ps in &mut out {
        set_partial_truncation(ps, d, subset)?;
    }
    Ok(out)
}
