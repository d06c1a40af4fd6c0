//! The series type.
//!
//! A series is a sum of coefficient-times-monomial terms: a symbol
//! set, a segmented term container and a tag. The tag parameter picks
//! the algebraic flavor; the coefficient parameter may itself be a
//! series, giving higher-rank series (a series whose coefficients are
//! polynomials, and so on) without any dedicated machinery.

use std::mem;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use epicycle_core::{ByteSize, Coefficient, Degree, KernelError, Result, SymbolMap, SymbolSet};
use epicycle_monomial::{HasDegree, Key, KeyMul};

use crate::table::SegmentedTable;
use crate::tag::{SeriesTag, Untagged};

/// A sparse series: a tagged term container over a symbol set.
#[derive(Clone, Debug)]
pub struct Series<K, C, T = Untagged> {
    symbols: SymbolSet,
    table: SegmentedTable<K, C>,
    tag: T,
}

impl<K: Key, C: Coefficient, T: SeriesTag<K>> Default for Series<K, C, T> {
    fn default() -> Self {
        Self::new(SymbolSet::new())
    }
}

impl<K: Key, C: Coefficient, T: SeriesTag<K>> Series<K, C, T> {
    /// Creates an empty series over `symbols` with the default tag.
    #[must_use]
    pub fn new(symbols: SymbolSet) -> Self {
        Self::with_tag(symbols, T::default())
    }

    /// Creates an empty series over `symbols` with an explicit tag.
    #[must_use]
    pub fn with_tag(symbols: SymbolSet, tag: T) -> Self {
        Self {
            symbols,
            table: SegmentedTable::new(),
            tag,
        }
    }

    pub(crate) fn from_raw_parts(symbols: SymbolSet, table: SegmentedTable<K, C>, tag: T) -> Self {
        Self { symbols, table, tag }
    }

    /// The symbol set of this series.
    #[must_use]
    pub fn symbol_set(&self) -> &SymbolSet {
        &self.symbols
    }

    /// The tag of this series.
    #[must_use]
    pub fn tag(&self) -> &T {
        &self.tag
    }

    /// Replaces the tag without touching the stored terms.
    ///
    /// Callers that tighten the policy must re-filter afterwards; the
    /// power-series truncation setters do exactly that.
    pub fn set_tag(&mut self, tag: T) {
        self.tag = tag;
    }

    /// The term container.
    #[must_use]
    pub fn table(&self) -> &SegmentedTable<K, C> {
        &self.table
    }

    /// Returns the number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the series is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over the stored terms.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &C)> {
        self.table.iter()
    }

    /// Looks up the coefficient of a monomial.
    #[must_use]
    pub fn coefficient(&self, key: &K) -> Option<&C> {
        self.table.get(key)
    }

    /// Inserts a term, combining with an existing binding for the same
    /// monomial and erasing the binding on exact cancellation.
    ///
    /// This is the only insertion path: it checks the key shape
    /// against the symbol set, drops zero coefficients and zero keys
    /// (a sine monomial with no multipliers is zero whatever its
    /// coefficient) and applies the tag's retention predicate.
    pub fn add_term(&mut self, key: K, cf: C) -> Result<()> {
        let arity = self.symbols.len();
        if !key.is_compatible(arity) {
            return Err(KernelError::InvalidShape(format!(
                "key does not match a symbol set of size {arity}"
            )));
        }
        if cf.is_zero() || key.is_zero_key(arity) || !self.tag.retains(&key, &self.symbols) {
            return Ok(());
        }
        self.table.insert_or_combine(key, cf)
    }

    /// Retains the terms satisfying `pred`; segments are scanned in
    /// parallel.
    pub fn filter<P>(&mut self, pred: P)
    where
        P: Fn(&K, &C) -> bool + Sync,
    {
        self.table.retain(pred);
    }

    /// Re-applies the tag's retention predicate to the stored terms.
    pub fn retain_by_tag(&mut self) {
        if self.tag.is_trivial() {
            return;
        }
        let tag = self.tag.clone();
        let symbols = self.symbols.clone();
        self.table.retain(|k, _| tag.retains(k, &symbols));
    }

    /// Resets the series to the empty state: no terms, empty symbol
    /// set, default tag.
    pub fn clear(&mut self) {
        self.symbols = SymbolSet::new();
        self.table = SegmentedTable::new();
        self.tag = T::default();
    }

    /// Removes every term, keeping the symbol set and the tag.
    pub fn clear_terms(&mut self) {
        self.table.clear();
    }

    /// Clones the terms into a vector.
    #[must_use]
    pub fn to_terms(&self) -> Vec<(K, C)> {
        self.iter().map(|(k, c)| (k.clone(), c.clone())).collect()
    }

    /// Returns the additive inverse.
    pub fn try_neg(&self) -> Result<Self> {
        let mut out = Self::with_tag(self.symbols.clone(), self.tag.clone());
        for (k, c) in self.iter() {
            out.table.insert_unique(k.clone(), c.try_neg()?);
        }
        Ok(out)
    }

    /// Drops every symbol with a zero exponent in all stored terms,
    /// compacting the symbol set and re-packing the keys.
    ///
    /// The shrink-direction counterpart of the symbol-set merge that
    /// binary operators perform: long-running pipelines accumulate
    /// dead symbols (cancellation, differentiation) and trimming
    /// recovers slot width and hashing work. Trimming an empty series
    /// empties its symbol set.
    pub fn trim(&mut self) -> Result<()> {
        let arity = self.symbols.len();
        if arity == 0 {
            return Ok(());
        }

        let mut live = vec![false; arity];
        let mut exps = Vec::with_capacity(arity);
        for (k, _) in self.iter() {
            k.unpack(arity, &mut exps);
            for (i, &e) in exps.iter().enumerate() {
                if e != 0 {
                    live[i] = true;
                }
            }
        }
        if live.iter().all(|&l| l) {
            return Ok(());
        }

        let kept: Vec<usize> = (0..arity).filter(|&i| live[i]).collect();
        let symbols = SymbolSet::from_names(
            self.symbols
                .iter()
                .enumerate()
                .filter(|(i, _)| live[*i])
                .map(|(_, n)| n),
        );

        // Dropped positions are zero in every term, so distinct keys
        // stay distinct and assume-unique insertion is safe.
        let old = mem::take(&mut self.table);
        let mut table = SegmentedTable::with_log2(old.log2_segments());
        for (k, c) in old {
            table.insert_unique(k.trim(&kept, arity)?, c);
        }
        self.table = table;
        self.symbols = symbols;
        Ok(())
    }

    /// Rewrites the series into a merged symbol set.
    ///
    /// Distinct keys remap to distinct keys, so re-sharding can use
    /// assume-unique insertion.
    pub(crate) fn reindex(&mut self, merged: &SymbolSet, map: &SymbolMap) -> Result<()> {
        if *merged == self.symbols {
            return Ok(());
        }
        let arity = merged.len();
        let old = mem::take(&mut self.table);
        let mut table = SegmentedTable::with_log2(old.log2_segments());
        for (k, c) in old {
            table.insert_unique(k.remap(map, arity)?, c);
        }
        self.table = table;
        self.symbols = merged.clone();
        Ok(())
    }
}

impl<K: HasDegree, C: Coefficient, T: SeriesTag<K>> Series<K, C, T> {
    /// The total degree: the maximum key degree, or `None` for the
    /// zero series.
    #[must_use]
    pub fn degree(&self) -> Option<Degree> {
        let arity = self.symbols.len();
        self.iter().map(|(k, _)| k.degree(arity)).max()
    }

    /// Returns `Some(d)` if every term has total degree `d`.
    #[must_use]
    pub fn homogeneous_degree(&self) -> Option<Degree> {
        let arity = self.symbols.len();
        let mut degrees = self.iter().map(|(k, _)| k.degree(arity));
        let first = degrees.next()?;
        degrees.all(|d| d == first).then_some(first)
    }
}

impl<K: Key, C: Coefficient, T: SeriesTag<K>> PartialEq for Series<K, C, T> {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols
            && self.tag == other.tag
            && self.len() == other.len()
            && self.iter().all(|(k, c)| other.coefficient(k) == Some(c))
    }
}

impl<K: Key, C: Coefficient, T: SeriesTag<K>> ByteSize for Series<K, C, T> {
    fn byte_size(&self) -> usize {
        mem::size_of::<Self>() + self.symbols.byte_size() - mem::size_of::<SymbolSet>()
            + self.table.byte_size()
            - mem::size_of::<SegmentedTable<K, C>>()
    }
}

/// Series are coefficients themselves, which yields higher-rank
/// series: the inner series is treated as a constant of the outer one.
impl<K, C, T> Coefficient for Series<K, C, T>
where
    K: KeyMul + HasDegree,
    C: Coefficient,
    T: SeriesTag<K>,
{
    fn zero() -> Self {
        Self::default()
    }

    fn one() -> Self {
        let mut s = Self::default();
        s.table.insert_unique(K::unit(0), C::one());
        s
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn try_add_assign(&mut self, rhs: &Self) -> Result<()> {
        Series::try_add_assign(self, rhs)
    }

    fn try_sub_assign(&mut self, rhs: &Self) -> Result<()> {
        Series::try_sub_assign(self, rhs)
    }

    fn try_mul(&self, rhs: &Self) -> Result<Self> {
        Series::try_mul(self, rhs)
    }

    fn try_neg(&self) -> Result<Self> {
        Series::try_neg(self)
    }

    fn try_mul_int(&self, n: i64) -> Result<Self> {
        self.map_coefficients(|c| c.try_mul_int(n))
    }

    fn try_div_int(&self, n: i64) -> Result<Self> {
        self.map_coefficients(|c| c.try_div_int(n))
    }
}

impl<K: Key, C: Coefficient, T: SeriesTag<K>> Series<K, C, T> {
    /// Applies `f` to every coefficient, dropping terms mapped to
    /// zero.
    pub(crate) fn map_coefficients<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&C) -> Result<C>,
    {
        let mut out = Self::with_tag(self.symbols.clone(), self.tag.clone());
        for (k, c) in self.iter() {
            let c = f(c)?;
            if !c.is_zero() {
                out.table.insert_unique(k.clone(), c);
            }
        }
        Ok(out)
    }
}

#[derive(Deserialize)]
struct SeriesData<K, C, T> {
    symbols: SymbolSet,
    tag: T,
    terms: Vec<(K, C)>,
}

impl<K, C, T> Serialize for Series<K, C, T>
where
    K: Key + Serialize,
    C: Coefficient + Serialize,
    T: SeriesTag<K> + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let terms: Vec<(&K, &C)> = self.iter().collect();
        let mut st = serializer.serialize_struct("Series", 3)?;
        st.serialize_field("symbols", &self.symbols)?;
        st.serialize_field("tag", &self.tag)?;
        st.serialize_field("terms", &terms)?;
        st.end()
    }
}

impl<'de, K, C, T> Deserialize<'de> for Series<K, C, T>
where
    K: Key + Deserialize<'de>,
    C: Coefficient + Deserialize<'de>,
    T: SeriesTag<K> + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let data = SeriesData::<K, C, T>::deserialize(deserializer)?;
        let mut series = Self::with_tag(data.symbols, data.tag);
        for (k, c) in data.terms {
            series.add_term(k, c).map_err(D::Error::custom)?;
        }
        Ok(series)
    }
}
