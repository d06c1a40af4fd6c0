//! Truncation limits and their interning.
//!
//! A truncation limit has three shapes: none, a total-degree bound, or
//! a partial-degree bound over a symbol subset. Series hold limits
//! through [`TruncRef`] handles backed by a process-wide interner, so
//! equal limits share one storage cell and comparing two handles is a
//! pointer check in the common case. A limit's storage lives until the
//! last series referencing it is dropped.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use epicycle_core::{Degree, Interner, SymbolSet};

/// A truncation limit for a power series.
///
/// Serialized as its variant index followed by the payload; archives
/// do not track object identity, so equal limits may deserialize to
/// distinct storage until re-interning unifies them on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Truncation {
    /// No truncation applied.
    #[default]
    None,
    /// Retain only terms whose key degree does not exceed the bound.
    Total(Degree),
    /// Retain only terms whose key degree over the symbol subset does
    /// not exceed the bound.
    Partial(Degree, SymbolSet),
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Total(d) => write!(f, "total degree {d}"),
            Self::Partial(d, ss) => write!(f, "partial degree {d} over {ss}"),
        }
    }
}

static TRUNC_INTERNER: Lazy<Interner<Truncation>> = Lazy::new(Interner::new);

/// A shared handle to an interned [`Truncation`].
#[derive(Clone, Debug)]
pub struct TruncRef(Arc<Truncation>);

impl TruncRef {
    /// Interns a limit, returning a handle to canonical storage.
    #[must_use]
    pub fn new(trunc: Truncation) -> Self {
        Self(TRUNC_INTERNER.intern(trunc))
    }

    /// The no-truncation handle.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Truncation::None)
    }

    /// A total-degree handle.
    #[must_use]
    pub fn total(d: Degree) -> Self {
        Self::new(Truncation::Total(d))
    }

    /// A partial-degree handle.
    #[must_use]
    pub fn partial(d: Degree, subset: SymbolSet) -> Self {
        Self::new(Truncation::Partial(d, subset))
    }
}

impl Default for TruncRef {
    fn default() -> Self {
        Self::none()
    }
}

impl Deref for TruncRef {
    type Target = Truncation;

    fn deref(&self) -> &Truncation {
        &self.0
    }
}

impl PartialEq for TruncRef {
    fn eq(&self, other: &Self) -> bool {
        // Interning makes the pointer check the common case; value
        // comparison covers handles that have not been unified yet.
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for TruncRef {}

impl Hash for TruncRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Serialize for TruncRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TruncRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Truncation::deserialize(deserializer).map(Self::new)
    }
}
