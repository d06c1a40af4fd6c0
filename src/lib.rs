//! # Epicycle
//!
//! A sparse series engine for computer algebra, written in Rust.
//!
//! Epicycle manipulates sums of coefficient-times-monomial terms:
//! sparse multivariate polynomials and truncated power series over
//! arbitrary coefficient types, efficient when the term count runs
//! into the millions.
//!
//! ## Features
//!
//! - **Packed monomials**: exponent vectors packed into machine words,
//!   fixed or dynamic, with a trigonometric variant
//! - **Segmented term tables**: hash containers sharded for
//!   parallel-friendly locality
//! - **Parallel sparse multiplication**: density estimation, segment
//!   partitioning across a thread pool, truncation fusion
//! - **Truncated power series**: interned total or partial degree
//!   limits enforced across all operations
//!
//! ## Quick start
//!
//! ```rust
//! use epicycle::prelude::*;
//!
//! let ss = SymbolSet::from_names(["x", "y"]);
//! let gens = make_polynomials_in::<PackedMonomial, i64>(&ss, &["x", "y"]).unwrap();
//! let sum = gens[0].try_add(&gens[1]).unwrap();
//! let square = sum.try_mul(&sum).unwrap();
//! assert_eq!(square.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use epicycle_core as core;
pub use epicycle_monomial as monomial;
pub use epicycle_power as power;
pub use epicycle_series as series;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use epicycle_core::{
        ByteSize, CancelToken, Coefficient, Degree, KernelError, Result, SymbolSet,
    };
    pub use epicycle_monomial::{
        DynMonomial, HasDegree, Key, KeyMul, PackedMonomial, TrigMonomial,
    };
    pub use epicycle_power::{
        get_truncation, make_power_series, make_power_series_in,
        make_power_series_truncated_in, set_partial_truncation, set_total_truncation,
        truncate, unset_truncation, PowerSeries, PowerTag, Truncation,
    };
    pub use epicycle_series::{
        differentiate, integrate, make_polynomials, make_polynomials_in, Polynomial,
        SegmentedTable, Series, SeriesTag, Untagged,
    };
}
