//! # epicycle-monomial
//!
//! Bit-packed monomials for efficient sparse multivariate arithmetic.
//!
//! Three packed layouts are provided:
//! - [`PackedMonomial`]: all exponents in a single machine word
//!   (unsigned), for small symbol counts
//! - [`DynMonomial`]: a sequence of words each holding up to `PSIZE`
//!   signed exponents, for arbitrary symbol counts and Laurent-style
//!   negative exponents
//! - [`TrigMonomial`]: the dynamic layout plus a cosine/sine type bit,
//!   for Poisson-series keys
//!
//! The [`Key`], [`KeyMul`] and [`HasDegree`] traits are the seams the
//! term container, the series operators and the multiplier work
//! against.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod dynamic;
mod kpack;
pub mod key;
pub mod packed;
mod proptests;
pub mod trig;

pub use dynamic::DynMonomial;
pub use key::{HasDegree, Key, KeyMul};
pub use packed::PackedMonomial;
pub use trig::TrigMonomial;
