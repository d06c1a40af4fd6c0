//! # epicycle-core
//!
//! Core infrastructure for the Epicycle series engine.
//!
//! This crate provides:
//! - The [`KernelError`] taxonomy shared by every fallible operation
//! - Ordered symbol sets with merging and re-indexing
//! - A process-wide value interner
//! - The [`Coefficient`] abstraction and its primitive implementations
//! - Byte-size accounting and cooperative cancellation primitives

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod byte_size;
pub mod cancel;
pub mod coefficient;
pub mod error;
pub mod intern;
pub mod symbols;

pub use byte_size::ByteSize;
pub use cancel::CancelToken;
pub use coefficient::Coefficient;
pub use error::{KernelError, Result};
pub use intern::Interner;
pub use symbols::{SymbolMap, SymbolSet};

/// The degree type used throughout the engine.
///
/// Signed, so that Laurent-style monomials with negative exponents
/// have a meaningful degree.
pub type Degree = i64;
