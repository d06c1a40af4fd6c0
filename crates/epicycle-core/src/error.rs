//! The error taxonomy of the series engine.
//!
//! Every fallible operation in the workspace reports one of the kinds
//! below. The engine never logs; callers decide what to do with a
//! failure.

use thiserror::Error;

/// Errors produced by the series engine.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    /// A monomial does not fit its symbol set: wrong exponent count,
    /// an exponent outside the packable range, or an invalid layout
    /// (e.g. a trigonometric monomial whose first nonzero exponent is
    /// negative).
    #[error("invalid monomial shape: {0}")]
    InvalidShape(String),

    /// A packed exponent slot overflowed during monomial multiplication.
    #[error("packed exponent overflow: {0}")]
    MonomialOverflow(String),

    /// A symbol name was not found in the relevant symbol set.
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    /// A binary operation was attempted on two series whose truncation
    /// policies disagree.
    #[error("incompatible truncation policies: {0}")]
    IncompatibleTruncation(String),

    /// Integrating a term with exponent -1 in the integration variable
    /// would produce a logarithmic term.
    #[error("term is not integrable: {0}")]
    NonIntegrable(String),

    /// A failure propagated from the coefficient implementation.
    #[error("coefficient arithmetic failed: {0}")]
    Coefficient(String),

    /// Cooperative cancellation was observed at a granule boundary.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = KernelError::UnknownSymbol("q".to_string());
        assert_eq!(e.to_string(), "unknown symbol 'q'");

        let e = KernelError::Cancelled;
        assert_eq!(e.to_string(), "operation cancelled");
    }
}
