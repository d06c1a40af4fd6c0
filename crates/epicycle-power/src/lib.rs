//! # epicycle-power
//!
//! Truncated power series for the Epicycle engine.
//!
//! A power series is a [`Series`](epicycle_series::Series) carrying a
//! [`PowerTag`]: an interned truncation limit with three shapes (none,
//! total degree, partial degree over a symbol subset). The limit is
//! enforced on construction, addition and multiplication, and fused
//! into the multiplier's inner loop for early pair rejection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod power;
pub mod trunc;

pub use power::{
    get_truncation, make_power_series, make_power_series_in, make_power_series_p_truncated_in,
    make_power_series_truncated, make_power_series_truncated_in, set_partial_truncation,
    set_total_truncation, truncate, unset_truncation, PowerSeries, PowerTag,
};
pub use trunc::{TruncRef, Truncation};
