//! The coefficient abstraction.
//!
//! The engine is generic over its numeric type: anything that can be
//! zero-tested, combined in place and multiplied can serve as a series
//! coefficient. Arbitrary-precision types live outside the workspace
//! and plug in through this trait; the primitive implementations below
//! cover machine integers and floats.

use std::fmt::Debug;

use num_traits::{One, Zero};

use crate::byte_size::ByteSize;
use crate::error::{KernelError, Result};

/// A series coefficient.
///
/// All arithmetic is fallible so that implementations with partial
/// operations (overflow-checked integers, rationals with division)
/// can surface [`KernelError::Coefficient`] instead of panicking.
pub trait Coefficient:
    Clone + PartialEq + Debug + ByteSize + Send + Sync + 'static
{
    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Returns true if this is the additive identity.
    fn is_zero(&self) -> bool;

    /// Adds `rhs` in place.
    fn try_add_assign(&mut self, rhs: &Self) -> Result<()>;

    /// Subtracts `rhs` in place.
    fn try_sub_assign(&mut self, rhs: &Self) -> Result<()>;

    /// Multiplies two coefficients.
    fn try_mul(&self, rhs: &Self) -> Result<Self>;

    /// Returns the additive inverse.
    fn try_neg(&self) -> Result<Self>;

    /// Multiplies by a machine integer (used by differentiation).
    fn try_mul_int(&self, n: i64) -> Result<Self>;

    /// Divides exactly by a machine integer (used by integration).
    ///
    /// Implementations without exact division report
    /// [`KernelError::Coefficient`] when the quotient is not
    /// representable.
    fn try_div_int(&self, n: i64) -> Result<Self>;
}

macro_rules! impl_int_coefficient {
    ($($t:ty),*) => {$(
        impl Coefficient for $t {
            fn zero() -> Self {
                <$t as Zero>::zero()
            }

            fn one() -> Self {
                <$t as One>::one()
            }

            fn is_zero(&self) -> bool {
                Zero::is_zero(self)
            }

            fn try_add_assign(&mut self, rhs: &Self) -> Result<()> {
                *self = self.checked_add(*rhs).ok_or_else(|| {
                    KernelError::Coefficient(format!(
                        "integer overflow in {} + {}",
                        self, rhs
                    ))
                })?;
                Ok(())
            }

            fn try_sub_assign(&mut self, rhs: &Self) -> Result<()> {
                *self = self.checked_sub(*rhs).ok_or_else(|| {
                    KernelError::Coefficient(format!(
                        "integer overflow in {} - {}",
                        self, rhs
                    ))
                })?;
                Ok(())
            }

            fn try_mul(&self, rhs: &Self) -> Result<Self> {
                self.checked_mul(*rhs).ok_or_else(|| {
                    KernelError::Coefficient(format!(
                        "integer overflow in {} * {}",
                        self, rhs
                    ))
                })
            }

            fn try_neg(&self) -> Result<Self> {
                self.checked_neg().ok_or_else(|| {
                    KernelError::Coefficient(format!("integer overflow negating {}", self))
                })
            }

            fn try_mul_int(&self, n: i64) -> Result<Self> {
                let n = <$t>::try_from(n).map_err(|_| {
                    KernelError::Coefficient(format!("{} is out of range", n))
                })?;
                self.try_mul(&n)
            }

            fn try_div_int(&self, n: i64) -> Result<Self> {
                if n == 0 {
                    return Err(KernelError::Coefficient(
                        "division by zero".to_string(),
                    ));
                }
                let n = <$t>::try_from(n).map_err(|_| {
                    KernelError::Coefficient(format!("{} is out of range", n))
                })?;
                if self % n != 0 {
                    return Err(KernelError::Coefficient(format!(
                        "{} is not divisible by {}",
                        self, n
                    )));
                }
                Ok(self / n)
            }
        }
    )*};
}

impl_int_coefficient!(i32, i64, i128);

impl Coefficient for f64 {
    fn zero() -> Self {
        <f64 as Zero>::zero()
    }

    fn one() -> Self {
        <f64 as One>::one()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn try_add_assign(&mut self, rhs: &Self) -> Result<()> {
        *self += rhs;
        Ok(())
    }

    fn try_sub_assign(&mut self, rhs: &Self) -> Result<()> {
        *self -= rhs;
        Ok(())
    }

    fn try_mul(&self, rhs: &Self) -> Result<Self> {
        Ok(self * rhs)
    }

    fn try_neg(&self) -> Result<Self> {
        Ok(-self)
    }

    fn try_mul_int(&self, n: i64) -> Result<Self> {
        #[allow(clippy::cast_precision_loss)]
        Ok(self * n as f64)
    }

    fn try_div_int(&self, n: i64) -> Result<Self> {
        if n == 0 {
            return Err(KernelError::Coefficient("division by zero".to_string()));
        }
        #[allow(clippy::cast_precision_loss)]
        Ok(self / n as f64)
    }
}
