//! Fixed-point price and quantity arithmetic.
//!
//! All hot-path values are signed 64-bit integers at a fixed scale of
//! `10^8` (eight decimal places). Floating point appears only at the
//! boundaries: signal inputs and monitoring readouts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Scale factor for fixed-point prices and quantities: `10^8`.
pub const FIXED_SCALE: i64 = 100_000_000;

/// Scale factor for basis-point arithmetic: one bp = 1/10_000.
pub const BPS_SCALE: i64 = 10_000;

/// A fixed-point price at scale [`FIXED_SCALE`].
///
/// Prices are plain `i64` values with an implied `10^8` divisor, so
/// `Price::from_f64(10000.5)` stores `1_000_050_000_000`. All comparisons
/// and arithmetic stay in integer space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Price(i64);

/// A fixed-point quantity at scale [`FIXED_SCALE`].
///
/// Quantities are signed so the same type can carry net positions; book
/// levels only ever hold non-negative values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Qty(i64);

macro_rules! fixed_point_impl {
    ($name:ident) => {
        impl $name {
            /// The zero value.
            pub const ZERO: Self = Self(0);

            /// Wrap a raw fixed-point integer.
            #[inline]
            #[must_use]
            pub const fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw fixed-point integer.
            #[inline]
            #[must_use]
            pub const fn raw(self) -> i64 {
                self.0
            }

            /// Convert from a real-unit value. Boundary use only.
            #[inline]
            #[must_use]
            pub fn from_f64(value: f64) -> Self {
                Self((value * FIXED_SCALE as f64).round() as i64)
            }

            /// Convert to a real-unit value. Boundary use only.
            #[inline]
            #[must_use]
            pub fn to_f64(self) -> f64 {
                self.0 as f64 / FIXED_SCALE as f64
            }

            /// Whole units truncated toward zero.
            #[inline]
            #[must_use]
            pub const fn whole(self) -> i64 {
                self.0 / FIXED_SCALE
            }

            #[inline]
            #[must_use]
            pub const fn is_zero(self) -> bool {
                self.0 == 0
            }

            #[inline]
            #[must_use]
            pub const fn is_positive(self) -> bool {
                self.0 > 0
            }

            #[inline]
            #[must_use]
            pub const fn is_negative(self) -> bool {
                self.0 < 0
            }

            /// Absolute value, saturating at `i64::MAX`.
            #[inline]
            #[must_use]
            pub const fn abs(self) -> Self {
                Self(self.0.saturating_abs())
            }

            #[inline]
            #[must_use]
            pub const fn min(self, other: Self) -> Self {
                if self.0 <= other.0 { self } else { other }
            }

            #[inline]
            #[must_use]
            pub const fn max(self, other: Self) -> Self {
                if self.0 >= other.0 { self } else { other }
            }

            /// Saturating addition on the raw representation.
            #[inline]
            #[must_use]
            pub const fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            /// Saturating subtraction on the raw representation.
            #[inline]
            #[must_use]
            pub const fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }

            /// Multiply by a basis-point factor: `self * bps / 10_000`.
            ///
            /// Intermediate math widens to `i128` so large prices cannot
            /// overflow.
            #[inline]
            #[must_use]
            pub const fn mul_bps(self, bps: i64) -> Self {
                Self((self.0 as i128 * bps as i128 / BPS_SCALE as i128) as i64)
            }

            /// Fraction of this value expressed in basis points relative
            /// to `base`: `10_000 * self / base`. Zero when `base` is zero.
            #[inline]
            #[must_use]
            pub const fn as_bps_of(self, base: Self) -> i64 {
                if base.0 == 0 {
                    return 0;
                }
                (self.0 as i128 * BPS_SCALE as i128 / base.0 as i128) as i64
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl AddAssign for $name {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let sign = if self.0 < 0 { "-" } else { "" };
                let abs = self.0.unsigned_abs();
                let whole = abs / FIXED_SCALE as u64;
                let frac = abs % FIXED_SCALE as u64;
                write!(f, "{sign}{whole}.{frac:08}")
            }
        }
    };
}

fixed_point_impl!(Price);
fixed_point_impl!(Qty);

impl Price {
    /// Integer midpoint of two prices, widening to avoid overflow.
    #[inline]
    #[must_use]
    pub const fn midpoint(self, other: Self) -> Self {
        Self(((self.0 as i128 + other.0 as i128) / 2) as i64)
    }
}

/// Notional value `price * qty` at scale [`FIXED_SCALE`], computed in
/// `i128` and saturating instead of wrapping near the extremes.
#[inline]
#[must_use]
pub const fn notional(price: Price, qty: Qty) -> i128 {
    let wide = price.raw() as i128 * qty.raw() as i128;
    wide / FIXED_SCALE as i128
}
