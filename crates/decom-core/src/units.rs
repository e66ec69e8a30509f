//! Unit newtypes for the quantities carried by a network snapshot.
//!
//! Generator limits and outputs are stored as [`Megawatts`] / [`Megavars`] so that
//! active and reactive quantities cannot be mixed by accident when the decommitment
//! controller sums minimum outputs against demand. Voltages carried through as
//! warm-start state use [`PerUnit`] and [`Radians`].
//!
//! All types are `#[repr(transparent)]` over `f64`.
//!
//! ```
//! use decom_core::units::{Megawatts, Megavars};
//!
//! let floor = Megawatts(40.0) + Megawatts(25.0);
//! assert_eq!(floor.value(), 65.0);
//!
//! // let wrong = floor + Megavars(5.0); // does not compile
//! let _q = Megavars(5.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

macro_rules! unit_newtype {
    ($type:ident, $symbol:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self {
                Self(self.0 * rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> f64 {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $symbol)
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }
    };
}

/// Active power (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

unit_newtype!(Megawatts, "MW");

/// Reactive power (Mvar)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megavars(pub f64);

unit_newtype!(Megavars, "Mvar");

/// Voltage magnitude in per-unit of the bus base voltage
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct PerUnit(pub f64);

unit_newtype!(PerUnit, "pu");

/// Voltage angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Radians(pub f64);

unit_newtype!(Radians, "rad");

impl Radians {
    /// Build from an angle given in degrees (case files store degrees).
    pub fn from_degrees(deg: f64) -> Self {
        Self(deg.to_radians())
    }

    pub fn to_degrees(self) -> f64 {
        self.0.to_degrees()
    }
}
