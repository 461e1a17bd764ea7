// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Spatial Types
//!
//! The workspace has two axes that are never interchangeable: the gantry
//! translates along **X**, robots traverse along **Y**. [`XPosition`] and
//! [`YPosition`] are distinct newtypes so that a weld's Y coordinate can
//! never be compared against the gantry position by accident.
//! [`SpaceLength`] is the shared signed extent type (mm) produced by
//! subtracting two positions on either axis.

use crate::primitives::Interval;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A position along the gantry travel axis, in millimetres.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XPosition(f64);

/// A position along a robot traverse axis, in millimetres.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YPosition(f64);

/// A signed extent or difference in millimetres.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceLength(f64);

/// A weld extent along the gantry travel axis.
pub type SpanInterval = Interval<XPosition>;

/// A Y band: a robot's nominal range or a shared-zone band.
pub type BandInterval = Interval<YPosition>;

macro_rules! position_impl {
    ($name:ident) => {
        impl $name {
            #[inline]
            pub const fn new(v: f64) -> Self {
                Self(v)
            }

            #[inline]
            pub const fn zero() -> Self {
                Self(0.0)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Absolute distance to another position on the same axis.
            #[inline]
            pub fn distance_to(self, other: Self) -> SpaceLength {
                SpaceLength((self.0 - other.0).abs())
            }

            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            #[inline]
            pub fn clamp(self, lo: Self, hi: Self) -> Self {
                Self(self.0.clamp(lo.0, hi.0))
            }
        }

        impl From<f64> for $name {
            #[inline]
            fn from(v: f64) -> Self {
                Self(v)
            }
        }

        impl Add<SpaceLength> for $name {
            type Output = $name;

            #[inline]
            fn add(self, rhs: SpaceLength) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub<SpaceLength> for $name {
            type Output = $name;

            #[inline]
            fn sub(self, rhs: SpaceLength) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Sub<$name> for $name {
            type Output = SpaceLength;

            #[inline]
            fn sub(self, rhs: $name) -> Self::Output {
                SpaceLength(self.0 - rhs.0)
            }
        }

        impl AddAssign<SpaceLength> for $name {
            #[inline]
            fn add_assign(&mut self, rhs: SpaceLength) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign<SpaceLength> for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: SpaceLength) {
                self.0 -= rhs.0;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

position_impl!(XPosition);
position_impl!(YPosition);

impl SpaceLength {
    #[inline]
    pub const fn new(v: f64) -> Self {
        Self(v)
    }

    #[inline]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    #[inline]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        Self(self.0.clamp(lo.0, hi.0))
    }

    /// Dimensionless ratio of two lengths.
    ///
    /// # Examples
    ///
    /// ```
    /// use gantry_weld_core::space::SpaceLength;
    /// let a = SpaceLength::new(500.0);
    /// let b = SpaceLength::new(2000.0);
    /// assert_eq!(a.ratio_of(b), 0.25);
    /// ```
    #[inline]
    pub fn ratio_of(self, denom: Self) -> f64 {
        self.0 / denom.0
    }
}

impl From<f64> for SpaceLength {
    #[inline]
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl Add for SpaceLength {
    type Output = SpaceLength;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for SpaceLength {
    type Output = SpaceLength;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for SpaceLength {
    type Output = SpaceLength;

    #[inline]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<f64> for SpaceLength {
    type Output = SpaceLength;

    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for SpaceLength {
    type Output = SpaceLength;

    #[inline]
    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl AddAssign for SpaceLength {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for SpaceLength {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for SpaceLength {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl fmt::Display for SpaceLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpaceLength({})", self.0)
    }
}

impl SpanInterval {
    /// The X midpoint of the span.
    #[inline]
    pub fn center(&self) -> XPosition {
        XPosition((self.lo().value() + self.hi().value()) / 2.0)
    }
}

impl BandInterval {
    /// The Y midpoint of the band.
    #[inline]
    pub fn center(&self) -> YPosition {
        YPosition((self.lo().value() + self.hi().value()) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn position_plus_length_moves_along_axis() {
        let x = XPosition::new(300.0) + SpaceLength::new(150.0);
        assert_relative_eq!(x.value(), 450.0);
    }

    #[test]
    fn position_difference_is_a_signed_length() {
        let d = XPosition::new(300.0) - XPosition::new(500.0);
        assert_relative_eq!(d.value(), -200.0);
        assert_relative_eq!(d.abs().value(), 200.0);
    }

    #[test]
    fn distance_to_is_symmetric() {
        let a = YPosition::new(700.0);
        let b = YPosition::new(300.0);
        assert_eq!(a.distance_to(b), b.distance_to(a));
        assert_relative_eq!(a.distance_to(b).value(), 400.0);
    }

    #[test]
    fn length_ratio_is_dimensionless() {
        let r = SpaceLength::new(1250.0).ratio_of(SpaceLength::new(2000.0));
        assert_relative_eq!(r, 0.625);
    }

    #[test]
    fn lengths_sum_over_iterators() {
        let total: SpaceLength = [100.0, 200.0, 50.5]
            .into_iter()
            .map(SpaceLength::new)
            .sum();
        assert_relative_eq!(total.value(), 350.5);
    }

    #[test]
    fn span_center_is_the_midpoint() {
        let span = SpanInterval::new(XPosition::new(300.0), XPosition::new(2700.0));
        assert_relative_eq!(span.center().value(), 1500.0);
    }

    #[test]
    fn band_measure_yields_length() {
        let band = BandInterval::new(YPosition::new(0.0), YPosition::new(1000.0));
        let len: SpaceLength = band.measure();
        assert_relative_eq!(len.value(), 1000.0);
    }

    #[test]
    fn display_carries_the_type_name() {
        assert_eq!(format!("{}", XPosition::new(300.0)), "XPosition(300)");
        assert_eq!(format!("{}", SpaceLength::new(-5.5)), "SpaceLength(-5.5)");
    }
}
