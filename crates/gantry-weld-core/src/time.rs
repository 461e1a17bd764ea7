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

//! # Simulated Time
//!
//! Timekeeping in the simulator is logical: a [`TimePoint`] is an instant of
//! simulated seconds since plan start, a [`TimeDelta`] is a duration. The
//! usual point/delta arithmetic applies; two points subtract to a delta,
//! points never add.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// An instant of simulated time, in seconds since plan start.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(f64);

/// A duration of simulated time, in seconds.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeDelta(f64);

impl TimePoint {
    #[inline]
    pub const fn new(seconds: f64) -> Self {
        Self(seconds)
    }

    #[inline]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TimeDelta {
    #[inline]
    pub const fn new(seconds: f64) -> Self {
        Self(seconds)
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
}

impl From<f64> for TimePoint {
    #[inline]
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl From<f64> for TimeDelta {
    #[inline]
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl Add<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn add(self, rhs: TimeDelta) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sub<TimePoint> for TimePoint {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: TimePoint) -> Self::Output {
        TimeDelta(self.0 - rhs.0)
    }
}

impl AddAssign<TimeDelta> for TimePoint {
    #[inline]
    fn add_assign(&mut self, rhs: TimeDelta) {
        self.0 += rhs.0;
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<f64> for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl AddAssign for TimeDelta {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for TimeDelta {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for TimeDelta {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePoint({}s)", self.0)
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeDelta({}s)", self.0)
    }
}
