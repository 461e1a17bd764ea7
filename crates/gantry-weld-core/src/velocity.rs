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

//! # Velocities
//!
//! [`Velocity`] closes the kinematic triangle with the space and time types:
//! `Velocity * TimeDelta = SpaceLength` and `SpaceLength / Velocity =
//! TimeDelta`. The weld-on-move gantry speed is the minimum over the welding
//! robots' TCP speeds, so `min` is part of the public surface.

use crate::space::SpaceLength;
use crate::time::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

/// A speed in millimetres per second.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Velocity(f64);

impl Velocity {
    #[inline]
    pub const fn new(mm_per_s: f64) -> Self {
        Self(mm_per_s)
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

impl From<f64> for Velocity {
    #[inline]
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl Mul<TimeDelta> for Velocity {
    type Output = SpaceLength;

    #[inline]
    fn mul(self, rhs: TimeDelta) -> Self::Output {
        SpaceLength::new(self.0 * rhs.value())
    }
}

impl Mul<Velocity> for TimeDelta {
    type Output = SpaceLength;

    #[inline]
    fn mul(self, rhs: Velocity) -> Self::Output {
        rhs * self
    }
}

impl Div<Velocity> for SpaceLength {
    type Output = TimeDelta;

    #[inline]
    fn div(self, rhs: Velocity) -> Self::Output {
        TimeDelta::new(self.value() / rhs.0)
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Velocity({} mm/s)", self.0)
    }
}
