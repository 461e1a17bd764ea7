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

//! # Core Primitives
//!
//! This module provides the [`Interval`] building block used throughout the
//! crate family. Weld spans along X and shared-zone bands along Y are both
//! *closed* intervals: a weld that starts exactly at the gantry position is
//! reachable, and a robot sitting exactly on a zone boundary is inside the
//! zone. The interval is therefore inclusive at both ends, unlike the
//! half-open ranges common in index arithmetic.

use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Sub};

/// A closed interval `[lo, hi]`.
///
/// Bounds are normalized on construction, so `lo <= hi` always holds.
/// Containment is inclusive at both ends.
///
/// # Examples
///
/// ```
/// use gantry_weld_core::primitives::Interval;
/// let span = Interval::new(300.0, 2700.0);
/// assert_eq!(span.lo(), 300.0);
/// assert_eq!(span.hi(), 2700.0);
/// assert!(span.contains(300.0));
/// assert!(span.contains(2700.0));
/// assert!(!span.contains(2700.1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval<T> {
    lo: T,
    hi: T,
}

impl<T> Interval<T> {
    /// Creates a new closed interval `[lo, hi]`, swapping the bounds if they
    /// arrive in descending order.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are not comparable (NaN).
    ///
    /// # Examples
    ///
    /// ```
    /// use gantry_weld_core::primitives::Interval;
    ///
    /// let i = Interval::new(5.0, 3.0);
    /// assert_eq!(i.lo(), 3.0);
    /// assert_eq!(i.hi(), 5.0);
    /// ```
    #[inline]
    pub fn new(a: T, b: T) -> Self
    where
        T: PartialOrd + Copy,
    {
        let ord = a
            .partial_cmp(&b)
            .expect("Interval::new: non-comparable bounds (NaN?)");
        let (lo, hi) = match ord {
            Ordering::Greater => (b, a),
            _ => (a, b),
        };
        Self { lo, hi }
    }

    /// Returns the lower bound (inclusive).
    #[inline]
    pub fn lo(&self) -> T
    where
        T: Copy,
    {
        self.lo
    }

    /// Returns the upper bound (inclusive).
    #[inline]
    pub fn hi(&self) -> T
    where
        T: Copy,
    {
        self.hi
    }

    /// Returns `true` when the interval has collapsed to a single point.
    #[inline]
    pub fn is_degenerate(&self) -> bool
    where
        T: PartialEq,
    {
        self.lo == self.hi
    }

    /// Checks whether `x` lies inside the interval, inclusive at both ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use gantry_weld_core::primitives::Interval;
    ///
    /// let band = Interval::new(800.0, 1200.0);
    /// assert!(band.contains(800.0));
    /// assert!(band.contains(1000.0));
    /// assert!(band.contains(1200.0));
    /// assert!(!band.contains(1200.5));
    /// ```
    #[inline]
    pub fn contains(&self, x: T) -> bool
    where
        T: PartialOrd,
    {
        x >= self.lo && x <= self.hi
    }

    /// Checks whether this interval fully contains `other`.
    #[inline]
    pub fn contains_interval(&self, other: &Self) -> bool
    where
        T: PartialOrd,
    {
        other.lo >= self.lo && other.hi <= self.hi
    }

    /// Checks whether two closed intervals share at least one point.
    ///
    /// Touching at an endpoint counts as an intersection, because both ends
    /// are inclusive.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool
    where
        T: PartialOrd + Copy,
    {
        let lo = if self.lo > other.lo { self.lo } else { other.lo };
        let hi = if self.hi < other.hi { self.hi } else { other.hi };
        lo <= hi
    }

    /// Returns the overlap of two intervals, or `None` when they are disjoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use gantry_weld_core::primitives::Interval;
    ///
    /// let a = Interval::new(0.0, 10.0);
    /// let b = Interval::new(5.0, 15.0);
    /// assert_eq!(a.intersection(&b), Some(Interval::new(5.0, 10.0)));
    ///
    /// let c = Interval::new(11.0, 12.0);
    /// assert_eq!(a.intersection(&c), None);
    /// ```
    #[inline]
    pub fn intersection(&self, other: &Self) -> Option<Self>
    where
        T: PartialOrd + Copy,
    {
        let lo = if self.lo > other.lo { self.lo } else { other.lo };
        let hi = if self.hi < other.hi { self.hi } else { other.hi };
        (lo <= hi).then_some(Self { lo, hi })
    }

    /// Measures the extent of the interval as `hi - lo`.
    ///
    /// The output type is whatever the subtraction of two bounds yields,
    /// so `Interval<XPosition>` measures as a `SpaceLength`.
    #[inline]
    pub fn measure<D>(&self) -> D
    where
        T: Copy + Sub<Output = D>,
    {
        self.hi - self.lo
    }

    /// Returns the midpoint of the interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use gantry_weld_core::primitives::Interval;
    ///
    /// let i = Interval::new(2.0, 6.0);
    /// assert_eq!(i.midpoint(), 4.0);
    /// ```
    #[inline]
    pub fn midpoint(&self) -> T
    where
        T: FromPrimitive + Copy + Sub<Output = T> + Div<T, Output = T> + Add<T, Output = T>,
    {
        self.lo + (self.hi - self.lo) / T::from_u8(2).unwrap()
    }
}

impl<T: fmt::Display> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_descending_bounds() {
        let i = Interval::new(5.0, 3.0);
        assert_eq!(i.lo(), 3.0);
        assert_eq!(i.hi(), 5.0);
    }

    #[test]
    fn new_keeps_sorted_bounds() {
        let i = Interval::new(-4.0, 9.0);
        assert_eq!(i.lo(), -4.0);
        assert_eq!(i.hi(), 9.0);
    }

    #[test]
    #[should_panic]
    fn new_panics_on_nan_bound() {
        let _ = Interval::new(f64::NAN, 1.0);
    }

    #[test]
    fn contains_is_inclusive_at_both_ends() {
        let i = Interval::new(10.0, 20.0);
        assert!(i.contains(10.0));
        assert!(i.contains(20.0));
        assert!(i.contains(15.0));
        assert!(!i.contains(9.99));
        assert!(!i.contains(20.01));
    }

    #[test]
    fn degenerate_interval_contains_its_point() {
        let i = Interval::new(3.0, 3.0);
        assert!(i.is_degenerate());
        assert!(i.contains(3.0));
    }

    #[test]
    fn intersects_counts_touching_endpoints() {
        let a = Interval::new(0.0, 10.0);
        let b = Interval::new(10.0, 20.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn intersects_false_when_disjoint() {
        let a = Interval::new(0.0, 5.0);
        let b = Interval::new(5.5, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn intersection_of_touching_intervals_is_a_point() {
        let a = Interval::new(0.0, 10.0);
        let b = Interval::new(10.0, 20.0);
        let i = a.intersection(&b).unwrap();
        assert!(i.is_degenerate());
        assert_eq!(i.lo(), 10.0);
    }

    #[test]
    fn intersection_returns_overlap() {
        let a = Interval::new(0.0, 10.0);
        let b = Interval::new(5.0, 15.0);
        assert_eq!(a.intersection(&b), Some(Interval::new(5.0, 10.0)));
    }

    #[test]
    fn contains_interval_for_nested_and_equal() {
        let a = Interval::new(1.0, 5.0);
        assert!(a.contains_interval(&Interval::new(2.0, 4.0)));
        assert!(a.contains_interval(&Interval::new(1.0, 5.0)));
        assert!(!a.contains_interval(&Interval::new(0.0, 6.0)));
    }

    #[test]
    fn measure_is_hi_minus_lo() {
        let i = Interval::new(2.0, 5.5);
        assert_eq!(i.measure::<f64>(), 3.5);
    }

    #[test]
    fn midpoint_of_symmetric_interval() {
        let i = Interval::new(-10.0, 10.0);
        assert_eq!(i.midpoint(), 0.0);
    }

    #[test]
    fn display_formats_as_closed() {
        let i = Interval::new(1.0, 5.0);
        assert_eq!(format!("{}", i), "[1, 5]");
    }
}
