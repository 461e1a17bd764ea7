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

//! # Overshoot-Free Motion
//!
//! Every moving entity in the simulator (the gantry along X, robots along
//! Y) uses the same stepping rule: advance by at most `max_step` towards
//! the target, never past it, and snap onto the target once within the snap
//! window. The remaining distance is monotonically non-increasing, so no
//! entity can oscillate around its target.

use crate::space::{SpaceLength, XPosition, YPosition};

/// Advances `current` towards `target` by at most `max_step`.
///
/// When the remaining distance is within `snap`, the position snaps onto the
/// target and the move reports arrival. Otherwise the step is
/// `min(max_step, |target - current|)`, which lands exactly on the target in
/// the final step instead of overshooting.
///
/// Returns the new position and whether the target has been reached.
///
/// # Examples
///
/// ```
/// use gantry_weld_core::motion::step_toward;
///
/// let (next, arrived) = step_toward(500.0, 600.0, 12.0, 1.0);
/// assert_eq!(next, 512.0);
/// assert!(!arrived);
///
/// let (next, arrived) = step_toward(599.5, 600.0, 12.0, 1.0);
/// assert_eq!(next, 600.0);
/// assert!(arrived);
/// ```
#[inline]
pub fn step_toward(current: f64, target: f64, max_step: f64, snap: f64) -> (f64, bool) {
    let delta = target - current;
    if delta.abs() <= snap {
        return (target, true);
    }
    let step = max_step.min(delta.abs());
    let next = current + delta.signum() * step;
    (next, next == target)
}

impl XPosition {
    /// Overshoot-free step towards `target` along the gantry travel axis.
    #[inline]
    pub fn step_toward(
        self,
        target: XPosition,
        max_step: SpaceLength,
        snap: SpaceLength,
    ) -> (XPosition, bool) {
        let (v, arrived) = step_toward(self.value(), target.value(), max_step.value(), snap.value());
        (XPosition::new(v), arrived)
    }
}

impl YPosition {
    /// Overshoot-free step towards `target` along a robot traverse axis.
    #[inline]
    pub fn step_toward(
        self,
        target: YPosition,
        max_step: SpaceLength,
        snap: SpaceLength,
    ) -> (YPosition, bool) {
        let (v, arrived) = step_toward(self.value(), target.value(), max_step.value(), snap.value());
        (YPosition::new(v), arrived)
    }
}
