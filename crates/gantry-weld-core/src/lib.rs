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

//! # Core Primitives for the Gantry Welding Planner
//!
//! This crate provides the typed foundation shared by the model, the planner
//! and the simulator. It establishes distinct newtypes for the two spatial
//! axes of the machine, for lengths, for simulated time and for velocities,
//! so that kinematic arithmetic is checked at compile time:
//!
//! - **Space**:
//!   - [`space::XPosition`]: a position along the gantry travel axis (mm).
//!   - [`space::YPosition`]: a position along a robot's traverse axis (mm).
//!   - [`space::SpaceLength`]: a signed extent or difference (mm).
//! - **Time**:
//!   - [`time::TimePoint`]: an instant of simulated time (s).
//!   - [`time::TimeDelta`]: a duration (s).
//! - **Velocity**:
//!   - [`velocity::Velocity`]: a speed (mm/s), with
//!     `Velocity * TimeDelta = SpaceLength`.
//! - **Intervals**:
//!   - [`primitives::Interval`]: a closed interval `[lo, hi]`, used for weld
//!     spans along X and shared-zone bands along Y.
//! - **Motion**:
//!   - [`motion::step_toward`]: the single overshoot-free stepping primitive
//!     every moving entity uses.

pub mod motion;
pub mod primitives;
pub mod space;
pub mod time;
pub mod velocity;
