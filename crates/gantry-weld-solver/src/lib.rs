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

//! # Planner and Simulator
//!
//! The engine of the gantry welding cell. Planning turns a weld set and a
//! scene into an ordered [`gantry_weld_model::plan::Plan`]: weld-on-move
//! windows (continuous sweeps at fixed robot Ys) followed by stop-and-weld
//! stops (stationary gantry, robots traversing Y). The simulator then steps
//! that plan forward in fixed time increments against a physical model of
//! gantry, robots, weld progress and shared-zone locks.
//!
//! - [`zones`]: per-zone mutexes with strict priority arbitration.
//! - [`balance`]: in-place weld splitting to even out shared-zone workloads.
//! - [`wom`]: the continuous-sweep strategy.
//! - [`saw`]: the discrete-stop strategy.
//! - [`planning`]: mode dispatch and validation; the `plan` entry point.
//! - [`sim`]: the deterministic, single-threaded tick loop.

pub mod balance;
pub mod planning;
pub mod saw;
pub mod sim;
pub mod wom;
pub mod zones;
