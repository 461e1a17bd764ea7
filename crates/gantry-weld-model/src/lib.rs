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

//! # Domain Model
//!
//! The entities of the gantry welding cell: welds, robots, the gantry rail,
//! shared zones, the scene that ties them together, and the plan artefacts
//! the planner produces for the simulator to execute. Entities reference
//! each other by id ([`id::WeldId`], [`id::RobotId`]); the arenas that
//! resolve those ids are owned by whoever executes the plan.

pub mod err;
pub mod generator;
pub mod id;
pub mod plan;
pub mod robot;
pub mod scene;
pub mod weld;

pub mod prelude {
    pub use crate::err::{
        EmptySceneError, GeometryFault, InvalidGeometryError, PlanningError, UnreachableWeldError,
    };
    pub use crate::id::{RobotId, WeldId};
    pub use crate::plan::{Mode, Plan, SawStop, WeldTask, WomWindow};
    pub use crate::robot::Robot;
    pub use crate::scene::{GantrySpec, Scene, SceneBuildError, ZoneSpec};
    pub use crate::weld::{Side, Weld, WeldArena};
}
