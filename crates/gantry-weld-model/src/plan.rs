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

//! # Plans
//!
//! The planner's output: an ordered list of weld-on-move windows followed by
//! stop-and-weld stops, each holding [`WeldTask`] commitments, plus the
//! post-split weld set the tasks reference. A plan is a pure value; the
//! simulator executes it without ever mutating it.

use crate::id::{RobotId, WeldId};
use crate::weld::Weld;
use gantry_weld_core::space::{SpaceLength, XPosition, YPosition};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Execution regime selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Continuous sweep: the gantry moves while robots weld at fixed Y.
    Wom,
    /// Discrete stops: the gantry halts while robots traverse Y.
    Saw,
    /// WOM for long welds, SAW for the rest; windows execute first.
    Hybrid,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Wom => write!(f, "wom"),
            Mode::Saw => write!(f, "saw"),
            Mode::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// A commitment for one robot in one window or at one stop.
///
/// `progress_target` is the cumulative `done` level this task drives its
/// weld to. It equals the weld length everywhere except for stop-and-weld
/// passes over a weld that spans several stops, where each pass covers its
/// local X portion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeldTask {
    robot: RobotId,
    weld: WeldId,
    y: YPosition,
    x_start: XPosition,
    x_end: XPosition,
    progress_target: SpaceLength,
}

impl WeldTask {
    pub fn new(
        robot: RobotId,
        weld: WeldId,
        y: YPosition,
        x_start: XPosition,
        x_end: XPosition,
        progress_target: SpaceLength,
    ) -> Self {
        Self {
            robot,
            weld,
            y,
            x_start,
            x_end,
            progress_target,
        }
    }

    #[inline]
    pub fn robot(&self) -> RobotId {
        self.robot
    }

    #[inline]
    pub fn weld(&self) -> WeldId {
        self.weld
    }

    /// The Y position the robot holds (WOM) or moves to (SAW) for this task.
    #[inline]
    pub fn y(&self) -> YPosition {
        self.y
    }

    #[inline]
    pub fn x_start(&self) -> XPosition {
        self.x_start
    }

    #[inline]
    pub fn x_end(&self) -> XPosition {
        self.x_end
    }

    #[inline]
    pub fn progress_target(&self) -> SpaceLength {
        self.progress_target
    }
}

/// A contiguous gantry sweep executing a group of welds at fixed robot Ys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WomWindow {
    start_x: XPosition,
    end_x: XPosition,
    tasks: Vec<WeldTask>,
}

impl WomWindow {
    pub fn new(start_x: XPosition, end_x: XPosition, tasks: Vec<WeldTask>) -> Self {
        Self {
            start_x,
            end_x,
            tasks,
        }
    }

    /// Gantry position at which the sweep begins; chosen so every task's
    /// first weld start is within reach at sweep onset.
    #[inline]
    pub fn start_x(&self) -> XPosition {
        self.start_x
    }

    #[inline]
    pub fn end_x(&self) -> XPosition {
        self.end_x
    }

    #[inline]
    pub fn tasks(&self) -> &[WeldTask] {
        &self.tasks
    }
}

/// A discrete gantry stop and the tasks executed while stationary there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SawStop {
    x: XPosition,
    tasks: Vec<WeldTask>,
}

impl SawStop {
    pub fn new(x: XPosition, tasks: Vec<WeldTask>) -> Self {
        Self { x, tasks }
    }

    #[inline]
    pub fn x(&self) -> XPosition {
        self.x
    }

    #[inline]
    pub fn tasks(&self) -> &[WeldTask] {
        &self.tasks
    }
}

/// The complete, ordered execution plan: windows first, then stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    mode: Mode,
    welds: Vec<Weld>,
    windows: Vec<WomWindow>,
    stops: Vec<SawStop>,
    start_x: XPosition,
}

impl Plan {
    pub fn new(
        mode: Mode,
        welds: Vec<Weld>,
        windows: Vec<WomWindow>,
        stops: Vec<SawStop>,
        start_x: XPosition,
    ) -> Self {
        Self {
            mode,
            welds,
            windows,
            stops,
            start_x,
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The post-split weld set every task references.
    #[inline]
    pub fn welds(&self) -> &[Weld] {
        &self.welds
    }

    #[inline]
    pub fn windows(&self) -> &[WomWindow] {
        &self.windows
    }

    #[inline]
    pub fn stops(&self) -> &[SawStop] {
        &self.stops
    }

    /// Derived optimal gantry start position for the whole plan.
    #[inline]
    pub fn start_x(&self) -> XPosition {
        self.start_x
    }

    #[inline]
    pub fn weld(&self, id: WeldId) -> Option<&Weld> {
        self.welds.iter().find(|w| w.id() == id)
    }

    pub fn task_count(&self) -> usize {
        self.windows.iter().map(|w| w.tasks().len()).sum::<usize>()
            + self.stops.iter().map(|s| s.tasks().len()).sum::<usize>()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &WeldTask> {
        self.windows
            .iter()
            .flat_map(|w| w.tasks().iter())
            .chain(self.stops.iter().flat_map(|s| s.tasks().iter()))
    }

    pub fn total_length(&self) -> SpaceLength {
        self.welds.iter().map(|w| w.length()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weld::Side;

    #[test]
    fn mode_displays_lowercase() {
        assert_eq!(format!("{}", Mode::Wom), "wom");
        assert_eq!(format!("{}", Mode::Hybrid), "hybrid");
    }

    #[test]
    fn plan_counts_tasks_across_windows_and_stops() {
        let w = Weld::new(
            WeldId::new(1),
            XPosition::new(0.0),
            XPosition::new(500.0),
            YPosition::new(300.0),
            Side::XPlus,
        );
        let task = WeldTask::new(
            RobotId::new(1),
            w.id(),
            w.y(),
            w.x_start(),
            w.x_end(),
            w.length(),
        );
        let plan = Plan::new(
            Mode::Hybrid,
            vec![w],
            vec![WomWindow::new(
                XPosition::new(0.0),
                XPosition::new(500.0),
                vec![task.clone()],
            )],
            vec![SawStop::new(XPosition::new(250.0), vec![task])],
            XPosition::new(0.0),
        );
        assert_eq!(plan.task_count(), 2);
        assert_eq!(plan.tasks().count(), 2);
        assert_eq!(plan.total_length(), SpaceLength::new(500.0));
    }
}
