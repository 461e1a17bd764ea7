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

//! Planning failure kinds. Planning errors fail the whole call; no partial
//! plan is ever returned. Runtime contention is not an error, it is the
//! `WAIT_MUTEX` state.

use crate::id::WeldId;
use crate::weld::Side;
use gantry_weld_core::space::YPosition;
use std::fmt::Display;

/// No robot on the weld's side can reach its Y within the scene reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnreachableWeldError {
    id: WeldId,
    y: YPosition,
    side: Side,
}

impl UnreachableWeldError {
    #[inline]
    pub fn new(id: WeldId, y: YPosition, side: Side) -> Self {
        Self { id, y, side }
    }

    #[inline]
    pub fn id(&self) -> WeldId {
        self.id
    }

    #[inline]
    pub fn y(&self) -> YPosition {
        self.y
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }
}

impl Display for UnreachableWeldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Weld {} at {} is beyond reach of every {} robot",
            self.id, self.y, self.side
        )
    }
}

impl std::error::Error for UnreachableWeldError {}

/// What exactly is wrong with a weld's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFault {
    /// The span has zero length.
    EmptySpan,
    /// The span leaves the `[0, x_length]` rail.
    SpanOutsideRail,
    /// The Y coordinate leaves the `[0, y_span]` workspace.
    YOutsideWorkspace,
}

impl Display for GeometryFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryFault::EmptySpan => write!(f, "empty span"),
            GeometryFault::SpanOutsideRail => write!(f, "span outside the rail"),
            GeometryFault::YOutsideWorkspace => write!(f, "Y outside the workspace"),
        }
    }
}

/// A weld whose geometry cannot be executed on this scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidGeometryError {
    id: WeldId,
    fault: GeometryFault,
}

impl InvalidGeometryError {
    #[inline]
    pub fn new(id: WeldId, fault: GeometryFault) -> Self {
        Self { id, fault }
    }

    #[inline]
    pub fn id(&self) -> WeldId {
        self.id
    }

    #[inline]
    pub fn fault(&self) -> GeometryFault {
        self.fault
    }
}

impl Display for InvalidGeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Weld {} has invalid geometry: {}", self.id, self.fault)
    }
}

impl std::error::Error for InvalidGeometryError {}

/// Nothing to plan: the weld set is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmptySceneError;

impl Display for EmptySceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No welds to plan")
    }
}

impl std::error::Error for EmptySceneError {}

/// Any failure of the `plan` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningError {
    UnreachableWeld(UnreachableWeldError),
    InvalidGeometry(InvalidGeometryError),
    EmptyScene(EmptySceneError),
}

impl Display for PlanningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanningError::UnreachableWeld(e) => write!(f, "{e}"),
            PlanningError::InvalidGeometry(e) => write!(f, "{e}"),
            PlanningError::EmptyScene(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PlanningError {}

impl From<UnreachableWeldError> for PlanningError {
    fn from(value: UnreachableWeldError) -> Self {
        PlanningError::UnreachableWeld(value)
    }
}

impl From<InvalidGeometryError> for PlanningError {
    fn from(value: InvalidGeometryError) -> Self {
        PlanningError::InvalidGeometry(value)
    }
}

impl From<EmptySceneError> for PlanningError {
    fn from(value: EmptySceneError) -> Self {
        PlanningError::EmptyScene(value)
    }
}
