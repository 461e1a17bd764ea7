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

//! # Robots
//!
//! The static description of a welding robot: which gantry side it rides,
//! its nominal Y band, its TCP speed and its carriage X offset. Runtime
//! state (current Y, state machine, counters) lives with the simulator; a
//! `Robot` never mutates.
//!
//! Reach extends beyond the nominal band: a robot may park outside its band
//! to cover a gap weld, but never further than one reach radius from its
//! workspace center.

use crate::id::RobotId;
use crate::weld::Side;
use gantry_weld_core::space::{BandInterval, SpaceLength, YPosition};
use gantry_weld_core::velocity::Velocity;
use serde::{Deserialize, Serialize};

/// Static specification of one welding robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    id: RobotId,
    side: Side,
    band: BandInterval,
    tcp_speed: Velocity,
    carriage_offset: SpaceLength,
}

impl Robot {
    pub fn new(
        id: RobotId,
        side: Side,
        band: BandInterval,
        tcp_speed: Velocity,
        carriage_offset: SpaceLength,
    ) -> Self {
        Self {
            id,
            side,
            band,
            tcp_speed,
            carriage_offset,
        }
    }

    #[inline]
    pub fn id(&self) -> RobotId {
        self.id
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn band(&self) -> BandInterval {
        self.band
    }

    #[inline]
    pub fn tcp_speed(&self) -> Velocity {
        self.tcp_speed
    }

    /// X offset of the welding carriage relative to the gantry position
    /// (positive on the `x_plus` side in the reference cell).
    #[inline]
    pub fn carriage_offset(&self) -> SpaceLength {
        self.carriage_offset
    }

    /// Center of the nominal band; reach is measured from here.
    #[inline]
    pub fn workspace_center(&self) -> YPosition {
        self.band.center()
    }

    /// Whether `y` lies in the nominal band (inclusive at both ends).
    #[inline]
    pub fn is_within_band(&self, y: YPosition) -> bool {
        self.band.contains(y)
    }

    /// Whether `y` is workable from this robot's carriage: within `reach`
    /// of the workspace center, possibly outside the nominal band.
    #[inline]
    pub fn can_reach(&self, y: YPosition, reach: SpaceLength) -> bool {
        y.distance_to(self.workspace_center()) <= reach
    }
}
