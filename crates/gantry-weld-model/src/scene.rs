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

//! # Scene
//!
//! The static geometry and kinematic limits of the welding cell: the gantry
//! rail, the robots riding it, the shared Y bands where neighbouring robots
//! interfere, and the two global tolerances (reach radius, safe distance).
//! A scene is validated on construction and never mutates; the planner and
//! the simulator both borrow it.

use crate::id::RobotId;
use crate::robot::Robot;
use crate::weld::Side;
use gantry_weld_core::space::{BandInterval, SpaceLength, YPosition};
use gantry_weld_core::velocity::Velocity;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Default robot reach radius from the workspace center, in mm.
pub const DEFAULT_REACH: SpaceLength = SpaceLength::new(2000.0);

/// Default minimum separation of two robots inside a shared zone, in mm.
pub const DEFAULT_SAFE_DISTANCE: SpaceLength = SpaceLength::new(150.0);

/// The gantry rail: travel length and top speed along X, plus the Y span of
/// the workspace it carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GantrySpec {
    x_length: SpaceLength,
    speed: Velocity,
    y_span: SpaceLength,
}

impl GantrySpec {
    pub fn new(x_length: SpaceLength, speed: Velocity, y_span: SpaceLength) -> Self {
        Self {
            x_length,
            speed,
            y_span,
        }
    }

    #[inline]
    pub fn x_length(&self) -> SpaceLength {
        self.x_length
    }

    #[inline]
    pub fn speed(&self) -> Velocity {
        self.speed
    }

    #[inline]
    pub fn y_span(&self) -> SpaceLength {
        self.y_span
    }
}

/// A named shared Y band with a strict priority order over the robots that
/// may enter it. The first robot in the priority list wins contention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    name: String,
    band: BandInterval,
    priority: Vec<RobotId>,
}

impl ZoneSpec {
    pub fn new(name: impl Into<String>, band: BandInterval, priority: Vec<RobotId>) -> Self {
        Self {
            name: name.into(),
            band,
            priority,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn band(&self) -> BandInterval {
        self.band
    }

    #[inline]
    pub fn priority(&self) -> &[RobotId] {
        &self.priority
    }

    /// Band membership, inclusive at both ends.
    #[inline]
    pub fn contains_y(&self, y: YPosition) -> bool {
        self.band.contains(y)
    }

    /// Whether `robot` is allowed into this zone at all.
    #[inline]
    pub fn admits(&self, robot: RobotId) -> bool {
        self.priority.contains(&robot)
    }

    /// Position of `robot` in the priority order; lower ranks win.
    #[inline]
    pub fn rank_of(&self, robot: RobotId) -> Option<usize> {
        self.priority.iter().position(|&r| r == robot)
    }
}

/// Errors raised while assembling a [`Scene`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneBuildError {
    NoRobots,
    DuplicateRobotId(RobotId),
    NonPositiveTcpSpeed(RobotId),
    BandOutsideWorkspace(RobotId),
    NonPositiveGantry,
    EmptyZonePriority(String),
    UnknownPriorityRobot { zone: String, robot: RobotId },
    ZoneOutsideWorkspace(String),
}

impl Display for SceneBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneBuildError::NoRobots => write!(f, "Scene has no robots"),
            SceneBuildError::DuplicateRobotId(id) => write!(f, "Duplicate robot id: {}", id),
            SceneBuildError::NonPositiveTcpSpeed(id) => {
                write!(f, "Robot {} has a non-positive TCP speed", id)
            }
            SceneBuildError::BandOutsideWorkspace(id) => {
                write!(f, "Robot {} band lies outside the workspace Y span", id)
            }
            SceneBuildError::NonPositiveGantry => {
                write!(f, "Gantry length and speed must be positive")
            }
            SceneBuildError::EmptyZonePriority(zone) => {
                write!(f, "Zone {} has an empty priority list", zone)
            }
            SceneBuildError::UnknownPriorityRobot { zone, robot } => {
                write!(f, "Zone {} names unknown robot {}", zone, robot)
            }
            SceneBuildError::ZoneOutsideWorkspace(zone) => {
                write!(f, "Zone {} band lies outside the workspace Y span", zone)
            }
        }
    }
}

impl std::error::Error for SceneBuildError {}

/// The validated, immutable description of the welding cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    gantry: GantrySpec,
    robots: Vec<Robot>,
    zones: Vec<ZoneSpec>,
    reach: SpaceLength,
    safe_distance: SpaceLength,
}

impl Scene {
    /// Builds a scene with the default reach and safe distance.
    pub fn new(
        gantry: GantrySpec,
        robots: Vec<Robot>,
        zones: Vec<ZoneSpec>,
    ) -> Result<Self, SceneBuildError> {
        Self::with_tolerances(gantry, robots, zones, DEFAULT_REACH, DEFAULT_SAFE_DISTANCE)
    }

    pub fn with_tolerances(
        gantry: GantrySpec,
        mut robots: Vec<Robot>,
        zones: Vec<ZoneSpec>,
        reach: SpaceLength,
        safe_distance: SpaceLength,
    ) -> Result<Self, SceneBuildError> {
        if !gantry.x_length().is_positive() || !gantry.speed().is_positive() {
            return Err(SceneBuildError::NonPositiveGantry);
        }
        if robots.is_empty() {
            return Err(SceneBuildError::NoRobots);
        }

        // Robot-id order is the tick order everywhere downstream.
        robots.sort_by_key(|r| r.id());
        let workspace = BandInterval::new(
            YPosition::zero(),
            YPosition::zero() + gantry.y_span(),
        );

        for pair in robots.windows(2) {
            if pair[0].id() == pair[1].id() {
                return Err(SceneBuildError::DuplicateRobotId(pair[0].id()));
            }
        }
        for robot in &robots {
            if !robot.tcp_speed().is_positive() {
                return Err(SceneBuildError::NonPositiveTcpSpeed(robot.id()));
            }
            if !workspace.contains_interval(&robot.band()) {
                return Err(SceneBuildError::BandOutsideWorkspace(robot.id()));
            }
        }
        for zone in &zones {
            if zone.priority().is_empty() {
                return Err(SceneBuildError::EmptyZonePriority(zone.name().to_string()));
            }
            if !workspace.contains_interval(&zone.band()) {
                return Err(SceneBuildError::ZoneOutsideWorkspace(zone.name().to_string()));
            }
            for &robot in zone.priority() {
                if !robots.iter().any(|r| r.id() == robot) {
                    return Err(SceneBuildError::UnknownPriorityRobot {
                        zone: zone.name().to_string(),
                        robot,
                    });
                }
            }
        }

        Ok(Self {
            gantry,
            robots,
            zones,
            reach,
            safe_distance,
        })
    }

    #[inline]
    pub fn gantry(&self) -> &GantrySpec {
        &self.gantry
    }

    /// Robots in id order.
    #[inline]
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    #[inline]
    pub fn zones(&self) -> &[ZoneSpec] {
        &self.zones
    }

    #[inline]
    pub fn reach(&self) -> SpaceLength {
        self.reach
    }

    #[inline]
    pub fn safe_distance(&self) -> SpaceLength {
        self.safe_distance
    }

    #[inline]
    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.iter().find(|r| r.id() == id)
    }

    #[inline]
    pub fn robots_on(&self, side: Side) -> impl Iterator<Item = &Robot> {
        self.robots.iter().filter(move |r| r.side() == side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gantry() -> GantrySpec {
        GantrySpec::new(
            SpaceLength::new(6000.0),
            Velocity::new(300.0),
            SpaceLength::new(3000.0),
        )
    }

    fn robot(id: u32, side: Side, lo: f64, hi: f64) -> Robot {
        Robot::new(
            RobotId::new(id),
            side,
            BandInterval::new(YPosition::new(lo), YPosition::new(hi)),
            Velocity::new(120.0),
            SpaceLength::new(if matches!(side, Side::XPlus) {
                300.0
            } else {
                -300.0
            }),
        )
    }

    fn zone(name: &str, a: u32, b: u32) -> ZoneSpec {
        ZoneSpec::new(
            name,
            BandInterval::new(YPosition::new(800.0), YPosition::new(1200.0)),
            vec![RobotId::new(a), RobotId::new(b)],
        )
    }

    #[test]
    fn builds_the_reference_cell() {
        let scene = Scene::new(
            gantry(),
            vec![
                robot(1, Side::XPlus, 0.0, 1000.0),
                robot(3, Side::XPlus, 1000.0, 2000.0),
                robot(2, Side::XMinus, 0.0, 1000.0),
                robot(4, Side::XMinus, 1000.0, 2000.0),
            ],
            vec![zone("s1", 1, 3), zone("s2", 2, 4)],
        )
        .unwrap();

        assert_eq!(scene.robots().len(), 4);
        assert_eq!(scene.reach(), DEFAULT_REACH);
        assert_eq!(scene.safe_distance(), DEFAULT_SAFE_DISTANCE);
        // Sorted into id order regardless of input order.
        let ids: Vec<u32> = scene.robots().iter().map(|r| r.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_empty_robot_list() {
        assert_eq!(
            Scene::new(gantry(), vec![], vec![]).unwrap_err(),
            SceneBuildError::NoRobots
        );
    }

    #[test]
    fn rejects_duplicate_robot_ids() {
        let err = Scene::new(
            gantry(),
            vec![
                robot(1, Side::XPlus, 0.0, 1000.0),
                robot(1, Side::XMinus, 0.0, 1000.0),
            ],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, SceneBuildError::DuplicateRobotId(RobotId::new(1)));
    }

    #[test]
    fn rejects_zone_naming_unknown_robot() {
        let err = Scene::new(
            gantry(),
            vec![robot(1, Side::XPlus, 0.0, 1000.0)],
            vec![zone("s1", 1, 9)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SceneBuildError::UnknownPriorityRobot {
                zone: "s1".to_string(),
                robot: RobotId::new(9)
            }
        );
    }

    #[test]
    fn rejects_band_outside_workspace() {
        let err = Scene::new(
            gantry(),
            vec![robot(1, Side::XPlus, 2500.0, 3500.0)],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, SceneBuildError::BandOutsideWorkspace(RobotId::new(1)));
    }

    #[test]
    fn zone_rank_follows_priority_order() {
        let z = zone("s1", 1, 3);
        assert_eq!(z.rank_of(RobotId::new(1)), Some(0));
        assert_eq!(z.rank_of(RobotId::new(3)), Some(1));
        assert_eq!(z.rank_of(RobotId::new(2)), None);
        assert!(z.admits(RobotId::new(3)));
        assert!(!z.admits(RobotId::new(2)));
    }
}
