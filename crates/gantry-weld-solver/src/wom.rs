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

//! # Weld-on-Move Strategy
//!
//! Plans continuous-motion execution: the gantry sweeps monotonically along
//! X while each participating robot welds at one fixed Y. Welds are grouped
//! by X proximity and reach, each weld goes to exactly one robot on its own
//! side, shared-zone workloads are rebalanced by splitting, and the gantry
//! start position is chosen so every robot's first weld start is within
//! reach the moment the sweep begins.

use crate::balance::{Assignments, ZoneWorkSplitter};
use crate::planning::PlanConfig;
use gantry_weld_model::id::{RobotId, WeldId};
use gantry_weld_model::plan::{WeldTask, WomWindow};
use gantry_weld_model::robot::Robot;
use gantry_weld_model::scene::Scene;
use gantry_weld_model::weld::{Weld, WeldArena};
use gantry_weld_core::space::{SpaceLength, XPosition, YPosition};
use std::collections::BTreeMap;
use tracing::debug;

/// What WOM planning produced: the sweep windows, plus welds no candidate
/// robot could reach at fixed Y; those fall through to stop-and-weld.
#[derive(Debug, Clone)]
pub struct WomOutcome {
    pub windows: Vec<WomWindow>,
    pub overflow: Vec<WeldId>,
}

#[derive(Debug, Clone, Copy)]
pub struct WomStrategy<'a> {
    scene: &'a Scene,
    config: &'a PlanConfig,
}

impl<'a> WomStrategy<'a> {
    pub fn new(scene: &'a Scene, config: &'a PlanConfig) -> Self {
        Self { scene, config }
    }

    /// A weld qualifies for continuous sweeping once it is long enough that
    /// holding a fixed Y pays off.
    #[inline]
    pub fn is_eligible(&self, weld: &Weld) -> bool {
        weld.length() >= self.config.min_wom_length
    }

    /// Plans sweep windows over `ids`, splitting shared-zone welds in place.
    pub fn plan(&self, arena: &mut WeldArena, ids: Vec<WeldId>) -> WomOutcome {
        let mut windows = Vec::new();
        let mut overflow = Vec::new();

        for group in self.group_by_proximity(arena, ids) {
            let (mut assignments, mut missed) = self.assign_group(arena, &group);
            overflow.append(&mut missed);
            if assignments.values().all(|ids| ids.is_empty()) {
                continue;
            }

            ZoneWorkSplitter::new(self.scene, self.config).balance(arena, &mut assignments);

            let mut positions: BTreeMap<RobotId, YPosition> = BTreeMap::new();
            for (&robot, ids) in &assignments {
                if !ids.is_empty() {
                    positions.insert(robot, self.optimal_y(arena, robot, ids));
                }
            }
            self.separate_zone_neighbours(&mut positions);

            windows.push(self.emit_window(arena, &assignments, &positions));
        }

        debug!(
            windows = windows.len(),
            overflow = overflow.len(),
            "weld-on-move planning finished"
        );
        WomOutcome { windows, overflow }
    }

    /// Groups welds sorted by `x_start`; a weld joins the open group while
    /// the gap to the group's X maximum stays within `max_group_gap` or
    /// within reach.
    fn group_by_proximity(&self, arena: &WeldArena, mut ids: Vec<WeldId>) -> Vec<Vec<WeldId>> {
        ids.sort_by(|&a, &b| {
            let xa = arena.get(a).unwrap().x_start();
            let xb = arena.get(b).unwrap().x_start();
            xa.partial_cmp(&xb).unwrap()
        });

        let mut groups: Vec<Vec<WeldId>> = Vec::new();
        let mut group: Vec<WeldId> = Vec::new();
        let mut group_x_max = XPosition::zero();

        for id in ids {
            let w = arena.get(id).unwrap();
            if group.is_empty() {
                group_x_max = w.x_end();
                group.push(id);
                continue;
            }
            let gap = w.x_start() - group_x_max;
            if gap <= self.config.max_group_gap || gap <= self.scene.reach() {
                group_x_max = group_x_max.max(w.x_end());
                group.push(id);
            } else {
                groups.push(std::mem::take(&mut group));
                group_x_max = w.x_end();
                group.push(id);
            }
        }
        if !group.is_empty() {
            groups.push(group);
        }
        groups
    }

    /// Assigns every weld of a group to exactly one robot on the matching
    /// side. In-band welds go to the nearest-center robot (ties by load);
    /// gap welds go to the upper candidate within reach (nearest band
    /// start, then load). Welds beyond everyone's reach are returned
    /// separately.
    fn assign_group(&self, arena: &WeldArena, group: &[WeldId]) -> (Assignments, Vec<WeldId>) {
        let mut assignments = Assignments::new();
        let mut overflow = Vec::new();
        let mut loads: BTreeMap<RobotId, SpaceLength> = BTreeMap::new();

        for &id in group {
            let w = arena.get(id).unwrap();
            let candidates: Vec<&Robot> = self.scene.robots_on(w.side()).collect();

            let chosen = self
                .pick_in_band(w, &candidates, &loads)
                .or_else(|| self.pick_gap(w, &candidates, &loads));

            match chosen {
                Some(robot) => {
                    assignments.entry(robot).or_default().push(id);
                    *loads.entry(robot).or_insert(SpaceLength::zero()) += w.length();
                }
                None => overflow.push(id),
            }
        }
        (assignments, overflow)
    }

    fn pick_in_band(
        &self,
        w: &Weld,
        candidates: &[&Robot],
        loads: &BTreeMap<RobotId, SpaceLength>,
    ) -> Option<RobotId> {
        candidates
            .iter()
            .filter(|r| r.is_within_band(w.y()))
            .min_by(|a, b| {
                let da = w.y().distance_to(a.workspace_center()).value();
                let db = w.y().distance_to(b.workspace_center()).value();
                let la = loads.get(&a.id()).copied().unwrap_or_default().value();
                let lb = loads.get(&b.id()).copied().unwrap_or_default().value();
                (da, la).partial_cmp(&(db, lb)).unwrap()
            })
            .map(|r| r.id())
    }

    fn pick_gap(
        &self,
        w: &Weld,
        candidates: &[&Robot],
        loads: &BTreeMap<RobotId, SpaceLength>,
    ) -> Option<RobotId> {
        let reach = self.scene.reach();
        let reachable: Vec<&&Robot> = candidates
            .iter()
            .filter(|r| r.can_reach(w.y(), reach))
            .collect();

        // Upper candidates sit entirely above the weld. Preferring them
        // balances the bracket: lower robots keep their own band while the
        // upper ones stretch down across the dead band.
        let upper = reachable
            .iter()
            .filter(|r| r.band().lo() > w.y())
            .min_by(|a, b| {
                let la = loads.get(&a.id()).copied().unwrap_or_default().value();
                let lb = loads.get(&b.id()).copied().unwrap_or_default().value();
                (a.band().lo().value(), la)
                    .partial_cmp(&(b.band().lo().value(), lb))
                    .unwrap()
            });
        if let Some(r) = upper {
            return Some(r.id());
        }

        reachable
            .iter()
            .filter(|r| r.band().hi() < w.y())
            .min_by(|a, b| {
                let da = w.y().value() - a.band().hi().value();
                let db = w.y().value() - b.band().hi().value();
                let la = loads.get(&a.id()).copied().unwrap_or_default().value();
                let lb = loads.get(&b.id()).copied().unwrap_or_default().value();
                (da, la).partial_cmp(&(db, lb)).unwrap()
            })
            .map(|r| r.id())
    }

    /// Length-weighted mean of the assigned welds' Ys, limited to one reach
    /// from the workspace center but deliberately not clamped to the band.
    fn optimal_y(&self, arena: &WeldArena, robot: RobotId, ids: &[WeldId]) -> YPosition {
        let robot = self.scene.robot(robot).expect("assigned robot exists");
        let mut weighted = 0.0;
        let mut total = 0.0;
        for &id in ids {
            let w = arena.get(id).unwrap();
            weighted += w.y().value() * w.length().value();
            total += w.length().value();
        }
        if total == 0.0 {
            return robot.workspace_center();
        }
        let center = robot.workspace_center();
        let reach = self.scene.reach();
        YPosition::new(weighted / total).clamp(center - reach, center + reach)
    }

    /// Pushes zone-sharing neighbours apart to the safe distance, equally in
    /// both directions, within reach limits. Residual proximity is left to
    /// the runtime mutex.
    fn separate_zone_neighbours(&self, positions: &mut BTreeMap<RobotId, YPosition>) {
        let safe = self.scene.safe_distance();
        for zone in self.scene.zones() {
            let &[a, b] = zone.priority() else {
                continue;
            };
            let (Some(&ya), Some(&yb)) = (positions.get(&a), positions.get(&b)) else {
                continue;
            };
            if !zone.contains_y(ya) || !zone.contains_y(yb) {
                continue;
            }
            if ya.distance_to(yb) >= safe {
                continue;
            }

            let (upper, lower) = self.order_by_height(a, b, ya, yb);
            let mid = YPosition::new((ya.value() + yb.value()) / 2.0);
            let reach = self.scene.reach();
            let clamp = |robot: RobotId, y: YPosition| {
                let center = self.scene.robot(robot).unwrap().workspace_center();
                y.clamp(center - reach, center + reach)
            };
            let up = clamp(upper, mid + safe / 2.0);
            let down = clamp(lower, mid - safe / 2.0);
            positions.insert(upper, up);
            positions.insert(lower, down);

            if up.distance_to(down) < safe {
                // Reach limits kept them close; the lower-priority robot
                // will serialize on the zone mutex at runtime.
                debug!(
                    zone = zone.name(),
                    upper = %upper,
                    lower = %lower,
                    "zone neighbours remain within safe distance"
                );
            }
        }
    }

    fn order_by_height(
        &self,
        a: RobotId,
        b: RobotId,
        ya: YPosition,
        yb: YPosition,
    ) -> (RobotId, RobotId) {
        if ya == yb {
            let ca = self.scene.robot(a).unwrap().workspace_center();
            let cb = self.scene.robot(b).unwrap().workspace_center();
            if ca >= cb { (a, b) } else { (b, a) }
        } else if ya > yb {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Emits the window: tasks per robot in id order, welds in X order, and
    /// the sweep bounds. The start is the furthest-forward of all robots'
    /// minimum reachable positions, never before the earliest weld start or
    /// the rail origin, so all first welds are reachable at sweep onset.
    fn emit_window(
        &self,
        arena: &WeldArena,
        assignments: &Assignments,
        positions: &BTreeMap<RobotId, YPosition>,
    ) -> WomWindow {
        let reach = self.scene.reach();
        let mut start = XPosition::zero();
        let mut earliest: Option<XPosition> = None;
        let mut end = XPosition::zero();

        for (&robot, ids) in assignments {
            if ids.is_empty() {
                continue;
            }
            let offset = self.scene.robot(robot).unwrap().carriage_offset();
            let first = ids
                .iter()
                .map(|&id| arena.get(id).unwrap().x_start())
                .fold(XPosition::new(f64::INFINITY), XPosition::min);
            let gantry_min = first - reach - offset;
            start = start.max(gantry_min);
            earliest = Some(earliest.map_or(first, |e| e.min(first)));
            for &id in ids {
                end = end.max(arena.get(id).unwrap().x_end());
            }
        }
        if let Some(e) = earliest {
            start = start.max(e);
        }

        let mut tasks = Vec::new();
        for (&robot, ids) in assignments {
            if ids.is_empty() {
                continue;
            }
            let y = positions[&robot];
            let mut sorted = ids.clone();
            sorted.sort_by(|&p, &q| {
                let xp = arena.get(p).unwrap().x_start();
                let xq = arena.get(q).unwrap().x_start();
                xp.partial_cmp(&xq).unwrap()
            });
            for id in sorted {
                let w = arena.get(id).unwrap();
                tasks.push(WeldTask::new(
                    robot,
                    id,
                    y,
                    w.x_start(),
                    w.x_end(),
                    w.length(),
                ));
            }
        }

        WomWindow::new(start, end, tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gantry_weld_model::scene::{GantrySpec, ZoneSpec};
    use gantry_weld_model::weld::Side;
    use gantry_weld_core::space::BandInterval;
    use gantry_weld_core::velocity::Velocity;

    const R1: RobotId = RobotId::new(1);
    const R2: RobotId = RobotId::new(2);
    const R3: RobotId = RobotId::new(3);
    const R4: RobotId = RobotId::new(4);

    fn robot(id: u32, side: Side, lo: f64, hi: f64) -> Robot {
        let offset = match side {
            Side::XPlus => 300.0,
            Side::XMinus => -300.0,
        };
        Robot::new(
            RobotId::new(id),
            side,
            BandInterval::new(YPosition::new(lo), YPosition::new(hi)),
            Velocity::new(120.0),
            SpaceLength::new(offset),
        )
    }

    /// The gap configuration: two robot pairs bracketing a 1000..2000 dead
    /// band, gantry 300 mm/s, TCP 120 mm/s, reach 2000.
    fn gap_scene() -> Scene {
        Scene::new(
            GantrySpec::new(
                SpaceLength::new(6000.0),
                Velocity::new(300.0),
                SpaceLength::new(3000.0),
            ),
            vec![
                robot(1, Side::XPlus, 0.0, 1000.0),
                robot(2, Side::XMinus, 0.0, 1000.0),
                robot(3, Side::XPlus, 2000.0, 3000.0),
                robot(4, Side::XMinus, 2000.0, 3000.0),
            ],
            vec![],
        )
        .unwrap()
    }

    fn gap_welds() -> Vec<Weld> {
        let weld = |id: u64, x0: f64, x1: f64, y: f64, side: Side| {
            Weld::new(
                WeldId::new(id),
                XPosition::new(x0),
                XPosition::new(x1),
                YPosition::new(y),
                side,
            )
        };
        vec![
            weld(1, 300.0, 2700.0, 300.0, Side::XPlus),
            weld(2, 700.0, 1200.0, 700.0, Side::XMinus),
            weld(3, 1200.0, 3300.0, 1300.0, Side::XPlus),
            weld(4, 300.0, 2700.0, 1700.0, Side::XMinus),
        ]
    }

    #[test]
    fn proximate_welds_form_a_single_window() {
        let scene = gap_scene();
        let config = PlanConfig::default();
        let mut arena = WeldArena::from_welds(gap_welds());
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        assert_eq!(outcome.windows.len(), 1);
        assert!(outcome.overflow.is_empty());
    }

    #[test]
    fn in_band_welds_go_to_the_nearest_robot_gap_welds_to_the_upper() {
        let scene = gap_scene();
        let config = PlanConfig::default();
        let mut arena = WeldArena::from_welds(gap_welds());
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        let window = &outcome.windows[0];

        let owner = |wid: u64| {
            window
                .tasks()
                .iter()
                .find(|t| t.weld() == WeldId::new(wid))
                .map(|t| t.robot())
                .unwrap()
        };
        assert_eq!(owner(1), R1);
        assert_eq!(owner(2), R2);
        // W3 at Y=1300 and W4 at Y=1700 sit in the dead band; the upper
        // robots take them via reach.
        assert_eq!(owner(3), R3);
        assert_eq!(owner(4), R4);
    }

    #[test]
    fn single_weld_robot_holds_the_weld_y() {
        let scene = gap_scene();
        let config = PlanConfig::default();
        let mut arena = WeldArena::from_welds(gap_welds());
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        for task in outcome.windows[0].tasks() {
            let w = arena.get(task.weld()).unwrap();
            assert_relative_eq!(task.y().value(), w.y().value());
        }
    }

    #[test]
    fn window_start_lets_every_robot_reach_its_first_weld() {
        let scene = gap_scene();
        let config = PlanConfig::default();
        let mut arena = WeldArena::from_welds(gap_welds());
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        let window = &outcome.windows[0];
        assert_relative_eq!(window.start_x().value(), 300.0);
        assert_relative_eq!(window.end_x().value(), 3300.0);

        // Every first weld start is within reach at sweep onset.
        let mut first_of: BTreeMap<RobotId, XPosition> = BTreeMap::new();
        for t in window.tasks() {
            let entry = first_of.entry(t.robot()).or_insert(t.x_start());
            *entry = entry.min(t.x_start());
        }
        for (robot, first) in first_of {
            let offset = scene.robot(robot).unwrap().carriage_offset();
            let carriage = window.start_x() + offset;
            assert!(first.distance_to(carriage) <= scene.reach());
        }
    }

    #[test]
    fn far_apart_welds_split_into_windows() {
        let scene = gap_scene();
        let config = PlanConfig::default();
        let weld = |id: u64, x0: f64, x1: f64| {
            Weld::new(
                WeldId::new(id),
                XPosition::new(x0),
                XPosition::new(x1),
                YPosition::new(300.0),
                Side::XPlus,
            )
        };
        // Gap of 2500 mm between the seams exceeds both the 500 mm group
        // gap and the 2000 mm reach.
        let mut arena = WeldArena::from_welds(vec![weld(1, 0.0, 1000.0), weld(2, 3500.0, 4500.0)]);
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        assert_eq!(outcome.windows.len(), 2);
    }

    #[test]
    fn weighted_mean_y_balances_two_welds_by_length() {
        let scene = gap_scene();
        let config = PlanConfig::default();
        let weld = |id: u64, x0: f64, x1: f64, y: f64| {
            Weld::new(
                WeldId::new(id),
                XPosition::new(x0),
                XPosition::new(x1),
                YPosition::new(y),
                Side::XPlus,
            )
        };
        // 3000 mm at Y=300 and 1000 mm at Y=700: mean = (300*3 + 700*1)/4.
        let mut arena =
            WeldArena::from_welds(vec![weld(1, 0.0, 3000.0, 300.0), weld(2, 0.0, 1000.0, 700.0)]);
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        let task = &outcome.windows[0].tasks()[0];
        assert_eq!(task.robot(), R1);
        assert_relative_eq!(task.y().value(), 400.0);
    }

    #[test]
    fn zone_neighbours_are_pushed_to_the_safe_distance() {
        let scene = Scene::new(
            GantrySpec::new(
                SpaceLength::new(6000.0),
                Velocity::new(300.0),
                SpaceLength::new(3000.0),
            ),
            vec![
                robot(1, Side::XPlus, 0.0, 1000.0),
                robot(3, Side::XPlus, 1000.0, 2000.0),
            ],
            vec![ZoneSpec::new(
                "s1",
                BandInterval::new(YPosition::new(800.0), YPosition::new(1200.0)),
                vec![R1, R3],
            )],
        )
        .unwrap();
        let config = PlanConfig::default();

        // Both robots end up targeting Y positions 40 mm apart inside the
        // band: R1 at 980, R3 at 1020.
        let weld = |id: u64, x0: f64, x1: f64, y: f64| {
            Weld::new(
                WeldId::new(id),
                XPosition::new(x0),
                XPosition::new(x1),
                YPosition::new(y),
                Side::XPlus,
            )
        };
        let mut arena =
            WeldArena::from_welds(vec![weld(1, 0.0, 2000.0, 980.0), weld(2, 0.0, 2000.0, 1020.0)]);
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        let window = &outcome.windows[0];
        let y_of = |r: RobotId| {
            window
                .tasks()
                .iter()
                .find(|t| t.robot() == r)
                .unwrap()
                .y()
        };
        let y1 = y_of(R1);
        let y3 = y_of(R3);
        assert_relative_eq!(y1.distance_to(y3).value(), 150.0, epsilon = 1e-9);
        // Pushed apart symmetrically around the 1000 mm midpoint.
        assert_relative_eq!((y1.value() + y3.value()) / 2.0, 1000.0, epsilon = 1e-9);
        assert!(y3 > y1);
    }

    #[test]
    fn unreachable_side_welds_overflow_to_stop_and_weld() {
        // Only an x_plus robot at the bottom; an x_plus weld at Y=2900 is
        // beyond its 2000 mm reach from center 500.
        let scene = Scene::new(
            GantrySpec::new(
                SpaceLength::new(6000.0),
                Velocity::new(300.0),
                SpaceLength::new(3000.0),
            ),
            vec![robot(1, Side::XPlus, 0.0, 1000.0)],
            vec![],
        )
        .unwrap();
        let config = PlanConfig::default();
        let mut arena = WeldArena::from_welds(vec![Weld::new(
            WeldId::new(1),
            XPosition::new(0.0),
            XPosition::new(1000.0),
            YPosition::new(2900.0),
            Side::XPlus,
        )]);
        let ids: Vec<WeldId> = arena.ids().collect();

        let outcome = WomStrategy::new(&scene, &config).plan(&mut arena, ids);
        assert!(outcome.windows.is_empty());
        assert_eq!(outcome.overflow, vec![WeldId::new(1)]);
    }
}
