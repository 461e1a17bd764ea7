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

//! # Zone Work Splitting
//!
//! When a shared zone receives disproportionately more work through one of
//! its two owners, a weld inside the zone is cut in place so both owners
//! carry comparable totals. Splitting only fires on real contention (both
//! owners must have work inside the band) and only on welds long enough
//! that both fragments respect the minimum segment length.

use crate::planning::PlanConfig;
use gantry_weld_model::id::{RobotId, WeldId};
use gantry_weld_model::scene::Scene;
use gantry_weld_model::weld::WeldArena;
use gantry_weld_core::space::SpaceLength;
use std::collections::BTreeMap;
use tracing::debug;

/// Which robot carries which welds; the unit the strategies and the
/// splitter exchange. `BTreeMap` keeps robot-id iteration order
/// deterministic.
pub type Assignments = BTreeMap<RobotId, Vec<WeldId>>;

/// Rebalances shared-zone workloads by splitting welds in place.
#[derive(Debug, Clone, Copy)]
pub struct ZoneWorkSplitter<'a> {
    scene: &'a Scene,
    config: &'a PlanConfig,
}

impl<'a> ZoneWorkSplitter<'a> {
    pub fn new(scene: &'a Scene, config: &'a PlanConfig) -> Self {
        Self { scene, config }
    }

    /// Applies the rebalancing rule to every zone of the scene, mutating
    /// `arena` (fragments replace their parent) and `assignments`.
    pub fn balance(&self, arena: &mut WeldArena, assignments: &mut Assignments) {
        for zone in self.scene.zones() {
            let &[a, b] = zone.priority() else {
                // Splitting is defined for two-owner zones only.
                continue;
            };
            self.balance_zone(arena, assignments, zone.name(), a, b, zone);
        }
    }

    fn balance_zone(
        &self,
        arena: &mut WeldArena,
        assignments: &mut Assignments,
        zone_name: &str,
        a: RobotId,
        b: RobotId,
        zone: &gantry_weld_model::scene::ZoneSpec,
    ) {
        let in_zone = |arena: &WeldArena, assignments: &Assignments, robot: RobotId| {
            assignments
                .get(&robot)
                .map(|ids| {
                    ids.iter()
                        .filter(|&&id| {
                            arena.get(id).is_some_and(|w| zone.contains_y(w.y()))
                        })
                        .copied()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        };

        // Not a true contention unless both owners work inside the band.
        let a_zone = in_zone(arena, assignments, a);
        let b_zone = in_zone(arena, assignments, b);
        if a_zone.is_empty() || b_zone.is_empty() {
            return;
        }

        let load = |arena: &WeldArena, assignments: &Assignments, robot: RobotId| {
            assignments
                .get(&robot)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|&id| arena.get(id).map(|w| w.length()))
                        .sum::<SpaceLength>()
                })
                .unwrap_or(SpaceLength::zero())
        };

        let load_a = load(arena, assignments, a);
        let load_b = load(arena, assignments, b);
        let imbalance =
            (load_a - load_b).abs().ratio_of(load_a.max(load_b));
        if imbalance <= self.config.imbalance_threshold {
            return;
        }

        let (heavier, lighter, heavier_zone) = if load_a > load_b {
            (a, b, a_zone)
        } else {
            (b, a, b_zone)
        };

        // Longest splittable weld gives the most headroom for the cut.
        let candidate = heavier_zone
            .iter()
            .filter(|&&id| {
                arena
                    .get(id)
                    .is_some_and(|w| w.length() >= self.config.min_split_weld)
            })
            .max_by(|&&x, &&y| {
                let lx = arena.get(x).unwrap().length();
                let ly = arena.get(y).unwrap().length();
                lx.partial_cmp(&ly).unwrap()
            });
        let Some(&weld_id) = candidate else {
            return;
        };

        let (x_start, x_end, length) = {
            let w = arena.get(weld_id).unwrap();
            (w.x_start(), w.x_end(), w.length())
        };

        let total = load_a + load_b;
        let shed = load_a.max(load_b) - total / 2.0;
        let fraction = shed.ratio_of(length).clamp(0.0, 1.0);
        let split_x = (x_start + length * fraction).clamp(
            x_start + self.config.min_split_segment,
            x_end - self.config.min_split_segment,
        );

        let (near, far) = arena
            .split(weld_id, split_x)
            .expect("candidate weld is in the arena");

        // The heavier owner sheds the near fragment and keeps the far one.
        let heavier_ids = assignments.entry(heavier).or_default();
        heavier_ids.retain(|&id| id != weld_id);
        heavier_ids.push(far);
        assignments.entry(lighter).or_default().push(near);

        debug!(
            zone = zone_name,
            weld = %weld_id,
            split_x = split_x.value(),
            heavier = %heavier,
            lighter = %lighter,
            "split shared-zone weld to rebalance workloads"
        );
    }
}
