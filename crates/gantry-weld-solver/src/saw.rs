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

//! # Stop-and-Weld Strategy
//!
//! Plans discrete stops: the gantry halts at evenly centered X positions
//! and robots traverse in Y to reach scattered short welds. A weld whose
//! span fits no single stop's working window is executed as passes at
//! consecutive covering stops, each pass welding its local X portion; the
//! weld entity itself is never re-cut.

use crate::planning::PlanConfig;
use gantry_weld_model::err::{PlanningError, UnreachableWeldError};
use gantry_weld_model::id::{RobotId, WeldId};
use gantry_weld_model::plan::{SawStop, WeldTask};
use gantry_weld_model::scene::Scene;
use gantry_weld_model::weld::WeldArena;
use gantry_weld_core::space::{SpaceLength, XPosition, YPosition};
use std::collections::BTreeMap;
use tracing::debug;

/// One pass over (part of) a weld at one stop, before robot assignment.
#[derive(Debug, Clone, Copy)]
struct Pass {
    weld: WeldId,
    x_lo: XPosition,
    x_hi: XPosition,
    /// Cumulative `done` level this pass drives the weld to.
    target: SpaceLength,
}

#[derive(Debug, Clone, Copy)]
pub struct SawStrategy<'a> {
    scene: &'a Scene,
    config: &'a PlanConfig,
}

impl<'a> SawStrategy<'a> {
    pub fn new(scene: &'a Scene, config: &'a PlanConfig) -> Self {
        Self { scene, config }
    }

    /// Computes the gantry stop positions covering `ids`: one centered stop
    /// when the overall span fits the stop spacing, otherwise
    /// `ceil(span / spacing)` evenly centered stops.
    pub fn stops(&self, arena: &WeldArena, ids: &[WeldId]) -> Vec<XPosition> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &id in ids {
            let w = arena.get(id).unwrap();
            lo = lo.min(w.x_start().value());
            hi = hi.max(w.x_end().value());
        }
        if !lo.is_finite() {
            return Vec::new();
        }

        let span = hi - lo;
        let spacing = self.config.stop_spacing.value();
        if span <= spacing {
            return vec![XPosition::new((lo + hi) / 2.0)];
        }
        let n = (span / spacing).ceil() as usize;
        (0..n)
            .map(|i| XPosition::new(lo + (i as f64 + 0.5) * span / n as f64))
            .collect()
    }

    /// Plans the stop sequence over `ids`. Stops that receive no work are
    /// dropped from the plan.
    pub fn plan(
        &self,
        arena: &WeldArena,
        ids: Vec<WeldId>,
    ) -> Result<Vec<SawStop>, PlanningError> {
        let stops = self.stops(arena, &ids);
        let mut passes_per_stop: Vec<Vec<Pass>> = vec![Vec::new(); stops.len()];

        for &id in &ids {
            self.place_weld(arena, id, &stops, &mut passes_per_stop);
        }

        let mut plan = Vec::new();
        for (stop_x, passes) in stops.into_iter().zip(passes_per_stop) {
            if passes.is_empty() {
                continue;
            }
            let tasks = self.assign_robots(arena, stop_x, passes)?;
            plan.push(SawStop::new(stop_x, tasks));
        }
        debug!(stops = plan.len(), "stop-and-weld planning finished");
        Ok(plan)
    }

    /// Places one weld: a single pass at the nearest stop whose working
    /// window holds the whole span, or passes at every covering stop for
    /// welds too long for any single window.
    fn place_weld(
        &self,
        arena: &WeldArena,
        id: WeldId,
        stops: &[XPosition],
        passes_per_stop: &mut [Vec<Pass>],
    ) {
        let w = arena.get(id).unwrap();
        let reach = self.config.stop_reach;
        let center = w.span().center();

        let fitting = stops
            .iter()
            .enumerate()
            .filter(|&(_, &s)| w.x_start() >= s - reach && w.x_end() <= s + reach)
            .min_by(|&(_, &a), &(_, &b)| {
                center
                    .distance_to(a)
                    .partial_cmp(&center.distance_to(b))
                    .unwrap()
            });

        if let Some((i, _)) = fitting {
            passes_per_stop[i].push(Pass {
                weld: id,
                x_lo: w.x_start(),
                x_hi: w.x_end(),
                target: w.length(),
            });
            return;
        }

        // Two (or more) passes at consecutive covering stops, each welding
        // its local portion; progress targets accumulate left to right.
        let mut covered_until = w.x_start();
        for (i, &s) in stops.iter().enumerate() {
            let window_lo = s - reach;
            let window_hi = s + reach;
            if window_hi <= covered_until || window_lo >= w.x_end() {
                continue;
            }
            let local_hi = w.x_end().min(window_hi);
            if local_hi <= covered_until {
                continue;
            }
            passes_per_stop[i].push(Pass {
                weld: id,
                x_lo: covered_until,
                x_hi: local_hi,
                target: local_hi - w.x_start(),
            });
            covered_until = local_hi;
            if covered_until >= w.x_end() {
                break;
            }
        }
        debug_assert!(
            covered_until >= w.x_end(),
            "stops must cover the full span of weld {}",
            id
        );
    }

    /// Greedy per-stop robot assignment: welds sorted by Y, each pass going
    /// to the side-matching robot minimizing Y travel from its running
    /// cursor plus its weighted load at this stop.
    fn assign_robots(
        &self,
        arena: &WeldArena,
        _stop_x: XPosition,
        mut passes: Vec<Pass>,
    ) -> Result<Vec<WeldTask>, PlanningError> {
        passes.sort_by(|a, b| {
            let ya = arena.get(a.weld).unwrap().y();
            let yb = arena.get(b.weld).unwrap().y();
            ya.partial_cmp(&yb).unwrap()
        });

        let mut cursors: BTreeMap<RobotId, YPosition> = self
            .scene
            .robots()
            .iter()
            .map(|r| (r.id(), r.workspace_center()))
            .collect();
        let mut loads: BTreeMap<RobotId, f64> = BTreeMap::new();

        let mut tasks = Vec::with_capacity(passes.len());
        for pass in passes {
            let w = arena.get(pass.weld).unwrap();
            let best = self
                .scene
                .robots_on(w.side())
                .filter(|r| r.can_reach(w.y(), self.scene.reach()))
                .min_by(|a, b| {
                    let score = |r: &gantry_weld_model::robot::Robot| {
                        let travel = w.y().distance_to(cursors[&r.id()]).value();
                        travel + self.config.load_weight * loads.get(&r.id()).copied().unwrap_or(0.0)
                    };
                    score(a).partial_cmp(&score(b)).unwrap()
                })
                .ok_or_else(|| UnreachableWeldError::new(w.id(), w.y(), w.side()))?;

            let travel_s = w.y().distance_to(cursors[&best.id()]) / best.tcp_speed();
            let weld_s = (pass.x_hi - pass.x_lo) / best.tcp_speed();
            *loads.entry(best.id()).or_insert(0.0) += travel_s.value() + weld_s.value();
            cursors.insert(best.id(), w.y());

            tasks.push(WeldTask::new(
                best.id(),
                pass.weld,
                w.y(),
                pass.x_lo,
                pass.x_hi,
                pass.target,
            ));
        }
        Ok(tasks)
    }
}
