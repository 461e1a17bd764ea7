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

//! # Master Planner
//!
//! Validates the weld set against the scene, partitions it between the two
//! strategies, and concatenates the results into one ordered plan: sweep
//! windows first, stops second. Planning errors fail the whole call; no
//! partial plan is ever returned.

use crate::saw::SawStrategy;
use crate::wom::WomStrategy;
use gantry_weld_model::err::{
    EmptySceneError, GeometryFault, InvalidGeometryError, PlanningError, UnreachableWeldError,
};
use gantry_weld_model::id::WeldId;
use gantry_weld_model::plan::{Mode, Plan};
use gantry_weld_model::scene::Scene;
use gantry_weld_model::weld::{Weld, WeldArena};
use gantry_weld_core::space::{SpaceLength, XPosition};
use tracing::{info, instrument};

/// Planner tunables, with the cell's standard values as defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanConfig {
    /// Largest X gap between welds sharing a sweep window.
    pub max_group_gap: SpaceLength,
    /// Welds at least this long qualify for weld-on-move.
    pub min_wom_length: SpaceLength,
    /// Largest spacing between consecutive gantry stops.
    pub stop_spacing: SpaceLength,
    /// TCP working radius along X from a stationary gantry.
    pub stop_reach: SpaceLength,
    /// Shortest weld the zone splitter may cut.
    pub min_split_weld: SpaceLength,
    /// Shortest fragment a split may produce.
    pub min_split_segment: SpaceLength,
    /// Relative load difference tolerated before a zone split fires.
    pub imbalance_threshold: f64,
    /// Weight of accumulated load against Y travel in stop assignment.
    pub load_weight: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_group_gap: SpaceLength::new(500.0),
            min_wom_length: SpaceLength::new(300.0),
            stop_spacing: SpaceLength::new(500.0),
            stop_reach: SpaceLength::new(400.0),
            min_split_weld: SpaceLength::new(200.0),
            min_split_segment: SpaceLength::new(100.0),
            imbalance_threshold: 0.20,
            load_weight: 10.0,
        }
    }
}

/// Produces a deterministic execution plan for `welds` on `scene`.
///
/// Pure modes route every weld through the one strategy; `Hybrid` sends
/// sweep-eligible welds through weld-on-move and the rest (plus any sweep
/// overflow) through stop-and-weld.
#[instrument(skip(welds, scene, config), fields(mode = %mode, welds = welds.len()))]
pub fn plan(
    welds: &[Weld],
    scene: &Scene,
    mode: Mode,
    config: &PlanConfig,
) -> Result<Plan, PlanningError> {
    if welds.is_empty() {
        return Err(EmptySceneError.into());
    }
    for weld in welds {
        validate_weld(weld, scene)?;
    }

    let mut arena = WeldArena::from_welds(welds.to_vec());
    let all_ids: Vec<WeldId> = arena.ids().collect();

    let wom = WomStrategy::new(scene, config);
    let saw = SawStrategy::new(scene, config);

    let (wom_ids, mut saw_ids): (Vec<WeldId>, Vec<WeldId>) = match mode {
        Mode::Wom => (all_ids, Vec::new()),
        Mode::Saw => (Vec::new(), all_ids),
        Mode::Hybrid => all_ids
            .into_iter()
            .partition(|&id| wom.is_eligible(arena.get(id).unwrap())),
    };

    let mut windows = Vec::new();
    if !wom_ids.is_empty() {
        let outcome = wom.plan(&mut arena, wom_ids);
        windows = outcome.windows;
        match mode {
            Mode::Hybrid => saw_ids.extend(outcome.overflow),
            _ => {
                if let Some(&id) = outcome.overflow.first() {
                    let w = arena.get(id).unwrap();
                    return Err(UnreachableWeldError::new(id, w.y(), w.side()).into());
                }
            }
        }
    }

    let stops = if saw_ids.is_empty() {
        Vec::new()
    } else {
        saw.plan(&arena, saw_ids)?
    };

    let start_x = windows
        .first()
        .map(|w| w.start_x())
        .or_else(|| stops.first().map(|s| s.x()))
        .unwrap_or(XPosition::zero());

    info!(
        windows = windows.len(),
        stops = stops.len(),
        start_x = start_x.value(),
        "plan ready"
    );
    Ok(Plan::new(mode, arena.into_welds(), windows, stops, start_x))
}

fn validate_weld(weld: &Weld, scene: &Scene) -> Result<(), PlanningError> {
    if !weld.length().is_positive() {
        return Err(InvalidGeometryError::new(weld.id(), GeometryFault::EmptySpan).into());
    }
    let rail_end = XPosition::zero() + scene.gantry().x_length();
    if weld.x_start() < XPosition::zero() || weld.x_end() > rail_end {
        return Err(InvalidGeometryError::new(weld.id(), GeometryFault::SpanOutsideRail).into());
    }
    let y = weld.y().value();
    if y < 0.0 || y > scene.gantry().y_span().value() {
        return Err(InvalidGeometryError::new(weld.id(), GeometryFault::YOutsideWorkspace).into());
    }
    let reachable = scene
        .robots_on(weld.side())
        .any(|r| r.can_reach(weld.y(), scene.reach()));
    if !reachable {
        return Err(UnreachableWeldError::new(weld.id(), weld.y(), weld.side()).into());
    }
    Ok(())
}
