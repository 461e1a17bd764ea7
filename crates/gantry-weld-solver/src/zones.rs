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

//! # Shared-Zone Arbitration
//!
//! Where two robots' workspaces overlap, a named zone guards the shared Y
//! band with a mutex. A robot entering `WELDING` must hold the mutex of
//! every zone containing its Y; contention parks it in `WAIT_MUTEX`, never
//! fails hard.
//!
//! Priority is a strict order per zone. A lower-priority robot may acquire
//! only while no higher-priority robot is *requesting* the zone this tick:
//! welding inside the band, or moving towards a target inside the band with
//! the gantry already over its weld. The simulator republishes request marks
//! every tick via [`CollisionManager::begin_tick`] and
//! [`CollisionManager::note_request`].

use gantry_weld_model::id::RobotId;
use gantry_weld_model::scene::ZoneSpec;
use gantry_weld_core::space::YPosition;
use std::collections::BTreeSet;

/// Mutex state for every shared zone of a scene.
///
/// Lock operations are reentrant for the current owner and idempotent on
/// release. All state fits one tick's view: ownership persists across ticks,
/// request marks do not.
#[derive(Debug, Clone)]
pub struct CollisionManager {
    zones: Vec<ZoneSpec>,
    owners: Vec<Option<RobotId>>,
    requests: Vec<BTreeSet<RobotId>>,
}

impl CollisionManager {
    /// Registers all zones; none are owned initially.
    pub fn new(zones: &[ZoneSpec]) -> Self {
        Self {
            owners: vec![None; zones.len()],
            requests: vec![BTreeSet::new(); zones.len()],
            zones: zones.to_vec(),
        }
    }

    #[inline]
    pub fn zones(&self) -> &[ZoneSpec] {
        &self.zones
    }

    /// Zones whose band contains `y`, regardless of which robots they admit.
    pub fn which_zones(&self, y: YPosition) -> impl Iterator<Item = &ZoneSpec> {
        self.zones.iter().filter(move |z| z.contains_y(y))
    }

    /// Current owner of the zone named `name`.
    pub fn owner_of(&self, name: &str) -> Option<RobotId> {
        self.zones
            .iter()
            .position(|z| z.name() == name)
            .and_then(|i| self.owners[i])
    }

    /// Clears the per-tick request marks. Call once at the start of every
    /// tick, before the weld-start checks.
    pub fn begin_tick(&mut self) {
        for marks in &mut self.requests {
            marks.clear();
        }
    }

    /// Marks `robot` as requesting every zone that admits it and whose band
    /// contains `y`, for the current tick.
    pub fn note_request(&mut self, robot: RobotId, y: YPosition) {
        for (i, zone) in self.zones.iter().enumerate() {
            if zone.admits(robot) && zone.contains_y(y) {
                self.requests[i].insert(robot);
            }
        }
    }

    /// Attempts to take every zone containing `y` for `robot`.
    ///
    /// Succeeds when `y` lies in no applicable zone, or when each containing
    /// zone is unowned or already owned by `robot` and no higher-priority
    /// robot holds a request mark on it. On success, ownership is recorded
    /// in every containing zone. Never fails hard: a `false` return sends
    /// the caller to `WAIT_MUTEX`.
    pub fn try_acquire(&mut self, robot: RobotId, y: YPosition) -> bool {
        let applicable: Vec<usize> = self
            .zones
            .iter()
            .enumerate()
            .filter(|(_, z)| z.admits(robot) && z.contains_y(y))
            .map(|(i, _)| i)
            .collect();

        for &i in &applicable {
            if self.owners[i].is_some_and(|owner| owner != robot) {
                return false;
            }
            let rank = self.zones[i]
                .rank_of(robot)
                .expect("admitted robot has a rank");
            let preempted = self.zones[i].priority()[..rank]
                .iter()
                .any(|prior| self.requests[i].contains(prior));
            if preempted {
                return false;
            }
        }

        for &i in &applicable {
            self.owners[i] = Some(robot);
        }
        true
    }

    /// Releases every zone owned by `robot`. Idempotent.
    pub fn release(&mut self, robot: RobotId) {
        for owner in &mut self.owners {
            if *owner == Some(robot) {
                *owner = None;
            }
        }
    }
}
