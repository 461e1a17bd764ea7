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

//! # Time-Stepped Simulator
//!
//! Executes a plan against a physical model of the cell: gantry position,
//! robot positions and states, weld progress and shared-zone locks, advanced
//! in fixed `dt` increments. Single-threaded and deterministic: one tick
//! updates all entities in a fixed order, robots in id order.
//!
//! The weld-on-move tick runs its phases in a load-bearing order: gantry
//! pre-positioning, robot positioning, per-robot weld-start checks, gantry
//! advance at the slowest welding TCP, weld progress, window completion.
//! Weld-start precedes the gantry advance so a robot entering `WELDING`
//! contributes to this tick's speed minimum; weld progress follows the
//! advance so seam progress stays synchronized with travel. Each robot's
//! start check is independent: a robot that finishes positioning early
//! ignites the moment the gantry passes its own weld start, without waiting
//! for anyone else.

use crate::zones::CollisionManager;
use gantry_weld_model::id::{RobotId, WeldId};
use gantry_weld_model::plan::{Mode, Plan};
use gantry_weld_model::scene::Scene;
use gantry_weld_model::weld::{Side, WeldArena};
use gantry_weld_core::space::{SpaceLength, XPosition, YPosition};
use gantry_weld_core::time::{TimeDelta, TimePoint};
use gantry_weld_core::velocity::Velocity;
use std::fmt::Display;
use tracing::{debug, warn};

/// Positions within this window of their target snap onto it, in mm.
const SNAP: SpaceLength = SpaceLength::new(1.0);

/// Default simulation time step, in seconds.
pub const DEFAULT_DT: TimeDelta = TimeDelta::new(0.1);

/// Ticks without weld progress (while tasks remain) before a stall is
/// reported. 60 simulated seconds at the default dt, beyond any legitimate
/// repositioning or traverse.
const STALL_TICK_LIMIT: u32 = 600;

/// Per-robot state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotPhase {
    Idle,
    MovingY,
    Welding,
    WaitMutex,
}

impl Display for RobotPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RobotPhase::Idle => write!(f, "IDLE"),
            RobotPhase::MovingY => write!(f, "MOVING_Y"),
            RobotPhase::Welding => write!(f, "WELDING"),
            RobotPhase::WaitMutex => write!(f, "WAIT_MUTEX"),
        }
    }
}

/// Mutable per-robot state during a run, including terminal metrics.
#[derive(Debug, Clone)]
pub struct RobotRuntime {
    id: RobotId,
    side: Side,
    tcp_speed: Velocity,
    y: YPosition,
    phase: RobotPhase,
    current_weld: Option<WeldId>,
    welds_completed: u32,
    time_welding: TimeDelta,
    time_moving: TimeDelta,
    time_idle: TimeDelta,
}

impl RobotRuntime {
    #[inline]
    pub fn id(&self) -> RobotId {
        self.id
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn y(&self) -> YPosition {
        self.y
    }

    #[inline]
    pub fn phase(&self) -> RobotPhase {
        self.phase
    }

    #[inline]
    pub fn current_weld(&self) -> Option<WeldId> {
        self.current_weld
    }

    #[inline]
    pub fn welds_completed(&self) -> u32 {
        self.welds_completed
    }

    #[inline]
    pub fn time_welding(&self) -> TimeDelta {
        self.time_welding
    }

    #[inline]
    pub fn time_moving(&self) -> TimeDelta {
        self.time_moving
    }

    /// Idle time; waiting on a zone mutex counts as idle.
    #[inline]
    pub fn time_idle(&self) -> TimeDelta {
        self.time_idle
    }

    /// Fraction of elapsed time spent welding.
    pub fn utilization(&self) -> f64 {
        let total = self.time_welding + self.time_moving + self.time_idle;
        if total.value() > 0.0 {
            self.time_welding.value() / total.value()
        } else {
            0.0
        }
    }
}

/// Mutable gantry state during a run.
#[derive(Debug, Clone, Copy)]
pub struct GantryRuntime {
    x: XPosition,
    moving: bool,
}

impl GantryRuntime {
    #[inline]
    pub fn x(&self) -> XPosition {
        self.x
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }
}

/// Non-fatal diagnostics surfaced through [`StepOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeWarning {
    /// No weld progressed for this many consecutive ticks while open tasks
    /// remain.
    Stall { ticks: u32 },
}

/// What one tick produced, for embedders to render or inspect.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub time: TimePoint,
    /// Completed fraction of the total planned weld length, in `[0, 1]`.
    pub progress: f64,
    /// Robots in `WELDING` at the end of the tick.
    pub welding: Vec<RobotId>,
    /// Welds that reached full length this tick.
    pub completed: Vec<WeldId>,
    pub warnings: Vec<RuntimeWarning>,
    pub is_complete: bool,
}

/// A plan that cannot execute on the given scene.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanValidationError {
    UnknownRobot(RobotId),
    UnknownWeld(WeldId),
    SideMismatch { robot: RobotId, weld: WeldId },
    TargetOutOfReach { robot: RobotId, y: YPosition },
}

impl Display for PlanValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanValidationError::UnknownRobot(r) => write!(f, "Plan references unknown robot {}", r),
            PlanValidationError::UnknownWeld(w) => write!(f, "Plan references unknown weld {}", w),
            PlanValidationError::SideMismatch { robot, weld } => {
                write!(f, "Robot {} and weld {} are on different sides", robot, weld)
            }
            PlanValidationError::TargetOutOfReach { robot, y } => {
                write!(f, "Robot {} cannot hold {}", robot, y)
            }
        }
    }
}

impl std::error::Error for PlanValidationError {}

/// Summary of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub complete: bool,
}

/// A task resolved against the runtime arenas.
#[derive(Debug, Clone, Copy)]
struct ActiveTask {
    robot: usize,
    weld: WeldId,
    y: YPosition,
    x_start: XPosition,
    x_end: XPosition,
    target: SpaceLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecPhase {
    Window(usize),
    Stop { index: usize, at_stop: bool },
    Done,
}

/// Deterministic executor of one plan on one scene.
#[derive(Debug)]
pub struct Simulator {
    scene: Scene,
    plan: Plan,
    arena: WeldArena,
    robots: Vec<RobotRuntime>,
    gantry: GantryRuntime,
    zones: CollisionManager,
    dt: TimeDelta,
    time: TimePoint,
    exec: ExecPhase,
    /// Tasks of the current sweep window.
    active: Vec<ActiveTask>,
    /// Per-robot task queues at the current stop.
    queues: Vec<Vec<ActiveTask>>,
    collision_waits: u32,
    stall_ticks: u32,
    stall_reported: bool,
    last_done: SpaceLength,
}

impl Simulator {
    /// Validates `plan` against `scene` and prepares the runtime arenas.
    /// Robots start at their workspace centers, the gantry at the rail
    /// origin.
    pub fn new(scene: &Scene, plan: &Plan, dt: TimeDelta) -> Result<Self, PlanValidationError> {
        for task in plan.tasks() {
            let robot = scene
                .robot(task.robot())
                .ok_or(PlanValidationError::UnknownRobot(task.robot()))?;
            let weld = plan
                .weld(task.weld())
                .ok_or(PlanValidationError::UnknownWeld(task.weld()))?;
            if weld.side() != robot.side() {
                return Err(PlanValidationError::SideMismatch {
                    robot: task.robot(),
                    weld: task.weld(),
                });
            }
            if !robot.can_reach(task.y(), scene.reach()) {
                return Err(PlanValidationError::TargetOutOfReach {
                    robot: task.robot(),
                    y: task.y(),
                });
            }
        }

        let robots: Vec<RobotRuntime> = scene
            .robots()
            .iter()
            .map(|r| RobotRuntime {
                id: r.id(),
                side: r.side(),
                tcp_speed: r.tcp_speed(),
                y: r.workspace_center(),
                phase: RobotPhase::Idle,
                current_weld: None,
                welds_completed: 0,
                time_welding: TimeDelta::zero(),
                time_moving: TimeDelta::zero(),
                time_idle: TimeDelta::zero(),
            })
            .collect();

        let queues = vec![Vec::new(); robots.len()];
        let exec = if !plan.windows().is_empty() {
            ExecPhase::Window(0)
        } else if !plan.stops().is_empty() {
            ExecPhase::Stop {
                index: 0,
                at_stop: false,
            }
        } else {
            ExecPhase::Done
        };

        let mut sim = Self {
            zones: CollisionManager::new(scene.zones()),
            arena: WeldArena::from_welds(plan.welds().to_vec()),
            scene: scene.clone(),
            plan: plan.clone(),
            robots,
            gantry: GantryRuntime {
                x: XPosition::zero(),
                moving: false,
            },
            dt,
            time: TimePoint::zero(),
            exec,
            active: Vec::new(),
            queues,
            collision_waits: 0,
            stall_ticks: 0,
            stall_reported: false,
            last_done: SpaceLength::zero(),
        };
        if let ExecPhase::Window(0) = sim.exec {
            sim.enter_window(0);
        }
        Ok(sim)
    }

    #[inline]
    pub fn time(&self) -> TimePoint {
        self.time
    }

    #[inline]
    pub fn robots(&self) -> &[RobotRuntime] {
        &self.robots
    }

    #[inline]
    pub fn gantry(&self) -> GantryRuntime {
        self.gantry
    }

    #[inline]
    pub fn collision_waits(&self) -> u32 {
        self.collision_waits
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.exec == ExecPhase::Done
    }

    #[inline]
    pub fn welds(&self) -> impl Iterator<Item = &gantry_weld_model::weld::Weld> {
        self.arena.iter()
    }

    /// Completed fraction of the planned weld length, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let total = self.arena.total_length();
        if total.value() > 0.0 {
            self.arena.completed_length().value() / total.value()
        } else {
            1.0
        }
    }

    /// Advances the simulation by one `dt` tick.
    pub fn step(&mut self) -> StepOutcome {
        if self.exec == ExecPhase::Done {
            return self.outcome(Vec::new(), Vec::new());
        }

        self.time += self.dt;
        let mut completed = Vec::new();
        match self.exec {
            ExecPhase::Window(i) => self.step_wom(i, &mut completed),
            ExecPhase::Stop { .. } => self.step_saw(&mut completed),
            ExecPhase::Done => {}
        }

        // Timing accounting follows each robot's end-of-tick state.
        for robot in &mut self.robots {
            match robot.phase {
                RobotPhase::Welding => robot.time_welding += self.dt,
                RobotPhase::MovingY => robot.time_moving += self.dt,
                RobotPhase::Idle | RobotPhase::WaitMutex => robot.time_idle += self.dt,
            }
        }

        let warnings = self.detect_stall();
        self.outcome(completed, warnings)
    }

    /// Steps until the plan completes or `max_ticks` elapse.
    pub fn run(&mut self, max_ticks: u64) -> RunSummary {
        let mut ticks = 0;
        while !self.is_complete() && ticks < max_ticks {
            self.step();
            ticks += 1;
        }
        RunSummary {
            ticks,
            complete: self.is_complete(),
        }
    }

    fn outcome(&self, completed: Vec<WeldId>, warnings: Vec<RuntimeWarning>) -> StepOutcome {
        StepOutcome {
            time: self.time,
            progress: self.progress(),
            welding: self
                .robots
                .iter()
                .filter(|r| r.phase == RobotPhase::Welding)
                .map(|r| r.id)
                .collect(),
            completed,
            warnings,
            is_complete: self.exec == ExecPhase::Done,
        }
    }

    fn detect_stall(&mut self) -> Vec<RuntimeWarning> {
        let done = self.arena.completed_length();
        if self.exec != ExecPhase::Done && done.value() <= self.last_done.value() {
            self.stall_ticks += 1;
        } else {
            self.stall_ticks = 0;
            self.stall_reported = false;
        }
        self.last_done = done;

        if self.stall_ticks >= STALL_TICK_LIMIT && !self.stall_reported {
            self.stall_reported = true;
            warn!(
                ticks = self.stall_ticks,
                time = self.time.value(),
                "no weld progress while tasks remain"
            );
            vec![RuntimeWarning::Stall {
                ticks: self.stall_ticks,
            }]
        } else {
            Vec::new()
        }
    }

    fn enter_window(&mut self, index: usize) {
        let window = &self.plan.windows()[index];
        self.active = window
            .tasks()
            .iter()
            .map(|t| ActiveTask {
                robot: self
                    .scene
                    .robots()
                    .iter()
                    .position(|r| r.id() == t.robot())
                    .expect("validated robot"),
                weld: t.weld(),
                y: t.y(),
                x_start: t.x_start(),
                x_end: t.x_end(),
                target: t.progress_target(),
            })
            .collect();
        for robot in &mut self.robots {
            robot.phase = RobotPhase::Idle;
            robot.current_weld = None;
        }
        debug!(window = index, tasks = self.active.len(), "entering window");
    }

    /// The robot's next unstarted weld the gantry has already reached.
    fn next_startable_task(&self, robot: usize) -> Option<ActiveTask> {
        self.active
            .iter()
            .filter(|t| t.robot == robot)
            .filter(|t| {
                let w = self.arena.get(t.weld).expect("task weld in arena");
                !w.is_complete() && w.done().value() == 0.0
            })
            .filter(|t| self.gantry.x >= t.x_start)
            .min_by(|a, b| a.x_start.partial_cmp(&b.x_start).unwrap())
            .copied()
    }

    /// The robot's next pending task regardless of gantry position.
    fn next_pending_task(&self, robot: usize) -> Option<ActiveTask> {
        self.active
            .iter()
            .filter(|t| t.robot == robot)
            .filter(|t| {
                let w = self.arena.get(t.weld).expect("task weld in arena");
                !w.is_complete() && w.done().value() == 0.0
            })
            .min_by(|a, b| a.x_start.partial_cmp(&b.x_start).unwrap())
            .copied()
    }

    fn step_wom(&mut self, index: usize, completed: &mut Vec<WeldId>) {
        let window = &self.plan.windows()[index];
        let (start_x, end_x) = (window.start_x(), window.end_x());

        // Phase 0: pre-position the gantry. Robots hold until it reaches
        // the window start (or is already past it).
        if self.gantry.x < start_x {
            let max_step = self.scene.gantry().speed() * self.dt;
            let (x, arrived) = self.gantry.x.step_toward(start_x, max_step, SNAP);
            self.gantry.x = x;
            self.gantry.moving = !arrived;
            if !arrived {
                return;
            }
        }

        // Phase 1: position robots towards their window Y, overshoot-free.
        let targets: Vec<Option<YPosition>> = (0..self.robots.len())
            .map(|i| self.active.iter().find(|t| t.robot == i).map(|t| t.y))
            .collect();
        for (i, target) in targets.iter().enumerate() {
            let Some(target) = *target else { continue };
            let robot = &mut self.robots[i];
            if robot.phase == RobotPhase::Welding || robot.phase == RobotPhase::WaitMutex {
                continue;
            }
            if robot.y.distance_to(target) > SNAP {
                let max_step = robot.tcp_speed * self.dt;
                let (y, arrived) = robot.y.step_toward(target, max_step, SNAP);
                robot.y = y;
                robot.phase = if arrived {
                    RobotPhase::Idle
                } else {
                    RobotPhase::MovingY
                };
            } else if robot.y != target {
                robot.y = target;
                robot.phase = RobotPhase::Idle;
            } else if robot.phase == RobotPhase::MovingY {
                robot.phase = RobotPhase::Idle;
            }
        }

        // Phase 2: per-robot weld start, in robot-id order. Publish this
        // tick's zone requests first so priority can preempt.
        self.zones.begin_tick();
        for i in 0..self.robots.len() {
            let (id, phase, y) = {
                let r = &self.robots[i];
                (r.id, r.phase, r.y)
            };
            match phase {
                RobotPhase::Welding | RobotPhase::WaitMutex => {
                    self.zones.note_request(id, y);
                }
                RobotPhase::MovingY => {
                    if let Some(t) = self.next_pending_task(i)
                        && self.gantry.x >= t.x_start
                        && self.gantry.x <= t.x_end
                    {
                        self.zones.note_request(id, t.y);
                    }
                }
                RobotPhase::Idle => {
                    if self.next_startable_task(i).is_some() {
                        self.zones.note_request(id, y);
                    }
                }
            }
        }
        for i in 0..self.robots.len() {
            let (id, phase, y, busy) = {
                let r = &self.robots[i];
                (r.id, r.phase, r.y, r.current_weld.is_some())
            };
            if busy || !(phase == RobotPhase::Idle || phase == RobotPhase::WaitMutex) {
                continue;
            }
            match self.next_startable_task(i) {
                Some(task) => {
                    if self.zones.try_acquire(id, y) {
                        let robot = &mut self.robots[i];
                        robot.phase = RobotPhase::Welding;
                        robot.current_weld = Some(task.weld);
                    } else {
                        if phase != RobotPhase::WaitMutex {
                            self.collision_waits += 1;
                        }
                        self.robots[i].phase = RobotPhase::WaitMutex;
                    }
                }
                None => {
                    if phase == RobotPhase::WaitMutex {
                        self.robots[i].phase = RobotPhase::Idle;
                    }
                }
            }
        }

        // Phase 3: advance the gantry. While welding, travel is pinned to
        // the slowest welding TCP so seams stay synchronized with motion.
        let welding_min = self
            .robots
            .iter()
            .filter(|r| r.phase == RobotPhase::Welding)
            .map(|r| r.tcp_speed)
            .fold(None::<Velocity>, |acc, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            });
        if let Some(speed) = welding_min {
            if self.gantry.x < end_x {
                let step = (speed * self.dt).min(end_x - self.gantry.x);
                self.gantry.x += step;
                self.gantry.moving = true;
            } else {
                self.gantry.moving = false;
            }
        } else {
            let any_moving = self.robots.iter().any(|r| r.phase == RobotPhase::MovingY);
            let any_waiting = self.robots.iter().any(|r| r.phase == RobotPhase::WaitMutex);
            let next_start = (0..self.robots.len())
                .filter_map(|i| self.next_pending_task(i))
                .map(|t| t.x_start)
                .filter(|&x| x > self.gantry.x)
                .fold(None::<XPosition>, |acc, x| {
                    Some(acc.map_or(x, |a| a.min(x)))
                });
            if !any_moving
                && !any_waiting
                && let Some(next) = next_start
                && self.gantry.x < next.min(end_x)
            {
                // Nobody welds or positions, but work lies ahead: roll
                // forward at rail speed to the next weld start, never past
                // the window bound.
                let max_step = self.scene.gantry().speed() * self.dt;
                let (x, arrived) = self.gantry.x.step_toward(next.min(end_x), max_step, SNAP);
                self.gantry.x = x;
                self.gantry.moving = !arrived;
            } else {
                self.gantry.moving = false;
            }
        }

        // Phase 4: advance welds; completion releases locks immediately.
        for i in 0..self.robots.len() {
            let (phase, weld_id, tcp) = {
                let r = &self.robots[i];
                (r.phase, r.current_weld, r.tcp_speed)
            };
            if phase != RobotPhase::Welding {
                continue;
            }
            let Some(weld_id) = weld_id else { continue };
            let weld = self.arena.get_mut(weld_id).expect("task weld in arena");
            weld.advance(tcp * self.dt);
            if weld.is_complete() {
                let id = self.robots[i].id;
                self.robots[i].phase = RobotPhase::Idle;
                self.robots[i].current_weld = None;
                self.robots[i].welds_completed += 1;
                self.zones.release(id);
                completed.push(weld_id);
            }
        }

        // Phase 5: window completion.
        let all_done = self
            .active
            .iter()
            .all(|t| self.arena.get(t.weld).is_some_and(|w| w.is_complete()));
        if all_done {
            for i in 0..self.robots.len() {
                let id = self.robots[i].id;
                self.robots[i].phase = RobotPhase::Idle;
                self.robots[i].current_weld = None;
                self.zones.release(id);
            }
            if index + 1 < self.plan.windows().len() {
                self.exec = ExecPhase::Window(index + 1);
                self.enter_window(index + 1);
            } else if !self.plan.stops().is_empty() {
                self.exec = ExecPhase::Stop {
                    index: 0,
                    at_stop: false,
                };
            } else {
                self.exec = ExecPhase::Done;
            }
        }
    }

    fn build_queues(&mut self, index: usize) {
        for queue in &mut self.queues {
            queue.clear();
        }
        let stop = &self.plan.stops()[index];
        for t in stop.tasks() {
            let robot = self
                .scene
                .robots()
                .iter()
                .position(|r| r.id() == t.robot())
                .expect("validated robot");
            let already_done = self
                .arena
                .get(t.weld())
                .is_some_and(|w| w.done().value() >= t.progress_target().value());
            if already_done {
                continue;
            }
            self.queues[robot].push(ActiveTask {
                robot,
                weld: t.weld(),
                y: t.y(),
                x_start: t.x_start(),
                x_end: t.x_end(),
                target: t.progress_target(),
            });
        }
        debug!(
            stop = index,
            tasks = self.queues.iter().map(|q| q.len()).sum::<usize>(),
            "gantry at stop"
        );
    }

    fn step_saw(&mut self, completed: &mut Vec<WeldId>) {
        let ExecPhase::Stop { index, at_stop } = self.exec else {
            return;
        };
        let stop_x = self.plan.stops()[index].x();

        // Phase 1: traverse to the stop; robots hold.
        if !at_stop {
            let max_step = self.scene.gantry().speed() * self.dt;
            let (x, arrived) = self.gantry.x.step_toward(stop_x, max_step, SNAP);
            self.gantry.x = x;
            self.gantry.moving = !arrived;
            if arrived {
                self.exec = ExecPhase::Stop {
                    index,
                    at_stop: true,
                };
                self.build_queues(index);
            }
            return;
        }

        // Phase 2: execute. Publish zone requests, then drive each robot's
        // queue, nearest Y first.
        self.zones.begin_tick();
        for i in 0..self.robots.len() {
            let (id, phase, y) = {
                let r = &self.robots[i];
                (r.id, r.phase, r.y)
            };
            match phase {
                RobotPhase::Welding | RobotPhase::WaitMutex => self.zones.note_request(id, y),
                RobotPhase::MovingY | RobotPhase::Idle => {
                    if let Some(t) = self.queues[i].first() {
                        let ty = t.y;
                        self.zones.note_request(id, ty);
                    }
                }
            }
        }

        for i in 0..self.robots.len() {
            let phase = self.robots[i].phase;
            match phase {
                RobotPhase::Welding => {
                    let Some(task) = self.queues[i].first().copied() else {
                        continue;
                    };
                    let tcp = self.robots[i].tcp_speed;
                    let weld = self.arena.get_mut(task.weld).expect("task weld in arena");
                    let step = (task.target - weld.done())
                        .min(tcp * self.dt)
                        .max(SpaceLength::zero());
                    weld.advance(step);
                    if weld.done().value() >= task.target.value() {
                        let weld_complete = weld.is_complete();
                        let id = self.robots[i].id;
                        self.zones.release(id);
                        self.robots[i].phase = RobotPhase::Idle;
                        self.robots[i].current_weld = None;
                        self.queues[i].remove(0);
                        if weld_complete {
                            self.robots[i].welds_completed += 1;
                            completed.push(task.weld);
                        }
                    }
                }
                RobotPhase::MovingY => {
                    let Some(task) = self.queues[i].first().copied() else {
                        self.robots[i].phase = RobotPhase::Idle;
                        continue;
                    };
                    let robot = &mut self.robots[i];
                    let (y, arrived) = robot.y.step_toward(task.y, robot.tcp_speed * self.dt, SNAP);
                    robot.y = y;
                    if arrived {
                        robot.phase = RobotPhase::Idle;
                    }
                }
                RobotPhase::WaitMutex => {
                    let Some(task) = self.queues[i].first().copied() else {
                        self.robots[i].phase = RobotPhase::Idle;
                        continue;
                    };
                    let (id, y) = (self.robots[i].id, self.robots[i].y);
                    if self.zones.try_acquire(id, y) {
                        self.robots[i].phase = RobotPhase::Welding;
                        self.robots[i].current_weld = Some(task.weld);
                    }
                }
                RobotPhase::Idle => {
                    if self.queues[i].is_empty() {
                        continue;
                    }
                    // Dequeue the nearest-Y task: swap it to the queue head.
                    let y_now = self.robots[i].y;
                    let nearest = self.queues[i]
                        .iter()
                        .enumerate()
                        .min_by(|(_, a), (_, b)| {
                            a.y.distance_to(y_now)
                                .partial_cmp(&b.y.distance_to(y_now))
                                .unwrap()
                        })
                        .map(|(j, _)| j)
                        .unwrap();
                    self.queues[i].swap(0, nearest);
                    let task = self.queues[i][0];

                    if y_now.distance_to(task.y) > SNAP {
                        let robot = &mut self.robots[i];
                        let (y, arrived) =
                            robot.y.step_toward(task.y, robot.tcp_speed * self.dt, SNAP);
                        robot.y = y;
                        robot.phase = if arrived {
                            RobotPhase::Idle
                        } else {
                            RobotPhase::MovingY
                        };
                    } else {
                        self.robots[i].y = task.y;
                        let id = self.robots[i].id;
                        if self.zones.try_acquire(id, task.y) {
                            self.robots[i].phase = RobotPhase::Welding;
                            self.robots[i].current_weld = Some(task.weld);
                        } else {
                            self.robots[i].phase = RobotPhase::WaitMutex;
                            self.collision_waits += 1;
                        }
                    }
                }
            }
        }

        // Phase 3: advance once every queue has drained.
        if self.queues.iter().all(|q| q.is_empty()) {
            if index + 1 < self.plan.stops().len() {
                self.exec = ExecPhase::Stop {
                    index: index + 1,
                    at_stop: false,
                };
            } else {
                self.exec = ExecPhase::Done;
            }
        }
    }
}

/// The plan's mode, re-exported for embedders inspecting a simulator.
impl Simulator {
    #[inline]
    pub fn mode(&self) -> Mode {
        self.plan.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::{PlanConfig, plan};
    use approx::assert_relative_eq;
    use gantry_weld_model::plan::{SawStop, WeldTask, WomWindow};
    use gantry_weld_model::robot::Robot;
    use gantry_weld_model::scene::{GantrySpec, ZoneSpec};
    use gantry_weld_model::weld::Weld;
    use gantry_weld_core::space::BandInterval;
    use std::collections::BTreeMap;

    const R1: RobotId = RobotId::new(1);
    const R2: RobotId = RobotId::new(2);
    const R3: RobotId = RobotId::new(3);
    const R4: RobotId = RobotId::new(4);

    fn robot(id: u32, side: Side, lo: f64, hi: f64) -> Robot {
        Robot::new(
            RobotId::new(id),
            side,
            BandInterval::new(YPosition::new(lo), YPosition::new(hi)),
            Velocity::new(120.0),
            SpaceLength::new(match side {
                Side::XPlus => 300.0,
                Side::XMinus => -300.0,
            }),
        )
    }

    fn weld(id: u64, x0: f64, x1: f64, y: f64, side: Side) -> Weld {
        Weld::new(
            WeldId::new(id),
            XPosition::new(x0),
            XPosition::new(x1),
            YPosition::new(y),
            side,
        )
    }

    /// Gap configuration: pairs at 0..1000 and 2000..3000 bracketing a dead
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
        vec![
            weld(1, 300.0, 2700.0, 300.0, Side::XPlus),
            weld(2, 700.0, 1200.0, 700.0, Side::XMinus),
            weld(3, 1200.0, 3300.0, 1300.0, Side::XPlus),
            weld(4, 300.0, 2700.0, 1700.0, Side::XMinus),
        ]
    }

    #[test]
    fn gap_configuration_runs_to_completion_with_independent_starts() {
        let scene = gap_scene();
        let plan = plan(&gap_welds(), &scene, Mode::Wom, &PlanConfig::default()).unwrap();
        assert_eq!(plan.windows().len(), 1);
        assert_relative_eq!(plan.start_x().value(), 300.0);

        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();
        let mut first_welding_x: BTreeMap<RobotId, f64> = BTreeMap::new();
        let mut ticks = 0u32;

        while !sim.is_complete() {
            let outcome = sim.step();
            ticks += 1;
            assert!(ticks < 20_000, "simulation must terminate");
            for &r in &outcome.welding {
                first_welding_x.entry(r).or_insert(sim.gantry().x().value());
            }
        }

        // All four robots welded, and each ignited only once the gantry had
        // reached its own weld start.
        let start_of = |wid: u64| {
            plan.windows()[0]
                .tasks()
                .iter()
                .find(|t| t.weld() == WeldId::new(wid))
                .unwrap()
                .x_start()
                .value()
        };
        assert!(first_welding_x[&R1] >= start_of(1) - 1e-6);
        assert!(first_welding_x[&R2] >= start_of(2) - 1e-6);
        assert!(first_welding_x[&R3] >= start_of(3) - 1e-6);
        assert!(first_welding_x[&R4] >= start_of(4) - 1e-6);

        for w in sim.welds() {
            assert!(w.is_complete());
        }
        assert_relative_eq!(sim.progress(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn early_finishers_do_not_wait_for_slow_positioners() {
        // R3 needs 1200 mm of Y travel (center 2500 to 1300); R1, R2, R4
        // need at most 800 mm. The others must be welding before R3 is.
        let scene = gap_scene();
        let plan = plan(&gap_welds(), &scene, Mode::Wom, &PlanConfig::default()).unwrap();
        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();

        let mut first_welding_tick: BTreeMap<RobotId, u32> = BTreeMap::new();
        let mut tick = 0u32;
        while !sim.is_complete() {
            let outcome = sim.step();
            tick += 1;
            assert!(tick < 20_000);
            for &r in &outcome.welding {
                first_welding_tick.entry(r).or_insert(tick);
            }
        }

        assert!(first_welding_tick[&R1] < first_welding_tick[&R3]);
        assert!(first_welding_tick[&R2] < first_welding_tick[&R3]);
        assert!(first_welding_tick[&R4] < first_welding_tick[&R3]);
    }

    #[test]
    fn gantry_travels_at_the_slowest_welding_tcp() {
        let scene = gap_scene();
        let plan = plan(&gap_welds(), &scene, Mode::Wom, &PlanConfig::default()).unwrap();
        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();

        let mut ticks = 0u32;
        while !sim.is_complete() {
            let x_before = sim.gantry().x().value();
            let outcome = sim.step();
            ticks += 1;
            assert!(ticks < 20_000);
            let delta = sim.gantry().x().value() - x_before;
            if !outcome.welding.is_empty() {
                // All TCPs are 120 mm/s here: never faster than 12 mm/tick.
                assert!(delta <= 12.0 + 1e-9);
            }
        }
    }

    #[test]
    fn weld_progress_is_bounded_and_monotone() {
        let scene = gap_scene();
        let plan = plan(&gap_welds(), &scene, Mode::Wom, &PlanConfig::default()).unwrap();
        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();

        let mut last: BTreeMap<WeldId, f64> = BTreeMap::new();
        let mut ticks = 0u32;
        while !sim.is_complete() {
            sim.step();
            ticks += 1;
            assert!(ticks < 20_000);
            for w in sim.welds() {
                let prev = last.insert(w.id(), w.done().value()).unwrap_or(0.0);
                assert!(w.done().value() >= prev);
                assert!(w.done().value() <= w.length().value() + 1e-9);
            }
        }
    }

    #[test]
    fn shared_zone_serializes_same_band_welds() {
        // Both x_plus robots weld inside zone s1 at the same stop; the
        // mutex lets only one in at a time and priority goes to R1.
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
        let welds = vec![
            weld(1, 1000.0, 1400.0, 850.0, Side::XPlus),
            weld(2, 1000.0, 1400.0, 1150.0, Side::XPlus),
        ];
        let plan = plan(&welds, &scene, Mode::Saw, &PlanConfig::default()).unwrap();
        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();

        let mut ticks = 0u32;
        while !sim.is_complete() {
            let outcome = sim.step();
            ticks += 1;
            assert!(ticks < 20_000);
            // Never both inside the zone welding at once.
            assert!(
                !(outcome.welding.contains(&R1) && outcome.welding.contains(&R3)),
                "zone mutex must serialize the pair"
            );
        }

        assert!(sim.collision_waits() >= 1);
        for w in sim.welds() {
            assert!(w.is_complete());
        }
        // The waiting robot spent time in WAIT_MUTEX, which counts as idle.
        let r3 = &sim.robots()[1];
        assert!(r3.time_idle().value() > 0.0);
    }

    #[test]
    fn saw_run_completes_scattered_short_welds() {
        let scene = gap_scene();
        let welds = vec![
            weld(1, 300.0, 700.0, 200.0, Side::XPlus),
            weld(2, 1300.0, 1700.0, 700.0, Side::XMinus),
            weld(3, 3300.0, 3700.0, 2200.0, Side::XPlus),
            weld(4, 5300.0, 5700.0, 2700.0, Side::XMinus),
        ];
        let plan = plan(&welds, &scene, Mode::Saw, &PlanConfig::default()).unwrap();
        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();

        let summary = sim.run(50_000);
        assert!(summary.complete);
        for w in sim.welds() {
            assert!(w.is_complete());
        }
        for r in sim.robots() {
            assert_eq!(r.phase(), RobotPhase::Idle);
        }
    }

    #[test]
    fn cross_stop_weld_accumulates_over_passes() {
        let scene = gap_scene();
        // The 2000 mm seam spans several stop windows; short seams pin the
        // stop lattice wide.
        let welds = vec![
            weld(1, 0.0, 2000.0, 300.0, Side::XPlus),
            weld(2, 0.0, 150.0, 700.0, Side::XMinus),
            weld(3, 3850.0, 4000.0, 700.0, Side::XMinus),
        ];
        let plan = plan(&welds, &scene, Mode::Saw, &PlanConfig::default()).unwrap();
        let passes = plan
            .stops()
            .iter()
            .flat_map(|s| s.tasks())
            .filter(|t| t.weld() == WeldId::new(1))
            .count();
        assert!(passes >= 2);

        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();
        let summary = sim.run(100_000);
        assert!(summary.complete);
        let w = sim.welds().find(|w| w.id() == WeldId::new(1)).unwrap();
        assert!(w.is_complete());
        assert_relative_eq!(w.done().value(), 2000.0, epsilon = 1e-6);
    }

    #[test]
    fn hybrid_plan_executes_windows_then_stops() {
        let scene = gap_scene();
        let welds = vec![
            weld(1, 300.0, 2700.0, 300.0, Side::XPlus),
            weld(2, 1000.0, 1150.0, 700.0, Side::XMinus),
        ];
        let plan = plan(&welds, &scene, Mode::Hybrid, &PlanConfig::default()).unwrap();
        assert_eq!(plan.windows().len(), 1);
        assert_eq!(plan.stops().len(), 1);

        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();
        let mut long_done_at: Option<u32> = None;
        let mut short_done_at: Option<u32> = None;
        let mut tick = 0u32;
        while !sim.is_complete() {
            let outcome = sim.step();
            tick += 1;
            assert!(tick < 50_000);
            for wid in outcome.completed {
                if wid == WeldId::new(1) {
                    long_done_at = Some(tick);
                } else {
                    short_done_at = Some(tick);
                }
            }
        }
        assert!(long_done_at.unwrap() < short_done_at.unwrap());
    }

    #[test]
    fn stalled_plan_surfaces_a_diagnostic_warning() {
        // A hand-built window whose task starts far beyond the window end:
        // the gantry parks at the window bound and no progress is possible.
        let scene = gap_scene();
        let w = weld(1, 5000.0, 5500.0, 300.0, Side::XPlus);
        let task = WeldTask::new(R1, w.id(), w.y(), w.x_start(), w.x_end(), w.length());
        let bogus = Plan::new(
            Mode::Wom,
            vec![w],
            vec![WomWindow::new(
                XPosition::new(0.0),
                XPosition::new(1000.0),
                vec![task],
            )],
            vec![],
            XPosition::new(0.0),
        );

        let mut sim = Simulator::new(&scene, &bogus, DEFAULT_DT).unwrap();
        let mut stalled = false;
        for _ in 0..(STALL_TICK_LIMIT + 50) {
            let outcome = sim.step();
            if outcome
                .warnings
                .iter()
                .any(|w| matches!(w, RuntimeWarning::Stall { .. }))
            {
                stalled = true;
                break;
            }
        }
        assert!(stalled, "stall diagnostic expected");
        assert!(!sim.is_complete());
    }

    #[test]
    fn validation_rejects_side_mismatch() {
        let scene = gap_scene();
        let w = weld(1, 300.0, 900.0, 300.0, Side::XPlus);
        // R2 is an x_minus robot.
        let task = WeldTask::new(R2, w.id(), w.y(), w.x_start(), w.x_end(), w.length());
        let bogus = Plan::new(
            Mode::Wom,
            vec![w],
            vec![WomWindow::new(
                XPosition::new(0.0),
                XPosition::new(900.0),
                vec![task],
            )],
            vec![],
            XPosition::new(0.0),
        );
        let err = Simulator::new(&scene, &bogus, DEFAULT_DT).unwrap_err();
        assert!(matches!(err, PlanValidationError::SideMismatch { .. }));
    }

    #[test]
    fn validation_rejects_unreachable_task_y() {
        let scene = gap_scene();
        let w = weld(1, 300.0, 900.0, 300.0, Side::XPlus);
        let task = WeldTask::new(
            R1,
            w.id(),
            YPosition::new(2900.0),
            w.x_start(),
            w.x_end(),
            w.length(),
        );
        let bogus = Plan::new(
            Mode::Saw,
            vec![w],
            vec![],
            vec![SawStop::new(XPosition::new(600.0), vec![task])],
            XPosition::new(600.0),
        );
        let err = Simulator::new(&scene, &bogus, DEFAULT_DT).unwrap_err();
        assert!(matches!(err, PlanValidationError::TargetOutOfReach { .. }));
    }

    #[test]
    fn validation_rejects_unknown_robot() {
        let scene = gap_scene();
        let w = weld(1, 300.0, 900.0, 300.0, Side::XPlus);
        let task = WeldTask::new(
            RobotId::new(9),
            w.id(),
            w.y(),
            w.x_start(),
            w.x_end(),
            w.length(),
        );
        let bogus = Plan::new(
            Mode::Saw,
            vec![w],
            vec![],
            vec![SawStop::new(XPosition::new(600.0), vec![task])],
            XPosition::new(600.0),
        );
        let err = Simulator::new(&scene, &bogus, DEFAULT_DT).unwrap_err();
        assert_eq!(err, PlanValidationError::UnknownRobot(RobotId::new(9)));
    }

    #[test]
    fn metrics_account_every_tick_to_exactly_one_state() {
        let scene = gap_scene();
        let plan = plan(&gap_welds(), &scene, Mode::Wom, &PlanConfig::default()).unwrap();
        let mut sim = Simulator::new(&scene, &plan, DEFAULT_DT).unwrap();
        let summary = sim.run(50_000);
        assert!(summary.complete);

        let elapsed = sim.time().value();
        for r in sim.robots() {
            let accounted =
                r.time_welding().value() + r.time_moving().value() + r.time_idle().value();
            assert_relative_eq!(accounted, elapsed, epsilon = 1e-6);
            assert!(r.welds_completed() >= 1);
            assert!(r.utilization() > 0.0);
        }
    }
}
