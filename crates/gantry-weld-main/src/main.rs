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

use gantry_weld_model::generator::{GeneratorConfig, WeldSetGenerator};
use gantry_weld_model::id::RobotId;
use gantry_weld_model::plan::Mode;
use gantry_weld_model::robot::Robot;
use gantry_weld_model::scene::{GantrySpec, Scene, ZoneSpec};
use gantry_weld_model::weld::Side;
use gantry_weld_solver::planning::{PlanConfig, plan};
use gantry_weld_solver::sim::{DEFAULT_DT, Simulator};
use gantry_weld_core::space::{BandInterval, SpaceLength, YPosition};
use gantry_weld_core::velocity::Velocity;
use serde::Serialize;
use std::{fs::File, io::BufWriter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[derive(Debug, Clone, Serialize)]
struct RobotReport {
    robot: String,
    welds_completed: u32,
    utilization: f64,
    time_welding_s: f64,
    time_moving_s: f64,
    time_idle_s: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ModeReport {
    mode: String,
    windows: usize,
    stops: usize,
    tasks: usize,
    gantry_start_x: f64,
    makespan_s: f64,
    progress: f64,
    collision_waits: u32,
    robots: Vec<RobotReport>,
}

#[derive(Debug, Clone, Serialize)]
struct RunReport {
    seed: u64,
    weld_count: usize,
    total_weld_length_mm: f64,
    modes: Vec<ModeReport>,
}

/// The reference welding cell: a 6 m gantry with two robot pairs and the
/// s1/s2 interference bands between their nominal ranges.
fn reference_scene() -> Scene {
    let robot = |id: u32, side: Side, lo: f64, hi: f64| {
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
    };
    Scene::new(
        GantrySpec::new(
            SpaceLength::new(6000.0),
            Velocity::new(300.0),
            SpaceLength::new(3000.0),
        ),
        vec![
            robot(1, Side::XPlus, 0.0, 1000.0),
            robot(3, Side::XPlus, 1000.0, 2000.0),
            robot(2, Side::XMinus, 0.0, 1000.0),
            robot(4, Side::XMinus, 1000.0, 2000.0),
        ],
        vec![
            ZoneSpec::new(
                "s1",
                BandInterval::new(YPosition::new(800.0), YPosition::new(1200.0)),
                vec![RobotId::new(1), RobotId::new(3)],
            ),
            ZoneSpec::new(
                "s2",
                BandInterval::new(YPosition::new(800.0), YPosition::new(1200.0)),
                vec![RobotId::new(2), RobotId::new(4)],
            ),
        ],
    )
    .expect("reference scene is valid")
}

fn run_mode(scene: &Scene, welds: &[gantry_weld_model::weld::Weld], mode: Mode) -> Option<ModeReport> {
    let config = PlanConfig::default();
    let plan = match plan(welds, scene, mode, &config) {
        Ok(plan) => plan,
        Err(e) => {
            error!(%mode, "planning failed: {e}");
            return None;
        }
    };
    info!(
        %mode,
        windows = plan.windows().len(),
        stops = plan.stops().len(),
        tasks = plan.task_count(),
        "plan ready"
    );

    let mut sim = match Simulator::new(scene, &plan, DEFAULT_DT) {
        Ok(sim) => sim,
        Err(e) => {
            error!(%mode, "plan rejected by the simulator: {e}");
            return None;
        }
    };
    let summary = sim.run(1_000_000);
    if !summary.complete {
        error!(%mode, ticks = summary.ticks, "simulation did not finish");
    }
    info!(
        %mode,
        makespan_s = sim.time().value(),
        collision_waits = sim.collision_waits(),
        "simulation finished"
    );
    for r in sim.robots() {
        info!(
            robot = %r.id(),
            welds = r.welds_completed(),
            utilization = r.utilization(),
            weld_s = r.time_welding().value(),
            move_s = r.time_moving().value(),
            idle_s = r.time_idle().value(),
            "robot summary"
        );
    }

    Some(ModeReport {
        mode: mode.to_string(),
        windows: plan.windows().len(),
        stops: plan.stops().len(),
        tasks: plan.task_count(),
        gantry_start_x: plan.start_x().value(),
        makespan_s: sim.time().value(),
        progress: sim.progress(),
        collision_waits: sim.collision_waits(),
        robots: sim
            .robots()
            .iter()
            .map(|r| RobotReport {
                robot: r.id().to_string(),
                welds_completed: r.welds_completed(),
                utilization: r.utilization(),
                time_welding_s: r.time_welding().value(),
                time_moving_s: r.time_moving().value(),
                time_idle_s: r.time_idle().value(),
            })
            .collect(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_tracing();

    let scene = reference_scene();
    let generator_config = GeneratorConfig::default();
    let seed = generator_config.seed;
    let welds = WeldSetGenerator::new(generator_config).generate(&scene);
    let total_length: f64 = welds.iter().map(|w| w.length().value()).sum();
    info!(
        welds = welds.len(),
        total_length_mm = total_length,
        seed,
        "generated weld set"
    );

    let modes = [Mode::Wom, Mode::Saw, Mode::Hybrid]
        .into_iter()
        .filter_map(|mode| run_mode(&scene, &welds, mode))
        .collect();

    let report = RunReport {
        seed,
        weld_count: welds.len(),
        total_weld_length_mm: total_length,
        modes,
    };

    let file = File::create("run-report.json")?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)?;
    info!("report written to run-report.json");
    Ok(())
}
