use bevy::prelude::*;
use rs_sim::{SteeringInput, TickOutcome};
use tracing::info;

use crate::plugins::{Ground, Locomotion};
use crate::script::SteeringScript;
use crate::timing::{TickCost, Timing};

#[derive(Resource, Default)]
pub struct CurrentSteering(pub SteeringInput);

#[derive(Resource)]
pub struct RunLimits {
    pub ticks: u64,
    pub report_every: u64,
}

#[derive(Resource, Default, Debug)]
pub struct RunStats {
    pub animated: u64,
    pub trajectory_only: u64,
    pub idle: u64,
    /// Horizontal distance covered by the root.
    pub travelled: f32,
    pub cost: TickCost,
}

impl RunStats {
    pub fn record(&mut self, outcome: TickOutcome, step: Vec3, ms: f32) {
        match outcome {
            TickOutcome::Animated => self.animated += 1,
            TickOutcome::TrajectoryOnly => self.trajectory_only += 1,
            TickOutcome::Idle => self.idle += 1,
        }
        self.travelled += Vec3::new(step.x, 0.0, step.z).length();
        self.cost.record(ms);
    }
}

pub fn scripted_input_system(
    script: Res<SteeringScript>,
    locomotion: Res<Locomotion>,
    mut steering: ResMut<CurrentSteering>,
) {
    steering.0 = script.input_at(locomotion.animator.ticks());
}

pub fn animate_system(
    mut locomotion: ResMut<Locomotion>,
    ground: Res<Ground>,
    steering: Res<CurrentSteering>,
    mut stats: ResMut<RunStats>,
) {
    let timer = Timing::start();
    let before = locomotion.animator.trajectory().root().position();
    let outcome = locomotion.tick(&steering.0, &*ground.0);
    let after = locomotion.animator.trajectory().root().position();
    stats.record(outcome, after - before, timer.ms());
}

pub fn report_system(
    locomotion: Res<Locomotion>,
    limits: Res<RunLimits>,
    stats: Res<RunStats>,
    steering: Res<CurrentSteering>,
) {
    let tick = locomotion.animator.ticks();
    if limits.report_every == 0 || tick % limits.report_every != 0 {
        return;
    }
    let root = locomotion.animator.trajectory().root();
    info!(
        tick,
        root = ?root.position(),
        heading = ?root.direction(),
        turn = steering.0.turn,
        bias = locomotion.animator.steering().bias(),
        travelled = stats.travelled,
        tick_ms = stats.cost.mean_ms(),
        "progress"
    );
}

pub fn exit_system(
    locomotion: Res<Locomotion>,
    limits: Res<RunLimits>,
    stats: Res<RunStats>,
    mut done: Local<bool>,
    mut exit: EventWriter<AppExit>,
) {
    if *done || locomotion.animator.ticks() < limits.ticks {
        return;
    }
    *done = true;
    info!(
        ticks = locomotion.animator.ticks(),
        animated = stats.animated,
        trajectory_only = stats.trajectory_only,
        idle = stats.idle,
        travelled = stats.travelled,
        mean_tick_ms = stats.cost.mean_ms(),
        max_tick_ms = stats.cost.max_ms,
        "run finished"
    );
    exit.write(AppExit::Success);
}
