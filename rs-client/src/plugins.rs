use bevy::prelude::*;
use bevy::time::Fixed;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_entity::{PoseSkeleton, WOLF_RIG};
use rs_sim::{Animator, Mlp, Network, Skeleton, SteeringInput, TickOutcome};
use rs_utils::Terrain;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::script::SteeringScript;
use crate::systems;

/// The animated character: core state, its pose and the network it runs.
#[derive(Resource, Clone)]
pub struct Locomotion {
    pub animator: Animator,
    pub skeleton: PoseSkeleton,
    pub network: Mlp,
}

impl Locomotion {
    /// A wolf standing on the terrain at the origin, facing +Z.
    pub fn spawn<T: Terrain + ?Sized>(config: &ClientConfig, terrain: &T) -> Result<Self, ClientError> {
        let start = Vec3::new(0.0, terrain.ground_height(Vec3::ZERO), 0.0);
        let skeleton = PoseSkeleton::new(&WOLF_RIG, start, Quat::IDENTITY)?;
        let joints = (0..skeleton.joint_count()).collect();
        let animator = Animator::new(
            config.animator.clone(),
            &skeleton,
            joints,
            WOLF_RIG.ik_corrector(&skeleton)?,
            terrain,
        )?;

        let layout = *animator.layout();
        let network = if config.network.random_weights {
            let mut rng = StdRng::seed_from_u64(config.network.seed);
            Mlp::random(
                layout.input_len(),
                &config.network.hidden,
                layout.output_len(),
                config.network.weight_scale,
                &mut rng,
            )?
        } else {
            warn!("no network weights, running trajectory prediction only");
            Mlp::empty(layout.input_len(), layout.output_len())
        };
        animator.check_network(&network)?;

        info!(
            rig = WOLF_RIG.name,
            joints = skeleton.joint_count(),
            inputs = network.input_len(),
            outputs = network.output_len(),
            "character spawned"
        );
        Ok(Self {
            animator,
            skeleton,
            network,
        })
    }

    pub fn tick<T: Terrain + ?Sized>(&mut self, input: &SteeringInput, terrain: &T) -> TickOutcome {
        let Self {
            animator,
            skeleton,
            network,
        } = self;
        animator.tick(input, network, terrain, skeleton)
    }
}

#[derive(Resource)]
pub struct Ground(pub Box<dyn Terrain + Send + Sync>);

pub struct LocomotionPlugin {
    config: ClientConfig,
    character: Locomotion,
}

impl LocomotionPlugin {
    pub fn new(config: ClientConfig, character: Locomotion) -> Self {
        Self { config, character }
    }
}

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        let script = SteeringScript::new(self.config.script.clone(), self.config.animator.style_count());

        app.insert_resource(Time::<Fixed>::from_hz(self.config.run.tick_hz))
            .insert_resource(self.character.clone())
            .insert_resource(Ground(self.config.terrain.build()))
            .insert_resource(script)
            .insert_resource(systems::CurrentSteering::default())
            .insert_resource(systems::RunStats::default())
            .insert_resource(systems::RunLimits {
                ticks: self.config.run.ticks,
                report_every: self.config.run.report_every,
            })
            .add_systems(
                FixedUpdate,
                (
                    systems::scripted_input_system,
                    systems::animate_system,
                    systems::report_system,
                    systems::exit_system,
                )
                    .chain(),
            );
    }
}
