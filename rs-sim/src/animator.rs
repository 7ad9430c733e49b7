use bevy::prelude::Vec3;
use rs_utils::{Terrain, ground_direction, look_rotation};
use tracing::{debug, info, warn};

use crate::config::AnimatorConfig;
use crate::decoder;
use crate::encoder::{self, FeatureLayout};
use crate::error::AnimatorError;
use crate::frame::CoordinateFrame;
use crate::ik::{Effector, IkCorrector};
use crate::network::Network;
use crate::skeleton::{JointPose, Skeleton};
use crate::steering::{SteeringInput, SteeringState};
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Full encode, inference, decode and IK pass.
    Animated,
    /// No usable network: only the trajectory was predicted.
    TrajectoryOnly,
    /// No usable network and trajectory control off.
    Idle,
}

/// Drives one character: owns its trajectory window, steering targets, joint
/// pose state and limb goals. Network, terrain and skeleton are borrowed per
/// tick.
#[derive(Debug, Clone)]
pub struct Animator {
    config: AnimatorConfig,
    layout: FeatureLayout,
    trajectory: Trajectory,
    steering: SteeringState,
    /// Skeleton joint bound to each pose slot.
    joints: Vec<usize>,
    pose: Vec<JointPose>,
    ik: IkCorrector,
    ticks: u64,
    reported_missing_network: bool,
}

impl Animator {
    pub fn new<S: Skeleton + ?Sized, T: Terrain + ?Sized>(
        config: AnimatorConfig,
        skeleton: &S,
        joints: Vec<usize>,
        ik: IkCorrector,
        terrain: &T,
    ) -> Result<Self, AnimatorError> {
        config.validate()?;
        if let Some(&bad) = joints.iter().find(|&&j| j >= skeleton.joint_count()) {
            return Err(AnimatorError::UnknownJoint(bad));
        }
        if let Some(bad) = ik
            .effectors()
            .iter()
            .map(|e| e.tip)
            .find(|&tip| tip >= skeleton.joint_count())
        {
            return Err(AnimatorError::UnknownJoint(bad));
        }
        if let Some(bad) = ik
            .spine()
            .into_iter()
            .flat_map(|spine| spine.indices())
            .find(|&j| j >= skeleton.joint_count())
        {
            return Err(AnimatorError::UnknownJoint(bad));
        }

        let forward = ground_direction(skeleton.root_rotation() * Vec3::Z, Vec3::Z);
        let mut trajectory = Trajectory::new(
            &config.trajectory,
            config.style_count(),
            skeleton.root_position(),
            forward,
        );
        trajectory.postprocess_all(terrain);

        let pose = joints
            .iter()
            .map(|&j| JointPose::capture(skeleton, j))
            .collect();
        let layout = FeatureLayout::new(&config.trajectory, config.style_count(), joints.len());
        let steering = SteeringState::new(forward, config.trajectory_correction);

        let mut ik = ik;
        ik.reset_goals(skeleton);

        info!(
            joints = joints.len(),
            styles = config.style_count(),
            inputs = layout.input_len(),
            outputs = layout.output_len(),
            "animator ready"
        );

        Ok(Self {
            config,
            layout,
            trajectory,
            steering,
            joints,
            pose,
            ik,
            ticks: 0,
            reported_missing_network: false,
        })
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn trajectory_mut(&mut self) -> &mut Trajectory {
        &mut self.trajectory
    }

    pub fn pose(&self) -> &[JointPose] {
        &self.pose
    }

    pub fn joints(&self) -> &[usize] {
        &self.joints
    }

    pub fn ik(&self) -> &IkCorrector {
        &self.ik
    }

    pub fn ik_mut(&mut self) -> &mut IkCorrector {
        &mut self.ik
    }

    pub fn steering(&self) -> &SteeringState {
        &self.steering
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn target_direction(&self) -> Vec3 {
        self.steering.target_direction()
    }

    pub fn set_target_direction(&mut self, direction: Vec3) {
        self.steering.set_target_direction(direction);
    }

    pub fn target_velocity(&self) -> Vec3 {
        self.steering.target_velocity()
    }

    pub fn set_target_velocity(&mut self, velocity: Vec3) {
        self.steering.set_target_velocity(velocity);
    }

    pub fn set_trajectory_control(&mut self, enabled: bool) {
        self.config.trajectory_control = enabled;
    }

    /// Turning IK on re-plants every goal at its current tip.
    pub fn use_ik<S: Skeleton + ?Sized>(&mut self, enabled: bool, skeleton: &S) {
        self.config.solve_ik = enabled;
        if enabled {
            self.ik.reset_goals(skeleton);
        }
    }

    /// Adds a limb goal planted at its tip. Tips outside the skeleton are ignored.
    pub fn add_effector<S: Skeleton + ?Sized>(&mut self, skeleton: &S, effector: Effector) {
        if effector.tip >= skeleton.joint_count() {
            return;
        }
        self.ik.push_effector(Effector {
            goal: skeleton.joint_position(effector.tip),
            ..effector
        });
    }

    /// Binds `joint` to a new pose slot. Joints outside the skeleton are ignored.
    pub fn add_joint<S: Skeleton + ?Sized>(&mut self, skeleton: &S, joint: usize) {
        if joint >= skeleton.joint_count() {
            return;
        }
        self.joints.push(joint);
        self.pose.push(JointPose::capture(skeleton, joint));
        self.refresh_layout();
    }

    /// Rebinds pose slot `slot`. Out-of-range slots or joints are ignored.
    pub fn set_joint<S: Skeleton + ?Sized>(&mut self, skeleton: &S, slot: usize, joint: usize) {
        if slot >= self.joints.len() || joint >= skeleton.joint_count() {
            return;
        }
        self.joints[slot] = joint;
        self.pose[slot] = JointPose::capture(skeleton, joint);
    }

    pub fn remove_joint(&mut self, slot: usize) {
        if slot >= self.joints.len() {
            return;
        }
        self.joints.remove(slot);
        self.pose.remove(slot);
        self.refresh_layout();
    }

    /// Drops slots beyond `count`. Growing is not possible without joints to
    /// bind, so larger counts leave the binding unchanged.
    pub fn set_joint_count(&mut self, count: usize) {
        if count < self.joints.len() {
            self.joints.truncate(count);
            self.pose.truncate(count);
            self.refresh_layout();
        }
    }

    /// Binds every skeleton joint, in skeleton order.
    pub fn auto_detect<S: Skeleton + ?Sized>(&mut self, skeleton: &S) {
        self.joints = (0..skeleton.joint_count()).collect();
        self.pose = self
            .joints
            .iter()
            .map(|&j| JointPose::capture(skeleton, j))
            .collect();
        self.refresh_layout();
    }

    fn refresh_layout(&mut self) {
        self.layout = FeatureLayout::new(
            &self.config.trajectory,
            self.config.style_count(),
            self.joints.len(),
        );
    }

    /// Shape check for a network before it is handed to [`Animator::tick`].
    pub fn check_network<N: Network + ?Sized>(&self, network: &N) -> Result<(), AnimatorError> {
        if self.layout.matches(network) {
            return Ok(());
        }
        Err(AnimatorError::NetworkShape {
            expected_inputs: self.layout.input_len(),
            expected_outputs: self.layout.output_len(),
            inputs: network.input_len(),
            outputs: network.output_len(),
        })
    }

    /// Advances the character by one tick.
    ///
    /// Without an initialised network of the right shape only the trajectory
    /// prediction runs and the pose is left as it was.
    pub fn tick<N, T, S>(
        &mut self,
        input: &SteeringInput,
        network: &mut N,
        terrain: &T,
        skeleton: &mut S,
    ) -> TickOutcome
    where
        N: Network + ?Sized,
        T: Terrain + ?Sized,
        S: Skeleton + ?Sized,
    {
        self.ticks += 1;

        if self.config.trajectory_control {
            self.steering.update(&self.config, input, &mut self.trajectory);
            self.trajectory.predict(
                self.steering.target_direction(),
                self.steering.target_velocity(),
                self.steering.bias(),
                terrain,
            );
        }

        if !network.is_initialised() || !self.layout.matches(network) {
            if !self.reported_missing_network {
                warn!(
                    initialised = network.is_initialised(),
                    inputs = network.input_len(),
                    outputs = network.output_len(),
                    expected_inputs = self.layout.input_len(),
                    expected_outputs = self.layout.output_len(),
                    "network unusable, skipping pose synthesis"
                );
                self.reported_missing_network = true;
            }
            return if self.config.trajectory_control {
                TickOutcome::TrajectoryOnly
            } else {
                TickOutcome::Idle
            };
        }
        self.reported_missing_network = false;

        let (current_root, _) = encoder::encode(&self.layout, &self.trajectory, &self.pose, network);
        network.predict();
        let next_root = decoder::decode(
            &self.layout,
            &mut self.trajectory,
            &mut self.pose,
            network,
            &current_root,
            self.steering.trajectory_correction(),
            terrain,
        );

        self.commit_pose(skeleton, &next_root);

        if self.config.solve_ik {
            self.ik.plant_limbs(skeleton);
            for (pose, &joint) in self.pose.iter_mut().zip(&self.joints) {
                pose.position = skeleton.joint_position(joint);
            }
        }

        skeleton.set_root(self.trajectory.root().position(), next_root.rotation());

        if self.config.solve_ik {
            self.ik.fit_to_ground(skeleton, terrain);
        }

        debug!(
            tick = self.ticks,
            root = ?self.trajectory.root().position(),
            heading = ?self.trajectory.root().direction(),
            bias = self.steering.bias(),
            "tick animated"
        );
        TickOutcome::Animated
    }

    /// Writes the decoded pose onto the skeleton with the root on flat ground.
    fn commit_pose<S: Skeleton + ?Sized>(&self, skeleton: &mut S, next_root: &CoordinateFrame) {
        skeleton.set_root(next_root.position(), next_root.rotation());
        for (pose, &joint) in self.pose.iter().zip(&self.joints) {
            skeleton.set_joint_position(joint, pose.position);
            skeleton.set_joint_rotation(joint, look_rotation(pose.forward, pose.up));
        }
    }
}
