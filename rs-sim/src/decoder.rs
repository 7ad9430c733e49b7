use bevy::prelude::{Quat, Vec3};
use rs_utils::{Terrain, exponential01, interpolate_vec3, safe_normalize_or};
use tracing::trace;

use crate::encoder::{FeatureLayout, JOINT_WIDTH, TRAJECTORY_OUTPUT_WIDTH};
use crate::frame::CoordinateFrame;
use crate::network::Network;
use crate::skeleton::JointPose;
use crate::trajectory::Trajectory;

/// Root translations much below this are treated as network noise.
pub const TRANSLATION_DEAD_ZONE: f32 = 0.001;
/// Same for root rotation, in degrees.
pub const ROTATION_DEAD_ZONE: f32 = 0.01;
/// Weight of the decoded position against the velocity-advanced one.
pub const POSITION_BLEND: f32 = 0.5;

/// Root motion predicted for this tick, in the current root frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootDelta {
    pub translation: Vec3,
    /// Degrees about +Y.
    pub angle: f32,
}

impl RootDelta {
    pub fn read<N: Network + ?Sized>(layout: &FeatureLayout, network: &N) -> Self {
        let end = layout.root_delta_offset();
        Self {
            translation: Vec3::new(network.output(end), 0.0, network.output(end + 1)),
            angle: network.output(end + 2),
        }
    }

    /// Attenuates translation and rotation independently by the dead-zone gain.
    pub fn damped(self) -> Self {
        let translation =
            self.translation * exponential01(self.translation.length() / TRANSLATION_DEAD_ZONE);
        let angle = self.angle * exponential01(self.angle.abs() / ROTATION_DEAD_ZONE);
        Self { translation, angle }
    }
}

/// Shifts the past window and moves the root point by `delta`. Returns the
/// ground-flattened frame of the new root.
pub fn advance_root<T: Terrain + ?Sized>(
    trajectory: &mut Trajectory,
    delta: RootDelta,
    current_root: &CoordinateFrame,
    terrain: &T,
) -> CoordinateFrame {
    trajectory.shift_past();

    let root = trajectory.root_mut();
    root.set_position(current_root.to_world_position(delta.translation));
    let direction = Quat::from_rotation_y(delta.angle.to_radians()) * root.direction();
    root.set_direction(direction);
    trajectory.postprocess_root(terrain);

    trajectory.root().frame().flattened()
}

/// Carries the future along with the root, then pulls every future point
/// toward the decoded keyframes by `correction`.
pub fn correct_future<N: Network + ?Sized, T: Terrain + ?Sized>(
    layout: &FeatureLayout,
    trajectory: &mut Trajectory,
    network: &N,
    delta: RootDelta,
    next_root: &CoordinateFrame,
    correction: f32,
    terrain: &T,
) {
    let root = trajectory.root_index();
    let stride = trajectory.stride();
    let len = trajectory.len();

    let shift = next_root.to_world_direction(delta.translation);
    for i in root + 1..len {
        let point = trajectory.point_mut(i);
        let moved = point.position() + shift;
        point.set_position(moved);
    }

    let keyframe = |k: usize| {
        let base = ((k - root) / stride).min(layout.future_samples - 1) * TRAJECTORY_OUTPUT_WIDTH;
        (
            Vec3::new(network.output(base), 0.0, network.output(base + 1)),
            Vec3::new(network.output(base + 2), 0.0, network.output(base + 3)),
        )
    };

    for i in root + 1..len {
        let (prev_pos, prev_dir) = keyframe(trajectory.previous_keyframe(i));
        let (next_pos, next_dir) = keyframe(trajectory.next_keyframe(i));
        let factor = trajectory.keyframe_factor(i);

        let pos = (1.0 - factor) * prev_pos + factor * next_pos;
        let dir = ((1.0 - factor) * prev_dir + factor * next_dir).normalize_or_zero();

        let point = trajectory.point_mut(i);
        let position = interpolate_vec3(
            point.position(),
            next_root.to_world_position(pos),
            correction,
        );
        let direction = interpolate_vec3(
            point.direction(),
            next_root.to_world_direction(dir),
            correction,
        );
        point.set_position(position);
        point.set_direction(direction);
    }

    trajectory.postprocess_keyframes(root + stride, terrain);
    trajectory.reinterpolate_future();
}

/// Overwrites `pose` from the joint output block, mapped through `current_root`.
pub fn decode_joints<N: Network + ?Sized>(
    layout: &FeatureLayout,
    network: &N,
    pose: &mut [JointPose],
    current_root: &CoordinateFrame,
) {
    let start = layout.joint_output_offset();
    for (i, joint) in pose.iter_mut().take(layout.joints).enumerate() {
        let base = start + i * JOINT_WIDTH;
        let read = |k: usize| {
            Vec3::new(
                network.output(base + 3 * k),
                network.output(base + 3 * k + 1),
                network.output(base + 3 * k + 2),
            )
        };

        let position = read(0);
        let forward = safe_normalize_or(read(1), current_root.to_local_direction(joint.forward));
        let up = safe_normalize_or(read(2), current_root.to_local_direction(joint.up));
        let velocity = read(3);

        let advanced = current_root.to_local_position(joint.position) + velocity;
        joint.position = current_root.to_world_position(advanced.lerp(position, POSITION_BLEND));
        joint.forward = current_root.to_world_direction(forward);
        joint.up = current_root.to_world_direction(up);
        joint.velocity = current_root.to_world_direction(velocity);
    }
}

/// Runs the full decode after `predict`: root motion, future correction,
/// joint pose. Returns the flattened frame of the new root.
pub fn decode<N: Network + ?Sized, T: Terrain + ?Sized>(
    layout: &FeatureLayout,
    trajectory: &mut Trajectory,
    pose: &mut [JointPose],
    network: &N,
    current_root: &CoordinateFrame,
    correction: f32,
    terrain: &T,
) -> CoordinateFrame {
    let delta = RootDelta::read(layout, network).damped();
    let next_root = advance_root(trajectory, delta, current_root, terrain);
    correct_future(layout, trajectory, network, delta, &next_root, correction, terrain);
    decode_joints(layout, network, pose, current_root);
    trace!(
        translation = ?delta.translation,
        angle = delta.angle,
        root = ?next_root.position(),
        "pose decoded"
    );
    next_root
}
