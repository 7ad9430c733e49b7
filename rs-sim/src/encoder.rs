//! Flat network input layout and the encoding of trajectory and pose into it.
//!
//! Input: `samples` trajectory entries of `7 + styles` floats, then one
//! 12-float entry per joint. Output: `future_samples` trajectory entries of 4
//! floats, one 12-float entry per joint, then the 3-float root delta.

use crate::config::TrajectoryConfig;
use crate::frame::CoordinateFrame;
use crate::network::Network;
use crate::skeleton::JointPose;
use crate::trajectory::Trajectory;

/// Fixed part of a trajectory input entry before the style weights.
pub const TRAJECTORY_INPUT_BASE: usize = 7;
pub const TRAJECTORY_OUTPUT_WIDTH: usize = 4;
pub const JOINT_WIDTH: usize = 12;
pub const ROOT_DELTA_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub trajectory_samples: usize,
    pub future_samples: usize,
    pub styles: usize,
    pub joints: usize,
}

impl FeatureLayout {
    pub fn new(trajectory: &TrajectoryConfig, styles: usize, joints: usize) -> Self {
        Self {
            trajectory_samples: trajectory.samples,
            future_samples: trajectory.future_samples(),
            styles,
            joints,
        }
    }

    pub fn trajectory_input_width(&self) -> usize {
        TRAJECTORY_INPUT_BASE + self.styles
    }

    pub fn joint_input_offset(&self) -> usize {
        self.trajectory_samples * self.trajectory_input_width()
    }

    pub fn input_len(&self) -> usize {
        self.joint_input_offset() + self.joints * JOINT_WIDTH
    }

    pub fn joint_output_offset(&self) -> usize {
        self.future_samples * TRAJECTORY_OUTPUT_WIDTH
    }

    pub fn root_delta_offset(&self) -> usize {
        self.joint_output_offset() + self.joints * JOINT_WIDTH
    }

    pub fn output_len(&self) -> usize {
        self.root_delta_offset() + ROOT_DELTA_WIDTH
    }

    pub fn matches<N: Network + ?Sized>(&self, network: &N) -> bool {
        network.input_len() == self.input_len() && network.output_len() == self.output_len()
    }
}

/// Ground-flattened frames of the root point and the point just before it.
pub fn root_frames(trajectory: &Trajectory) -> (CoordinateFrame, CoordinateFrame) {
    let root = trajectory.root_index();
    let current = trajectory.point(root).frame().flattened();
    let previous = trajectory.point(root - 1).frame().flattened();
    (current, previous)
}

/// Writes the trajectory block, relative to `current_root`.
pub fn encode_trajectory<N: Network + ?Sized>(
    layout: &FeatureLayout,
    trajectory: &Trajectory,
    current_root: &CoordinateFrame,
    network: &mut N,
) {
    let width = layout.trajectory_input_width();
    for i in 0..layout.trajectory_samples {
        let sample = trajectory.sample(i);
        let pos = current_root.to_local_position(sample.position());
        let dir = current_root.to_local_direction(sample.direction());
        let base = i * width;
        network.set_input(base, pos.x);
        network.set_input(base + 1, 0.0);
        network.set_input(base + 2, pos.z);
        network.set_input(base + 3, dir.x);
        network.set_input(base + 4, dir.z);
        network.set_input(base + 5, 0.0);
        network.set_input(base + 6, 0.0);
        for (j, style) in sample.styles.iter().take(layout.styles).enumerate() {
            network.set_input(base + TRAJECTORY_INPUT_BASE + j, *style);
        }
    }
}

/// Writes the joint block, relative to `previous_root`.
pub fn encode_joints<N: Network + ?Sized>(
    layout: &FeatureLayout,
    pose: &[JointPose],
    previous_root: &CoordinateFrame,
    network: &mut N,
) {
    let start = layout.joint_input_offset();
    for (i, joint) in pose.iter().take(layout.joints).enumerate() {
        let values = [
            previous_root.to_local_position(joint.position),
            previous_root.to_local_direction(joint.forward),
            previous_root.to_local_direction(joint.up),
            previous_root.to_local_direction(joint.velocity),
        ];
        let base = start + i * JOINT_WIDTH;
        for (k, v) in values.iter().enumerate() {
            network.set_input(base + 3 * k, v.x);
            network.set_input(base + 3 * k + 1, v.y);
            network.set_input(base + 3 * k + 2, v.z);
        }
    }
}

/// Fills the whole input vector. Returns the frames used so the decoder can
/// map outputs back through the same current root.
pub fn encode<N: Network + ?Sized>(
    layout: &FeatureLayout,
    trajectory: &Trajectory,
    pose: &[JointPose],
    network: &mut N,
) -> (CoordinateFrame, CoordinateFrame) {
    let (current, previous) = root_frames(trajectory);
    encode_trajectory(layout, trajectory, &current, network);
    encode_joints(layout, pose, &previous, network);
    (current, previous)
}
