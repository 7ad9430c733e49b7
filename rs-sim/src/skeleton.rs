use bevy::prelude::{Quat, Vec3};

/// Skeleton binding used by the animator. Joint transforms are world space.
///
/// Moving or rotating a joint is expected to carry its descendants along, and
/// moving the root carries the whole character; that propagation belongs to
/// the implementation, as does the limb solver behind [`Skeleton::solve_ik`].
pub trait Skeleton {
    fn joint_count(&self) -> usize;
    fn joint_name(&self, joint: usize) -> Option<&str>;

    fn joint_position(&self, joint: usize) -> Vec3;
    fn joint_rotation(&self, joint: usize) -> Quat;
    fn set_joint_position(&mut self, joint: usize, position: Vec3);
    fn set_joint_rotation(&mut self, joint: usize, rotation: Quat);

    fn root_position(&self) -> Vec3;
    fn root_rotation(&self) -> Quat;
    fn set_root(&mut self, position: Vec3, rotation: Quat);

    /// Bends the chain ending at `tip` so that `tip` reaches toward `goal`.
    fn solve_ik(&mut self, tip: usize, goal: Vec3);

    fn find_joint(&self, name: &str) -> Option<usize> {
        (0..self.joint_count()).find(|&j| self.joint_name(j) == Some(name))
    }
}

/// Per-joint state carried between ticks, world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub velocity: Vec3,
}

impl Default for JointPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
            velocity: Vec3::ZERO,
        }
    }
}

impl JointPose {
    /// Reads position and orientation axes from the skeleton, at rest.
    pub fn capture<S: Skeleton + ?Sized>(skeleton: &S, joint: usize) -> Self {
        let rotation = skeleton.joint_rotation(joint);
        Self {
            position: skeleton.joint_position(joint),
            forward: rotation * Vec3::Z,
            up: rotation * Vec3::Y,
            velocity: Vec3::ZERO,
        }
    }
}
