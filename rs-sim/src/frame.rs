use bevy::prelude::{Quat, Vec3};
use rs_utils::{flatten, ground_direction, yaw_rotation};

/// Yaw-only rigid transform on the ground plane, used as the reference frame
/// for network features. Rebuilt every tick from a trajectory point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateFrame {
    position: Vec3,
    rotation: Quat,
}

impl CoordinateFrame {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            rotation: yaw_rotation(ground_direction(direction, Vec3::Z)),
        }
    }

    /// Same heading with the origin moved to y = 0.
    pub fn flattened(self) -> Self {
        Self {
            position: flatten(self.position),
            rotation: self.rotation,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn to_local_position(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    pub fn to_local_direction(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * world
    }

    pub fn to_world_position(&self, local: Vec3) -> Vec3 {
        self.rotation * local + self.position
    }

    pub fn to_world_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }
}
