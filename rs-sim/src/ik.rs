use bevy::prelude::{Quat, Vec3};
use rs_utils::{Terrain, exponential01};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::AnimatorError;
use crate::skeleton::Skeleton;

const VELOCITY_THRESHOLD: f32 = 0.015;
const FRONT_HEIGHT_THRESHOLD: f32 = 0.025;
const REAR_HEIGHT_THRESHOLD: f32 = 0.05;
const SPINE_ALIGNMENT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimbRole {
    Front,
    Rear,
    /// Only ever lifted onto the ground, never planted by the goal blend.
    Tail,
}

impl LimbRole {
    pub fn height_threshold(self) -> f32 {
        match self {
            LimbRole::Front => FRONT_HEIGHT_THRESHOLD,
            LimbRole::Rear | LimbRole::Tail => REAR_HEIGHT_THRESHOLD,
        }
    }

    pub fn velocity_threshold(self) -> f32 {
        VELOCITY_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effector {
    /// Skeleton joint at the end of the limb chain.
    pub tip: usize,
    pub role: LimbRole,
    pub goal: Vec3,
}

impl Effector {
    pub fn new(tip: usize, role: LimbRole) -> Self {
        Self {
            tip,
            role,
            goal: Vec3::ZERO,
        }
    }
}

/// Joints re-oriented onto the terrain in the second pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpineJoints {
    pub spine: usize,
    pub neck: usize,
    pub left_shoulder: usize,
    pub right_shoulder: usize,
}

impl SpineJoints {
    pub fn indices(&self) -> [usize; 4] {
        [self.spine, self.neck, self.left_shoulder, self.right_shoulder]
    }

    /// Resolves the four roles by joint name once, at configuration time.
    pub fn resolve<S: Skeleton + ?Sized>(
        skeleton: &S,
        spine: &str,
        neck: &str,
        left_shoulder: &str,
        right_shoulder: &str,
    ) -> Result<Self, AnimatorError> {
        let find = |name: &str| {
            skeleton
                .find_joint(name)
                .ok_or_else(|| AnimatorError::MissingJoint(name.to_string()))
        };
        Ok(Self {
            spine: find(spine)?,
            neck: find(neck)?,
            left_shoulder: find(left_shoulder)?,
            right_shoulder: find(right_shoulder)?,
        })
    }
}

/// Goal blend weight for a planted limb: small when the tip barely moved or
/// sits close to the ground. Always in `[0, 1]`.
pub fn goal_weight(role: LimbRole, velocity_delta: f32, height: f32) -> f32 {
    let velocity_weight = exponential01(velocity_delta / role.velocity_threshold());
    let height_weight = exponential01(height / role.height_threshold());
    velocity_weight.min(height_weight)
}

/// `position` moved onto the ground, keeping its height above the character base.
fn ground_relative<T: Terrain + ?Sized>(terrain: &T, position: Vec3, base_height: f32) -> Vec3 {
    let height = terrain.ground_height(position);
    Vec3::new(position.x, height + (position.y - base_height), position.z)
}

/// Two-pass foot and tail placement.
#[derive(Debug, Clone, Default)]
pub struct IkCorrector {
    effectors: Vec<Effector>,
    spine: Option<SpineJoints>,
}

impl IkCorrector {
    pub fn new(effectors: Vec<Effector>, spine: Option<SpineJoints>) -> Self {
        Self { effectors, spine }
    }

    pub fn effectors(&self) -> &[Effector] {
        &self.effectors
    }

    pub fn spine(&self) -> Option<SpineJoints> {
        self.spine
    }

    pub(crate) fn push_effector(&mut self, effector: Effector) {
        self.effectors.push(effector);
    }

    pub fn remove_effector(&mut self, index: usize) {
        if index < self.effectors.len() {
            self.effectors.remove(index);
        }
    }

    pub fn set_effector_goal(&mut self, index: usize, goal: Vec3) {
        if let Some(effector) = self.effectors.get_mut(index) {
            effector.goal = goal;
        }
    }

    /// Puts every goal on its current tip.
    pub fn reset_goals<S: Skeleton + ?Sized>(&mut self, skeleton: &S) {
        for effector in &mut self.effectors {
            effector.goal = skeleton.joint_position(effector.tip);
        }
    }

    /// First pass: drag each limb goal toward its freshly posed tip and solve
    /// every limb except the tail.
    pub fn plant_limbs<S: Skeleton + ?Sized>(&mut self, skeleton: &mut S) {
        let base_height = skeleton.root_position().y;
        for effector in self.effectors.iter_mut().filter(|e| e.role != LimbRole::Tail) {
            let tip = skeleton.joint_position(effector.tip);
            effector.goal.y = tip.y;
            let weight = goal_weight(
                effector.role,
                (tip - effector.goal).length(),
                tip.y - base_height,
            );
            effector.goal = effector.goal.lerp(tip, weight);
        }
        for effector in self.effectors.iter().filter(|e| e.role != LimbRole::Tail) {
            skeleton.solve_ik(effector.tip, effector.goal);
        }
    }

    /// Second pass: put every goal onto the terrain, align the spine with the
    /// ground under the neck, and solve all limbs.
    pub fn fit_to_ground<S: Skeleton + ?Sized, T: Terrain + ?Sized>(
        &mut self,
        skeleton: &mut S,
        terrain: &T,
    ) {
        let base_height = skeleton.root_position().y;
        for effector in &mut self.effectors {
            let tip = skeleton.joint_position(effector.tip);
            let height = terrain.ground_height(tip);
            let offset = tip.y - base_height;
            let y = match effector.role {
                LimbRole::Tail => height.max(height + offset),
                LimbRole::Front | LimbRole::Rear => height + offset,
            };
            effector.goal = Vec3::new(tip.x, y, tip.z);
        }

        if let Some(spine) = self.spine {
            align_spine(skeleton, terrain, spine, base_height);
        }

        for effector in &self.effectors {
            skeleton.solve_ik(effector.tip, effector.goal);
        }
        trace!(effectors = self.effectors.len(), "ground fit solved");
    }
}

fn align_spine<S: Skeleton + ?Sized, T: Terrain + ?Sized>(
    skeleton: &mut S,
    terrain: &T,
    joints: SpineJoints,
    base_height: f32,
) {
    let spine = skeleton.joint_position(joints.spine);
    let neck = skeleton.joint_position(joints.neck);
    let left_shoulder = skeleton.joint_position(joints.left_shoulder);
    let right_shoulder = skeleton.joint_position(joints.right_shoulder);

    let grounded_neck = ground_relative(terrain, neck, base_height);

    let rotation = skeleton.joint_rotation(joints.spine);
    if let (Some(from), Some(to)) = (
        (neck - spine).try_normalize(),
        (grounded_neck - spine).try_normalize(),
    ) {
        let target = Quat::from_rotation_arc(from, to) * rotation;
        skeleton.set_joint_rotation(joints.spine, rotation.slerp(target, SPINE_ALIGNMENT));
    }

    skeleton.set_joint_position(joints.spine, ground_relative(terrain, spine, base_height));
    skeleton.set_joint_position(joints.neck, grounded_neck);
    skeleton.set_joint_position(
        joints.left_shoulder,
        ground_relative(terrain, left_shoulder, base_height),
    );
    skeleton.set_joint_position(
        joints.right_shoulder,
        ground_relative(terrain, right_shoulder, base_height),
    );
}
