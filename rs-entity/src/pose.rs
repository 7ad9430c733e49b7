use bevy::prelude::{Quat, Vec3};
use rs_sim::Skeleton;
use tracing::{debug, trace};

use super::{RigDef, RigError};

const DEFAULT_IK_ITERATIONS: usize = 16;
const DEFAULT_IK_TOLERANCE: f32 = 0.001;
/// Most joints bent for a single limb.
const DEFAULT_CHAIN_LENGTH: usize = 3;

/// World-space pose of a [`RigDef`].
///
/// Moving or rotating a joint carries everything below it; moving the root
/// carries the whole character.
#[derive(Debug, Clone)]
pub struct PoseSkeleton {
    rig: &'static RigDef,
    root_position: Vec3,
    root_rotation: Quat,
    positions: Vec<Vec3>,
    rotations: Vec<Quat>,
    /// Every joint below each joint.
    descendants: Vec<Vec<usize>>,
    ik_iterations: usize,
    ik_tolerance: f32,
    chain_length: usize,
}

impl PoseSkeleton {
    /// Rest pose of `rig` placed at `position`, facing `rotation * +Z`.
    pub fn new(rig: &'static RigDef, position: Vec3, rotation: Quat) -> Result<Self, RigError> {
        rig.validate()?;

        let count = rig.joints.len();
        let mut positions = Vec::with_capacity(count);
        for def in rig.joints {
            let base = def.parent.map_or(position, |p: usize| positions[p]);
            positions.push(base + rotation * Vec3::from_array(def.offset));
        }

        let mut descendants = vec![Vec::new(); count];
        for joint in (0..count).rev() {
            let mut below = Vec::new();
            for child in rig.children(joint) {
                below.push(child);
                below.extend_from_slice(&descendants[child]);
            }
            descendants[joint] = below;
        }

        debug!(rig = rig.name, joints = count, "pose skeleton built");
        Ok(Self {
            rig,
            root_position: position,
            root_rotation: rotation,
            positions,
            rotations: vec![rotation; count],
            descendants,
            ik_iterations: DEFAULT_IK_ITERATIONS,
            ik_tolerance: DEFAULT_IK_TOLERANCE,
            chain_length: DEFAULT_CHAIN_LENGTH,
        })
    }

    pub fn with_ik(mut self, iterations: usize, tolerance: f32, chain_length: usize) -> Self {
        self.ik_iterations = iterations;
        self.ik_tolerance = tolerance;
        self.chain_length = chain_length;
        self
    }

    pub fn rig(&self) -> &'static RigDef {
        self.rig
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Joints the solver bends to move `tip`, nearest first. The chain climbs
    /// until it reaches a joint with more than one child.
    pub fn limb_chain(&self, tip: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.rig.joints.get(tip).and_then(|def| def.parent);
        while let Some(joint) = current {
            if chain.len() == self.chain_length || self.rig.children(joint).count() > 1 {
                break;
            }
            chain.push(joint);
            current = self.rig.joints[joint].parent;
        }
        chain
    }

    fn translate_subtree(&mut self, joint: usize, delta: Vec3) {
        self.positions[joint] += delta;
        for &d in &self.descendants[joint] {
            self.positions[d] += delta;
        }
    }

    fn rotate_subtree(&mut self, joint: usize, delta: Quat) {
        let pivot = self.positions[joint];
        self.rotations[joint] = (delta * self.rotations[joint]).normalize();
        for &d in &self.descendants[joint] {
            self.positions[d] = pivot + delta * (self.positions[d] - pivot);
            self.rotations[d] = (delta * self.rotations[d]).normalize();
        }
    }
}

impl Skeleton for PoseSkeleton {
    fn joint_count(&self) -> usize {
        self.positions.len()
    }

    fn joint_name(&self, joint: usize) -> Option<&str> {
        self.rig.joints.get(joint).map(|def| def.name)
    }

    fn joint_position(&self, joint: usize) -> Vec3 {
        self.positions[joint]
    }

    fn joint_rotation(&self, joint: usize) -> Quat {
        self.rotations[joint]
    }

    fn set_joint_position(&mut self, joint: usize, position: Vec3) {
        if joint < self.positions.len() {
            let delta = position - self.positions[joint];
            self.translate_subtree(joint, delta);
        }
    }

    fn set_joint_rotation(&mut self, joint: usize, rotation: Quat) {
        if joint < self.rotations.len() {
            let delta = rotation * self.rotations[joint].inverse();
            self.rotate_subtree(joint, delta);
        }
    }

    fn root_position(&self) -> Vec3 {
        self.root_position
    }

    fn root_rotation(&self) -> Quat {
        self.root_rotation
    }

    fn set_root(&mut self, position: Vec3, rotation: Quat) {
        let delta = (rotation * self.root_rotation.inverse()).normalize();
        for (p, r) in self.positions.iter_mut().zip(&mut self.rotations) {
            *p = position + delta * (*p - self.root_position);
            *r = (delta * *r).normalize();
        }
        self.root_position = position;
        self.root_rotation = rotation;
    }

    /// Cyclic coordinate descent over [`PoseSkeleton::limb_chain`].
    fn solve_ik(&mut self, tip: usize, goal: Vec3) {
        let chain = self.limb_chain(tip);
        if chain.is_empty() {
            return;
        }
        for _ in 0..self.ik_iterations {
            for &joint in &chain {
                let pivot = self.positions[joint];
                let (Some(from), Some(to)) = (
                    (self.positions[tip] - pivot).try_normalize(),
                    (goal - pivot).try_normalize(),
                ) else {
                    continue;
                };
                self.rotate_subtree(joint, Quat::from_rotation_arc(from, to));
            }
            if self.positions[tip].distance(goal) < self.ik_tolerance {
                return;
            }
        }
        trace!(
            tip,
            error = self.positions[tip].distance(goal),
            "limb goal not reached"
        );
    }
}
