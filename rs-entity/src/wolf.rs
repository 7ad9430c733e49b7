use rs_sim::LimbRole;

use super::{EffectorDef, RigDef, SpineDef};
use crate::joint;

pub const WOLF_HIPS: usize = 0;
pub const WOLF_SPINE: usize = 1;
pub const WOLF_SPINE1: usize = 2;
pub const WOLF_NECK: usize = 3;
pub const WOLF_HEAD: usize = 4;
pub const WOLF_LEFT_HAND: usize = 8;
pub const WOLF_RIGHT_HAND: usize = 12;
pub const WOLF_LEFT_FOOT: usize = 15;
pub const WOLF_RIGHT_FOOT: usize = 18;
pub const WOLF_TAIL1: usize = 20;

pub static WOLF_RIG: RigDef = RigDef {
    name: "wolf",
    joints: &[
        // root sits on the ground between the feet
        joint! { name: "Hips", parent: None, offset: (0.0, 0.55, -0.3) },
        joint! { name: "Spine", parent: Some(0), offset: (0.0, 0.02, 0.2) },
        joint! { name: "Spine1", parent: Some(1), offset: (0.0, 0.0, 0.2) },
        joint! { name: "Neck", parent: Some(2), offset: (0.0, 0.08, 0.2) },
        joint! { name: "Head", parent: Some(3), offset: (0.0, 0.1, 0.12) },
        joint! { name: "LeftShoulder", parent: Some(2), offset: (0.08, -0.02, 0.1) },
        joint! { name: "LeftArm", parent: Some(5), offset: (0.0, -0.12, 0.0) },
        joint! { name: "LeftForeArm", parent: Some(6), offset: (0.0, -0.18, 0.0) },
        joint! { name: "LeftHand", parent: Some(7), offset: (0.0, -0.2, 0.02) },
        joint! { name: "RightShoulder", parent: Some(2), offset: (-0.08, -0.02, 0.1) },
        joint! { name: "RightArm", parent: Some(9), offset: (0.0, -0.12, 0.0) },
        joint! { name: "RightForeArm", parent: Some(10), offset: (0.0, -0.18, 0.0) },
        joint! { name: "RightHand", parent: Some(11), offset: (0.0, -0.2, 0.02) },
        joint! { name: "LeftUpLeg", parent: Some(0), offset: (0.08, -0.05, 0.0) },
        joint! { name: "LeftLeg", parent: Some(13), offset: (0.0, -0.2, 0.04) },
        joint! { name: "LeftFoot", parent: Some(14), offset: (0.0, -0.27, -0.04) },
        joint! { name: "RightUpLeg", parent: Some(0), offset: (-0.08, -0.05, 0.0) },
        joint! { name: "RightLeg", parent: Some(16), offset: (0.0, -0.2, 0.04) },
        joint! { name: "RightFoot", parent: Some(17), offset: (0.0, -0.27, -0.04) },
        joint! { name: "Tail", parent: Some(0), offset: (0.0, 0.02, -0.1) },
        joint! { name: "Tail1", parent: Some(19), offset: (0.0, -0.05, -0.2) },
    ],
    effectors: &[
        EffectorDef { tip: "LeftHand", role: LimbRole::Front },
        EffectorDef { tip: "RightHand", role: LimbRole::Front },
        EffectorDef { tip: "LeftFoot", role: LimbRole::Rear },
        EffectorDef { tip: "RightFoot", role: LimbRole::Rear },
        EffectorDef { tip: "Tail1", role: LimbRole::Tail },
    ],
    spine: Some(SpineDef {
        spine: "Spine1",
        neck: "Neck",
        left_shoulder: "LeftShoulder",
        right_shoulder: "RightShoulder",
    }),
};
