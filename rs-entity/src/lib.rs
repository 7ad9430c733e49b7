//! Quadruped rigs for the locomotion core.
//!
//! - Rigs are hardcoded Rust static data (joint hierarchy + rest offsets).
//! - The live pose is a [`PoseSkeleton`], which implements
//!   [`rs_sim::Skeleton`] with world-space joints and a CCD limb solver.

mod pose;
mod rig;
mod wolf;

pub use pose::*;
pub use rig::*;
pub use wolf::*;

// Small DSL macro to keep the rig tables readable.

#[macro_export]
macro_rules! joint {
    (
        name: $name:expr,
        parent: $parent:expr,
        offset: ($x:expr, $y:expr, $z:expr) $(,)?
    ) => {
        $crate::JointDef {
            name: $name,
            parent: $parent,
            offset: [$x as f32, $y as f32, $z as f32],
        }
    };
}
