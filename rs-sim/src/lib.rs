//! Neural locomotion core.
//!
//! Per tick: steering targets bend the predicted trajectory, the trajectory
//! and the previous pose are encoded into the network input, the output is
//! decoded into root motion, a corrected future and a new joint pose, and two
//! IK passes plant the limbs on the terrain.

pub mod animator;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod ik;
pub mod network;
pub mod skeleton;
pub mod steering;
pub mod trajectory;

pub use animator::{Animator, TickOutcome};
pub use config::{AnimatorConfig, SpeedMultiplier, StyleConfig, TrajectoryConfig};
pub use decoder::RootDelta;
pub use encoder::FeatureLayout;
pub use error::AnimatorError;
pub use frame::CoordinateFrame;
pub use ik::{Effector, IkCorrector, LimbRole, SpineJoints};
pub use network::{DenseLayer, Mlp, MlpParameters, Network};
pub use skeleton::{JointPose, Skeleton};
pub use steering::{SteeringInput, SteeringState};
pub use trajectory::{Trajectory, TrajectoryPoint};

#[cfg(test)]
mod tests;
