use rs_entity::RigError;
use rs_sim::AnimatorError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("rig error: {0}")]
    Rig(#[from] RigError),
    #[error("animator error: {0}")]
    Animator(#[from] AnimatorError),
}
