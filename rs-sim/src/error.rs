use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnimatorError {
    #[error("invalid trajectory geometry: {0}")]
    Geometry(String),
    #[error("expected {expected} style channels, got {actual}")]
    StyleCount { expected: usize, actual: usize },
    #[error(
        "network shape {inputs}x{outputs} does not match feature layout {expected_inputs}x{expected_outputs}"
    )]
    NetworkShape {
        expected_inputs: usize,
        expected_outputs: usize,
        inputs: usize,
        outputs: usize,
    },
    #[error("joint {0} is not part of the skeleton")]
    UnknownJoint(usize),
    #[error("skeleton has no joint named {0:?}")]
    MissingJoint(String),
    #[error("invalid network parameters: {0}")]
    Parameters(String),
}
