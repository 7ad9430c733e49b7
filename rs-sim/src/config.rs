use serde::{Deserialize, Serialize};

use crate::error::AnimatorError;

/// Window geometry for the rolling trajectory (60 Hz sampling by default).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Total number of points, past + root + future.
    pub length: usize,
    pub root_index: usize,
    /// Distance between keyframes in points.
    pub stride: usize,
    /// Keyframes fed to the network, counted from index 0.
    pub samples: usize,
    /// Lateral distance of the left/right terrain samples.
    pub sample_width: f32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            length: 111,
            root_index: 60,
            stride: 10,
            samples: 12,
            sample_width: 0.5,
        }
    }
}

impl TrajectoryConfig {
    pub fn validate(&self) -> Result<(), AnimatorError> {
        if self.stride == 0 {
            return Err(AnimatorError::Geometry("stride must be positive".into()));
        }
        if self.root_index == 0 || self.root_index >= self.length {
            return Err(AnimatorError::Geometry(format!(
                "root index {} outside 1..{}",
                self.root_index, self.length
            )));
        }
        if self.root_index % self.stride != 0 {
            return Err(AnimatorError::Geometry(format!(
                "root index {} is not a multiple of stride {}",
                self.root_index, self.stride
            )));
        }
        let future = self.length - 1 - self.root_index;
        if future == 0 || future % self.stride != 0 {
            return Err(AnimatorError::Geometry(format!(
                "future span {future} is not a positive multiple of stride {}",
                self.stride
            )));
        }
        if self.samples == 0 || (self.samples - 1) * self.stride >= self.length {
            return Err(AnimatorError::Geometry(format!(
                "{} samples do not fit a window of {} points",
                self.samples, self.length
            )));
        }
        Ok(())
    }

    /// Keyframes from the root to the end of the window, root included.
    pub fn future_samples(&self) -> usize {
        (self.length - 1 - self.root_index) / self.stride + 1
    }
}

/// Scales a style's bias while `modifier` is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedMultiplier {
    pub modifier: usize,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub name: String,
    #[serde(default = "default_style_bias")]
    pub bias: f32,
    #[serde(default)]
    pub multipliers: Vec<SpeedMultiplier>,
}

fn default_style_bias() -> f32 {
    1.0
}

impl StyleConfig {
    pub fn new(name: impl Into<String>, bias: f32) -> Self {
        Self {
            name: name.into(),
            bias,
            multipliers: Vec::new(),
        }
    }

    pub fn with_multiplier(mut self, modifier: usize, value: f32) -> Self {
        self.multipliers.push(SpeedMultiplier { modifier, value });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub trajectory: TrajectoryConfig,
    pub styles: Vec<StyleConfig>,
    /// Per-tick blend toward the steering targets.
    pub target_blending: f32,
    /// Per-tick blend of the root style weights.
    pub style_transition: f32,
    pub trajectory_control: bool,
    /// Initial pull of the future trajectory toward the network prediction.
    pub trajectory_correction: f32,
    pub solve_ik: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            trajectory: TrajectoryConfig::default(),
            styles: vec![
                StyleConfig::new("idle", 1.0),
                StyleConfig::new("move", 2.5).with_multiplier(0, 0.5),
                StyleConfig::new("jump", 2.5),
                StyleConfig::new("sit", 0.0),
                StyleConfig::new("stand", 0.0),
                StyleConfig::new("lie", 0.0),
            ],
            target_blending: 0.25,
            style_transition: 0.25,
            trajectory_control: true,
            trajectory_correction: 1.0,
            solve_ik: true,
        }
    }
}

impl AnimatorConfig {
    pub fn validate(&self) -> Result<(), AnimatorError> {
        self.trajectory.validate()?;
        if self.styles.is_empty() {
            return Err(AnimatorError::StyleCount {
                expected: 1,
                actual: 0,
            });
        }
        Ok(())
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }
}
