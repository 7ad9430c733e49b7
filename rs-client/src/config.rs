//! Client settings, read from a TOML file. Every section falls back to its
//! defaults, so an empty file is a valid config.

use std::path::Path;

use rs_sim::{AnimatorConfig, AnimatorError};
use rs_utils::TerrainSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid animator settings: {0}")]
    Animator(#[from] AnimatorError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub animator: AnimatorConfig,
    pub network: NetworkConfig,
    pub terrain: TerrainSettings,
    pub run: RunConfig,
    /// Steering script, played in order and looped.
    pub script: Vec<ScriptSegment>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            animator: AnimatorConfig::default(),
            network: NetworkConfig::default(),
            terrain: TerrainSettings::default(),
            run: RunConfig::default(),
            script: default_script(),
        }
    }
}

/// Demo network. Without trained parameters the client either runs random
/// weights or no network at all.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub random_weights: bool,
    pub hidden: Vec<usize>,
    pub seed: u64,
    pub weight_scale: f32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            random_weights: true,
            hidden: vec![256, 256],
            seed: 0,
            weight_scale: 0.01,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub ticks: u64,
    pub tick_hz: f64,
    /// Ticks between progress lines; 0 disables them.
    pub report_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 600,
            tick_hz: 60.0,
            report_every: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScriptSegment {
    pub ticks: u64,
    #[serde(default)]
    pub turn: f32,
    #[serde(default)]
    pub forward: f32,
    #[serde(default)]
    pub strafe: f32,
    /// Style channel held during the segment; none means idle.
    #[serde(default)]
    pub style: Option<usize>,
    #[serde(default)]
    pub modifiers: Vec<usize>,
}

impl ScriptSegment {
    pub fn idle(ticks: u64) -> Self {
        Self {
            ticks,
            turn: 0.0,
            forward: 0.0,
            strafe: 0.0,
            style: None,
            modifiers: Vec::new(),
        }
    }
}

fn default_script() -> Vec<ScriptSegment> {
    let walk = ScriptSegment {
        ticks: 180,
        forward: 1.0,
        style: Some(1),
        ..ScriptSegment::idle(0)
    };
    vec![
        ScriptSegment::idle(60),
        walk.clone(),
        ScriptSegment {
            ticks: 120,
            turn: 0.5,
            ..walk.clone()
        },
        ScriptSegment {
            ticks: 120,
            modifiers: vec![0],
            ..walk
        },
        ScriptSegment::idle(120),
    ]
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.animator.validate()?;
        if self.run.tick_hz.is_nan() || self.run.tick_hz <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick rate must be positive, got {}",
                self.run.tick_hz
            )));
        }
        let styles = self.animator.style_count();
        for (i, segment) in self.script.iter().enumerate() {
            if let Some(style) = segment.style.filter(|&s| s >= styles) {
                return Err(ConfigError::Invalid(format!(
                    "script segment {i} holds style {style}, only {styles} configured"
                )));
            }
        }
        Ok(())
    }
}

pub fn load(path: &Path) -> Result<ClientConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse(&contents)
}

pub fn parse(contents: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}
