use bevy::prelude::{Quat, Vec3};
use rs_utils::{interpolate, interpolate_vec3, look_rotation};

use crate::config::{AnimatorConfig, StyleConfig};
use crate::trajectory::Trajectory;

/// Degrees of heading change requested by a full turn input.
const TURN_ANGLE: f32 = 60.0;

/// User intent for one tick, polled by whatever owns the input devices.
#[derive(Clone, Debug, Default)]
pub struct SteeringInput {
    /// -1.0 (left) to 1.0 (right).
    pub turn: f32,
    /// Move intent in the character's local frame (+Z forward, +X right).
    pub movement: Vec3,
    /// One flag per style channel.
    pub active_styles: Vec<bool>,
    /// Held speed modifiers, indexed by [`crate::config::SpeedMultiplier::modifier`].
    pub modifiers: Vec<bool>,
}

impl SteeringInput {
    pub fn style_active(&self, style: usize) -> bool {
        self.active_styles.get(style).copied().unwrap_or(false)
    }

    pub fn modifier_held(&self, modifier: usize) -> bool {
        self.modifiers.get(modifier).copied().unwrap_or(false)
    }

    pub fn any_style(&self) -> bool {
        self.active_styles.iter().any(|&a| a)
    }
}

/// Speed bias of the current style mix. Each style's base bias is capped by
/// the largest scaled bias among its held multipliers.
pub fn pooled_bias(styles: &[StyleConfig], weights: &[f32], input: &SteeringInput) -> f32 {
    styles
        .iter()
        .zip(weights)
        .map(|(style, weight)| {
            let held = || {
                style
                    .multipliers
                    .iter()
                    .filter(|m| input.modifier_held(m.modifier))
            };
            let max = held().fold(0.0f32, |max, m| max.max(style.bias * m.value));
            let bias = held().fold(style.bias, |bias, m| max.min(bias * m.value));
            weight * bias
        })
        .sum()
}

/// Smoothed steering targets handed to trajectory prediction.
#[derive(Clone, Debug)]
pub struct SteeringState {
    target_direction: Vec3,
    target_velocity: Vec3,
    bias: f32,
    trajectory_correction: f32,
}

impl SteeringState {
    pub fn new(direction: Vec3, trajectory_correction: f32) -> Self {
        Self {
            target_direction: rs_utils::ground_direction(direction, Vec3::Z),
            target_velocity: Vec3::ZERO,
            bias: 0.0,
            trajectory_correction,
        }
    }

    pub fn target_direction(&self) -> Vec3 {
        self.target_direction
    }

    pub fn set_target_direction(&mut self, direction: Vec3) {
        self.target_direction = direction;
    }

    pub fn target_velocity(&self) -> Vec3 {
        self.target_velocity
    }

    pub fn set_target_velocity(&mut self, velocity: Vec3) {
        self.target_velocity = velocity;
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn trajectory_correction(&self) -> f32 {
        self.trajectory_correction
    }

    /// Blends every target one step toward `input` and updates the root
    /// style weights of `trajectory`.
    pub fn update(&mut self, config: &AnimatorConfig, input: &SteeringInput, trajectory: &mut Trajectory) {
        let blending = config.target_blending;
        let root_direction = trajectory.root().direction();

        let turned = Quat::from_rotation_y((input.turn * TURN_ANGLE).to_radians()) * root_direction;
        self.target_direction = interpolate_vec3(self.target_direction, turned, blending);

        let heading = look_rotation(self.target_direction, Vec3::Y);
        let desired_velocity = (heading * input.movement).normalize_or_zero();
        self.target_velocity = interpolate_vec3(self.target_velocity, desired_velocity, blending);

        let pooled = pooled_bias(&config.styles, &trajectory.root().styles, input);
        self.bias = interpolate(self.bias, pooled, blending);

        let demand = input
            .movement
            .normalize_or_zero()
            .length()
            .max(input.turn.abs());
        self.trajectory_correction = interpolate(self.trajectory_correction, demand, blending);

        let any = input.any_style();
        let transition = config.style_transition;
        for (i, weight) in trajectory.root_mut().styles.iter_mut().enumerate() {
            let target = if input.style_active(i) || (i == 0 && !any) {
                1.0
            } else {
                0.0
            };
            *weight = interpolate(*weight, target, transition);
        }
    }
}
