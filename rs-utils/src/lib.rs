use bevy::prelude::{Mat3, Quat, Vec3};

pub mod terrain;
pub use terrain::{FlatGround, RollingHills, SlopedGround, Terrain, TerrainSettings};

/// Gain curve that maps `[0, 1]` onto `[0, 1]` along `(2^x - 1)`.
///
/// Inputs are clamped first, so anything at or above 1.0 passes through with
/// full gain and anything at or below 0.0 is suppressed.
pub fn exponential01(value: f32) -> f32 {
    let basis = 2.0f32;
    (basis.powf(value.clamp(0.0, 1.0)) - 1.0) / (basis - 1.0)
}

/// Linear blend with the amount clamped to `[0, 1]`.
#[inline]
pub fn interpolate(from: f32, to: f32, amount: f32) -> f32 {
    let amount = amount.clamp(0.0, 1.0);
    from * (1.0 - amount) + to * amount
}

#[inline]
pub fn interpolate_vec3(from: Vec3, to: Vec3, amount: f32) -> Vec3 {
    from.lerp(to, amount.clamp(0.0, 1.0))
}

/// Drops the vertical component.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Normalises `v`, returning `fallback` when `v` is too short to carry a direction.
#[inline]
pub fn safe_normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(fallback)
}

/// Unit direction on the ground plane. Falls back to `fallback` (itself
/// flattened) and finally to +Z so the result is always usable as a heading.
pub fn ground_direction(v: Vec3, fallback: Vec3) -> Vec3 {
    flatten(v)
        .try_normalize()
        .or_else(|| flatten(fallback).try_normalize())
        .unwrap_or(Vec3::Z)
}

/// Rotation whose local +Z looks along `forward` with local +Y as close to
/// `up` as the forward axis allows.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(z) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };
    let Some(x) = up.cross(z).try_normalize() else {
        // forward is parallel to up
        return Quat::from_rotation_arc(Vec3::Z, z);
    };
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

/// Rotation about +Y that turns +Z onto the ground heading of `direction`.
#[inline]
pub fn yaw_rotation(direction: Vec3) -> Quat {
    let d = ground_direction(direction, Vec3::Z);
    Quat::from_rotation_y(d.x.atan2(d.z))
}
