use bevy::prelude::Vec3;
use serde::{Deserialize, Serialize};

const SLOPE_PROBE: f32 = 0.05;

/// Ground height queries. Implementations are expected to be cheap and
/// synchronous; the animator calls them several times per tick.
pub trait Terrain {
    fn ground_height(&self, position: Vec3) -> f32;

    /// Ground steepness at `position`, 0.0 for level ground and 1.0 for a
    /// vertical wall.
    fn slope(&self, position: Vec3) -> f32 {
        let h = |dx: f32, dz: f32| {
            self.ground_height(Vec3::new(position.x + dx, position.y, position.z + dz))
        };
        let gx = (h(SLOPE_PROBE, 0.0) - h(-SLOPE_PROBE, 0.0)) / (2.0 * SLOPE_PROBE);
        let gz = (h(0.0, SLOPE_PROBE) - h(0.0, -SLOPE_PROBE)) / (2.0 * SLOPE_PROBE);
        let normal = Vec3::new(-gx, 1.0, -gz).normalize();
        normal.angle_between(Vec3::Y).to_degrees() / 90.0
    }
}

impl<T: Terrain + ?Sized> Terrain for &T {
    fn ground_height(&self, position: Vec3) -> f32 {
        (**self).ground_height(position)
    }

    fn slope(&self, position: Vec3) -> f32 {
        (**self).slope(position)
    }
}

impl<T: Terrain + ?Sized> Terrain for Box<T> {
    fn ground_height(&self, position: Vec3) -> f32 {
        (**self).ground_height(position)
    }

    fn slope(&self, position: Vec3) -> f32 {
        (**self).slope(position)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGround {
    pub height: f32,
}

impl Terrain for FlatGround {
    fn ground_height(&self, _position: Vec3) -> f32 {
        self.height
    }

    fn slope(&self, _position: Vec3) -> f32 {
        0.0
    }
}

/// A single inclined plane through `(0, base_height, 0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlopedGround {
    pub base_height: f32,
    /// Height gained per unit along x and z.
    pub gradient_x: f32,
    pub gradient_z: f32,
}

impl Terrain for SlopedGround {
    fn ground_height(&self, position: Vec3) -> f32 {
        self.base_height + self.gradient_x * position.x + self.gradient_z * position.z
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RollingHills {
    pub amplitude: f32,
    pub wavelength: f32,
}

impl Terrain for RollingHills {
    fn ground_height(&self, position: Vec3) -> f32 {
        let k = std::f32::consts::TAU / self.wavelength.max(f32::EPSILON);
        self.amplitude * (position.x * k).sin() * (position.z * k).cos()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainSettings {
    Flat {
        #[serde(default)]
        height: f32,
    },
    Sloped {
        #[serde(default)]
        base_height: f32,
        #[serde(default)]
        gradient_x: f32,
        #[serde(default)]
        gradient_z: f32,
    },
    Hills {
        amplitude: f32,
        wavelength: f32,
    },
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self::Flat { height: 0.0 }
    }
}

impl TerrainSettings {
    pub fn build(&self) -> Box<dyn Terrain + Send + Sync> {
        match *self {
            Self::Flat { height } => Box::new(FlatGround { height }),
            Self::Sloped {
                base_height,
                gradient_x,
                gradient_z,
            } => Box::new(SlopedGround {
                base_height,
                gradient_x,
                gradient_z,
            }),
            Self::Hills {
                amplitude,
                wavelength,
            } => Box::new(RollingHills {
                amplitude,
                wavelength,
            }),
        }
    }
}
