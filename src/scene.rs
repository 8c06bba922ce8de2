//! Scene definition: one sphere at the origin, seen from a fixed camera

use nalgebra::{Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::color::PackedColor;

/// Radius of the sphere centered at the world origin
pub const SPHERE_RADIUS: f32 = 0.5;

/// Distance of the camera from the origin along +Z
pub const CAMERA_Z: f32 = 1.0;

/// Flat hit color for the binary mode (opaque magenta)
pub const BINARY_HIT: PackedColor = 0xffff00ff;

/// Background for the binary mode (opaque white)
pub const BINARY_MISS: PackedColor = 0xffffffff;

/// How each pixel is colored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ShadingMode {
    /// Random opaque color per pixel, no geometry
    Noise,
    /// Flat color where the ray hits the sphere
    BinaryHit,
    /// Lambertian diffuse lighting from a directional light
    #[default]
    Shaded,
}

impl ShadingMode {
    /// Cycle to the next mode
    pub fn next(self) -> Self {
        match self {
            ShadingMode::Noise => ShadingMode::BinaryHit,
            ShadingMode::BinaryHit => ShadingMode::Shaded,
            ShadingMode::Shaded => ShadingMode::Noise,
        }
    }
}

impl std::fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShadingMode::Noise => write!(f, "noise"),
            ShadingMode::BinaryHit => write!(f, "binary_hit"),
            ShadingMode::Shaded => write!(f, "shaded"),
        }
    }
}

/// Immutable scene constants handed to the shading function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scene {
    pub sphere_radius: f32,
    pub camera_origin: Point3<f32>,
    /// Unit vector pointing towards the light
    pub light_direction: Vector3<f32>,
    pub albedo: Vector3<f32>,
    /// Background for the shaded mode
    pub background: Vector4<f32>,
    pub binary_hit: PackedColor,
    pub binary_miss: PackedColor,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(
            SPHERE_RADIUS,
            CAMERA_Z,
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
        )
    }
}

impl Scene {
    /// Build a scene; `light_direction` is normalized here.
    pub fn new(
        sphere_radius: f32,
        camera_z: f32,
        light_direction: Vector3<f32>,
        albedo: Vector3<f32>,
    ) -> Self {
        Self {
            sphere_radius,
            camera_origin: Point3::new(0.0, 0.0, camera_z),
            light_direction: light_direction.normalize(),
            albedo,
            background: Vector4::new(0.0, 0.0, 0.0, 1.0),
            binary_hit: BINARY_HIT,
            binary_miss: BINARY_MISS,
        }
    }
}
