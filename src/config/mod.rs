mod loader;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use loader::load_config;

use crate::scene::{Scene, ShadingMode, CAMERA_Z, SPHERE_RADIUS};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Renderer options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub mode: ShadingMode,
    /// Shade rows in parallel
    #[serde(default)]
    pub parallel: bool,
    /// Seed for the noise mode
    #[serde(default)]
    pub seed: u64,
    /// Image width for headless frames
    #[serde(default = "default_width")]
    pub width: u32,
    /// Image height for headless frames
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    80
}

fn default_height() -> u32 {
    48
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: ShadingMode::default(),
            parallel: false,
            seed: 0,
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Scene constants
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneConfig {
    #[serde(default = "default_sphere_radius")]
    pub sphere_radius: f32,
    /// Camera distance along +Z
    #[serde(default = "default_camera_z")]
    pub camera_z: f32,
    /// Direction towards the light; normalized when the scene is built
    #[serde(default = "default_light_direction")]
    pub light_direction: [f32; 3],
    #[serde(default = "default_albedo")]
    pub albedo: [f32; 3],
}

fn default_sphere_radius() -> f32 {
    SPHERE_RADIUS
}

fn default_camera_z() -> f32 {
    CAMERA_Z
}

fn default_light_direction() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_albedo() -> [f32; 3] {
    [1.0, 0.0, 1.0]
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sphere_radius: default_sphere_radius(),
            camera_z: default_camera_z(),
            light_direction: default_light_direction(),
            albedo: default_albedo(),
        }
    }
}

/// Interactive display options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Minimum time between rendered frames
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

fn default_frame_interval() -> u64 {
    100
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults.
    ///
    /// An explicit path must exist. Without one, `config.yaml` in the working
    /// directory is used if present, built-in defaults otherwise.
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new("config.yaml");
                if path.exists() {
                    return Self::from_file(path);
                }
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scene = &self.scene;
        if !(scene.sphere_radius > 0.0) || !scene.sphere_radius.is_finite() {
            return Err(ConfigError::Validation(format!(
                "scene.sphere_radius must be positive, got {}",
                scene.sphere_radius
            )));
        }
        if !scene.camera_z.is_finite() {
            return Err(ConfigError::Validation(format!(
                "scene.camera_z must be finite, got {}",
                scene.camera_z
            )));
        }
        let light = Vector3::from(scene.light_direction);
        if !(light.magnitude() > 0.0) || !light.magnitude().is_finite() {
            return Err(ConfigError::Validation(
                "scene.light_direction must be a non-zero finite vector".to_string(),
            ));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::Validation(format!(
                "render.width and render.height must be positive, got {}x{}",
                self.render.width, self.render.height
            )));
        }
        Ok(())
    }

    /// Build the scene described by this configuration
    pub fn scene(&self) -> Scene {
        Scene::new(
            self.scene.sphere_radius,
            self.scene.camera_z,
            Vector3::from(self.scene.light_direction),
            Vector3::from(self.scene.albedo),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
