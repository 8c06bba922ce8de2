//! Sphere ray caster
//!
//! Casts one ray per pixel from a fixed camera into a scene holding a single
//! sphere at the origin, shades the result and publishes the finished frame
//! to a displayable image.

pub mod buffer;
pub mod color;
pub mod config;
pub mod error;
pub mod image;
pub mod renderer;
pub mod scene;
pub mod terminal;

pub use buffer::ImageBuffer;
pub use config::AppConfig;
pub use error::RenderError;
pub use image::{Image, ImageSurface};
pub use renderer::Renderer;
pub use scene::{Scene, ShadingMode};

/// Smallest renderer dimension the terminal shell will request
pub const MIN_DIMENSION: u32 = 10;
