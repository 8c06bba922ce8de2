//! Errors raised by the rendering core

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid image dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("No image allocated: resize must be called before rendering")]
    NoImage,
}
