//! Image buffer manager
//!
//! Owns the packed pixel array the renderer writes into and the displayable
//! image it is published to. Both always share the same dimensions.

use crate::color::PackedColor;
use crate::error::RenderError;
use crate::image::{Image, ImageSurface};

/// Frame buffer plus the image it is presented through
#[derive(Debug)]
pub struct ImageBuffer<S: ImageSurface = Image> {
    image: Option<S>,
    pixels: Vec<PackedColor>,
}

impl<S: ImageSurface> ImageBuffer<S> {
    /// Create an empty manager; nothing is allocated until the first resize
    pub fn new() -> Self {
        Self {
            image: None,
            pixels: Vec::new(),
        }
    }

    /// Match the buffer to `width` x `height`.
    ///
    /// Returns `Ok(true)` when the pixel array was reallocated and `Ok(false)`
    /// when the dimensions were already current. Zero dimensions are rejected
    /// and leave the buffer as it was.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }

        match self.image.as_mut() {
            Some(image) => {
                if image.width() == width && image.height() == height {
                    return Ok(false);
                }
                tracing::debug!(
                    from_width = image.width(),
                    from_height = image.height(),
                    width,
                    height,
                    "Resizing image"
                );
                image.resize(width, height);
            }
            None => {
                tracing::debug!(width, height, "Creating image");
                self.image = Some(S::with_size(width, height));
            }
        }

        // Previous frame contents are discarded, never carried over
        self.pixels = vec![0; width as usize * height as usize];
        Ok(true)
    }

    /// Copy the finished frame into the displayable image
    pub fn publish(&mut self) -> Result<(), RenderError> {
        let image = self.image.as_mut().ok_or(RenderError::NoImage)?;
        image.set_data(&self.pixels);
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.image.as_ref().map_or(0, |image| image.width())
    }

    pub fn height(&self) -> u32 {
        self.image.as_ref().map_or(0, |image| image.height())
    }

    pub fn is_allocated(&self) -> bool {
        self.image.is_some()
    }

    pub fn pixels(&self) -> &[PackedColor] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [PackedColor] {
        &mut self.pixels
    }

    /// The displayable image, once the first resize has happened
    pub fn image(&self) -> Option<&S> {
        self.image.as_ref()
    }
}

impl<S: ImageSurface> Default for ImageBuffer<S> {
    fn default() -> Self {
        Self::new()
    }
}
