//! Displayable image surface
//!
//! The rendering core only needs four things from whatever ends up on screen:
//! its size, a way to resize it, and a way to hand it a finished frame.

use crate::color::PackedColor;

/// A presentable image the frame buffer is published to
pub trait ImageSurface {
    /// Create a surface of the given size
    fn with_size(width: u32, height: u32) -> Self
    where
        Self: Sized;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Change the surface dimensions; previous contents are discarded
    fn resize(&mut self, width: u32, height: u32);

    /// Replace the surface contents with a full frame of packed pixels
    fn set_data(&mut self, pixels: &[PackedColor]);
}

/// In-memory RGBA image holding the last published frame
#[derive(Debug, Clone, Default)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<PackedColor>,
    generation: u64,
}

impl Image {
    /// Pixels from the last `set_data` call, row-major
    pub fn data(&self) -> &[PackedColor] {
        &self.data
    }

    /// Number of frames published to this image
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<PackedColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((x + y * self.width) as usize).copied()
    }
}

impl ImageSurface for Image {
    fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
            generation: 0,
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data = vec![0; width as usize * height as usize];
    }

    fn set_data(&mut self, pixels: &[PackedColor]) {
        debug_assert_eq!(
            pixels.len(),
            self.width as usize * self.height as usize,
            "Frame size doesn't match image dimensions"
        );
        self.data.clear();
        self.data.extend_from_slice(pixels);
        self.generation += 1;
    }
}
