//! Packed 32-bit colors
//!
//! Byte layout is `0xAABBGGRR`: alpha in the most significant byte, red in the
//! least significant one.

use nalgebra::Vector4;

/// A color packed as `0xAABBGGRR`
pub type PackedColor = u32;

/// Alpha byte of a fully opaque packed color
pub const OPAQUE: PackedColor = 0xff00_0000;

/// Clamp each channel of a floating color to [0, 1]
pub fn clamp(color: Vector4<f32>) -> Vector4<f32> {
    color.map(|c| c.clamp(0.0, 1.0))
}

/// Pack a floating RGBA color in [0, 1] into `0xAABBGGRR`.
///
/// Each channel is scaled by 255 and truncated. Callers clamp first.
pub fn pack_rgba(color: Vector4<f32>) -> PackedColor {
    let r = (color.x * 255.0) as u8;
    let g = (color.y * 255.0) as u8;
    let b = (color.z * 255.0) as u8;
    let a = (color.w * 255.0) as u8;
    (a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32
}

/// Split a packed color into its `(r, g, b)` bytes, ignoring alpha
pub fn unpack_rgb(color: PackedColor) -> (u8, u8, u8) {
    let r = (color & 0xff) as u8;
    let g = ((color >> 8) & 0xff) as u8;
    let b = ((color >> 16) & 0xff) as u8;
    (r, g, b)
}

/// Convert RGB (0-255) to 256-color palette index
pub fn rgb_to_256color(r: u8, g: u8, b: u8) -> u8 {
    // 6x6x6 color cube (colors 16-231)
    let r6 = (r as u16 * 6 / 256) as u8;
    let g6 = (g as u16 * 6 / 256) as u8;
    let b6 = (b as u16 * 6 / 256) as u8;
    16 + 36 * r6 + 6 * g6 + b6
}
