//! CPU ray caster
//!
//! For every pixel a ray is cast from the camera through the pixel's
//! normalized device coordinate and tested against the sphere at the origin.

use std::time::Instant;

use nalgebra::{Point3, Vector2, Vector3, Vector4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::buffer::ImageBuffer;
use crate::color::{self, PackedColor, OPAQUE};
use crate::error::RenderError;
use crate::image::{Image, ImageSurface};
use crate::scene::{Scene, ShadingMode};

/// A ray in 3D space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Both roots of the ray/sphere quadratic, `t_near <= t_far`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub t_near: f32,
    pub t_far: f32,
}

/// Intersect a ray with a sphere of `radius` centered at the origin.
///
/// The direction does not need to be normalized. A tangent ray
/// (discriminant of zero) counts as a hit with `t_near == t_far`.
pub fn intersect_sphere(ray: &Ray, radius: f32) -> Option<Intersection> {
    let origin = ray.origin.coords;

    // a*t^2 + b*t + c = 0
    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * origin.dot(&ray.direction);
    let c = origin.dot(&origin) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    // NaN falls through to a miss as well
    if !(discriminant >= 0.0) {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    // a >= 0, so subtracting the root gives the closer hit
    Some(Intersection {
        t_near: (-b - sqrt_d) / (2.0 * a),
        t_far: (-b + sqrt_d) / (2.0 * a),
    })
}

/// Map a pixel to [-1, 1] on both axes, with x scaled by the aspect ratio.
///
/// `width` and `height` must be non-zero; the buffer manager guarantees it.
pub fn normalized_coord(x: u32, y: u32, width: u32, height: u32) -> Vector2<f32> {
    let aspect_ratio = width as f32 / height as f32;
    let mut coord = Vector2::new(x as f32 / width as f32, y as f32 / height as f32);
    coord = coord * 2.0 - Vector2::new(1.0, 1.0);
    coord.x *= aspect_ratio;
    coord
}

/// Primary ray through a normalized device coordinate
pub fn primary_ray(coord: Vector2<f32>, scene: &Scene) -> Ray {
    Ray::new(scene.camera_origin, Vector3::new(coord.x, coord.y, -1.0))
}

/// Lambertian shading of the sphere; returns an unclamped RGBA color
pub fn shade(coord: Vector2<f32>, scene: &Scene) -> Vector4<f32> {
    let ray = primary_ray(coord, scene);
    let Some(hit) = intersect_sphere(&ray, scene.sphere_radius) else {
        return scene.background;
    };

    // Sphere sits at the origin, so the hit point is along the normal
    let hit_point = ray.at(hit.t_near);
    let normal = hit_point.coords.normalize();
    let diffuse = normal.dot(&scene.light_direction).max(0.0);

    let color = scene.albedo * diffuse;
    Vector4::new(color.x, color.y, color.z, 1.0)
}

/// Color a single pixel in the given mode.
///
/// `noise` is only called in [`ShadingMode::Noise`].
pub fn per_pixel(
    coord: Vector2<f32>,
    scene: &Scene,
    mode: ShadingMode,
    noise: impl FnOnce() -> u32,
) -> PackedColor {
    match mode {
        ShadingMode::Noise => noise() | OPAQUE,
        ShadingMode::BinaryHit => {
            let ray = primary_ray(coord, scene);
            match intersect_sphere(&ray, scene.sphere_radius) {
                Some(_) => scene.binary_hit,
                None => scene.binary_miss,
            }
        }
        ShadingMode::Shaded => color::pack_rgba(color::clamp(shade(coord, scene))),
    }
}

/// splitmix64 finalizer
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Per-pixel RNG, independent of iteration order.
///
/// Each input goes through its own mixing round so that nearby seeds, frames
/// and indices land on unrelated streams.
fn pixel_rng(seed: u64, frame: u64, index: u64) -> SmallRng {
    SmallRng::seed_from_u64(mix64(mix64(mix64(seed) ^ frame) ^ index))
}

/// Everything a row needs to shade itself, copied out of the renderer
#[derive(Debug, Clone, Copy)]
struct FrameContext {
    width: u32,
    height: u32,
    scene: Scene,
    mode: ShadingMode,
    seed: u64,
    frame: u64,
}

impl FrameContext {
    fn render_row(&self, y: u32, row: &mut [PackedColor]) {
        for (x, pixel) in row.iter_mut().enumerate() {
            let x = x as u32;
            let coord = normalized_coord(x, y, self.width, self.height);
            let index = x as u64 + y as u64 * self.width as u64;
            *pixel = per_pixel(coord, &self.scene, self.mode, || {
                pixel_rng(self.seed, self.frame, index).random()
            });
        }
    }
}

/// Drives the per-pixel shading over the frame buffer
#[derive(Debug)]
pub struct Renderer<S: ImageSurface = Image> {
    buffer: ImageBuffer<S>,
    scene: Scene,
    mode: ShadingMode,
    parallel: bool,
    seed: u64,
    frame: u64,
}

impl Renderer<Image> {
    pub fn new(scene: Scene, mode: ShadingMode) -> Self {
        Self::with_surface(scene, mode)
    }
}

impl<S: ImageSurface> Renderer<S> {
    /// Create a renderer presenting through surface type `S`
    pub fn with_surface(scene: Scene, mode: ShadingMode) -> Self {
        Self {
            buffer: ImageBuffer::new(),
            scene,
            mode,
            parallel: false,
            seed: 0,
            frame: 0,
        }
    }

    /// Shade rows on the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Seed for the noise mode
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, RenderError> {
        self.buffer.resize(width, height)
    }

    /// Render a full frame and publish it to the image
    pub fn render(&mut self) -> Result<(), RenderError> {
        if !self.buffer.is_allocated() {
            return Err(RenderError::NoImage);
        }

        let start = Instant::now();
        let ctx = FrameContext {
            width: self.buffer.width(),
            height: self.buffer.height(),
            scene: self.scene,
            mode: self.mode,
            seed: self.seed,
            frame: self.frame,
        };

        let row_len = ctx.width as usize;
        if self.parallel {
            self.buffer
                .pixels_mut()
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| ctx.render_row(y as u32, row));
        } else {
            for (y, row) in self.buffer.pixels_mut().chunks_mut(row_len).enumerate() {
                ctx.render_row(y as u32, row);
            }
        }

        self.buffer.publish()?;
        self.frame += 1;

        tracing::trace!(
            frame = ctx.frame,
            width = ctx.width,
            height = ctx.height,
            mode = %ctx.mode,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Rendered frame"
        );
        Ok(())
    }

    pub fn mode(&self) -> ShadingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ShadingMode) {
        self.mode = mode;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
    }

    /// Number of frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn buffer(&self) -> &ImageBuffer<S> {
        &self.buffer
    }

    /// The image holding the last published frame
    pub fn image(&self) -> Option<&S> {
        self.buffer.image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHADED_CENTER: PackedColor = 0xff930093;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0));
        assert!((ray.at(5.0).x - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_sphere_intersection() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = intersect_sphere(&ray, 1.0).unwrap();
        assert!((hit.t_near - 2.0).abs() < 0.001);
        assert!((hit.t_far - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sphere_miss() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(intersect_sphere(&ray, 0.5), None);
    }

    #[test]
    fn test_tangent_ray_hits_once() {
        // a = 1, b = -2, c = 1: discriminant is exactly zero
        let ray = Ray::new(Point3::new(0.0, 0.5, 1.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = intersect_sphere(&ray, 0.5).unwrap();
        assert_eq!(hit.t_near, hit.t_far);
        assert_eq!(hit.t_near, 1.0);
    }

    #[test]
    fn test_nan_direction_misses() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(f32::NAN, 0.0, -1.0));
        assert_eq!(intersect_sphere(&ray, 0.5), None);
    }

    #[test]
    fn test_normalized_coord() {
        assert_eq!(normalized_coord(0, 0, 1, 1), Vector2::new(-1.0, -1.0));
        assert_eq!(normalized_coord(1, 1, 2, 2), Vector2::new(0.0, 0.0));
        // Aspect 2:1 stretches x
        assert_eq!(normalized_coord(0, 0, 4, 2), Vector2::new(-2.0, -1.0));
    }

    #[test]
    fn test_shade_center_is_lit() {
        let scene = Scene::default();
        let color = shade(Vector2::zeros(), &scene);
        let expected = 1.0 / 3.0f32.sqrt();
        assert!((color.x - expected).abs() < 1e-5);
        assert_eq!(color.y, 0.0);
        assert!((color.z - expected).abs() < 1e-5);
        assert_eq!(color.w, 1.0);
    }

    #[test]
    fn test_per_pixel_modes() {
        let scene = Scene::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let center = Vector2::zeros();
        let corner = Vector2::new(-1.0, -1.0);

        assert_eq!(per_pixel(center, &scene, ShadingMode::Shaded, || rng.random()), SHADED_CENTER);
        assert_eq!(per_pixel(corner, &scene, ShadingMode::Shaded, || rng.random()), 0xff000000);
        assert_eq!(per_pixel(center, &scene, ShadingMode::BinaryHit, || rng.random()), 0xffff00ff);
        assert_eq!(per_pixel(corner, &scene, ShadingMode::BinaryHit, || rng.random()), 0xffffffff);
    }

    #[test]
    fn test_geometry_modes_skip_noise_source() {
        let scene = Scene::default();
        for mode in [ShadingMode::BinaryHit, ShadingMode::Shaded] {
            for coord in [Vector2::zeros(), Vector2::new(-1.0, -1.0)] {
                per_pixel(coord, &scene, mode, || -> u32 {
                    panic!("noise drawn in {} mode", mode)
                });
            }
        }
    }

    #[test]
    fn test_noise_is_opaque() {
        let scene = Scene::default();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..64 {
            let c = per_pixel(Vector2::zeros(), &scene, ShadingMode::Noise, || rng.random());
            assert_eq!(c >> 24, 0xff);
        }
    }

    #[test]
    fn test_render_requires_resize() {
        let mut renderer = Renderer::new(Scene::default(), ShadingMode::Shaded);
        assert_eq!(renderer.render(), Err(RenderError::NoImage));
    }

    #[test]
    fn test_render_publishes_frame() {
        let mut renderer = Renderer::new(Scene::default(), ShadingMode::Shaded);
        renderer.resize(2, 2).unwrap();
        renderer.render().unwrap();

        let image = renderer.image().unwrap();
        assert_eq!(image.generation(), 1);
        assert_eq!(image.pixel(1, 1), Some(SHADED_CENTER));
        assert_eq!(image.pixel(0, 0), Some(0xff000000));
        assert_eq!(renderer.frame_count(), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        for mode in [ShadingMode::Noise, ShadingMode::BinaryHit, ShadingMode::Shaded] {
            let mut sequential = Renderer::new(Scene::default(), mode).with_seed(42);
            let mut parallel = Renderer::new(Scene::default(), mode)
                .with_seed(42)
                .with_parallel(true);
            sequential.resize(37, 23).unwrap();
            parallel.resize(37, 23).unwrap();
            sequential.render().unwrap();
            parallel.render().unwrap();

            assert_eq!(
                sequential.image().unwrap().data(),
                parallel.image().unwrap().data()
            );
        }
    }

    #[test]
    fn test_noise_reproducible_and_animated() {
        let mut a = Renderer::new(Scene::default(), ShadingMode::Noise).with_seed(3);
        let mut b = Renderer::new(Scene::default(), ShadingMode::Noise).with_seed(3);
        a.resize(8, 8).unwrap();
        b.resize(8, 8).unwrap();

        a.render().unwrap();
        b.render().unwrap();
        let first = a.image().unwrap().data().to_vec();
        assert_eq!(first, b.image().unwrap().data());

        a.render().unwrap();
        assert_ne!(first, a.image().unwrap().data());
    }

    fn noise_frame(seed: u64, frames: u64) -> Vec<PackedColor> {
        let mut renderer = Renderer::new(Scene::default(), ShadingMode::Noise).with_seed(seed);
        renderer.resize(8, 8).unwrap();
        for _ in 0..=frames {
            renderer.render().unwrap();
        }
        renderer.image().unwrap().data().to_vec()
    }

    fn sorted(mut pixels: Vec<PackedColor>) -> Vec<PackedColor> {
        pixels.sort_unstable();
        pixels
    }

    #[test]
    fn test_neighboring_seeds_give_unrelated_noise() {
        let seed0 = noise_frame(0, 0);
        let seed1 = noise_frame(1, 0);
        // Not just the same values shuffled between pixels
        assert_ne!(sorted(seed0.clone()), sorted(seed1));

        // A seed must not alias another seed's later frame
        let seed0_frame1 = noise_frame(0, 1);
        let shifted = noise_frame(1 << 32, 0);
        assert_ne!(sorted(seed0_frame1), sorted(shifted));
        assert_ne!(sorted(seed0), sorted(noise_frame(0, 1)));
    }

    #[test]
    fn test_pixel_rng_streams_differ() {
        let first = |seed, frame, index| pixel_rng(seed, frame, index).random::<u64>();
        assert_ne!(first(0, 0, 0), first(0, 0, 1));
        assert_ne!(first(0, 0, 1), first(1, 0, 0));
        assert_ne!(first(0, 1, 0), first(1 << 32, 0, 0));
        assert_eq!(first(5, 6, 7), first(5, 6, 7));
    }

    /// Surface that records what it was handed on every publish
    struct RecordingSurface {
        width: u32,
        height: u32,
        published: Vec<Vec<PackedColor>>,
    }

    impl ImageSurface for RecordingSurface {
        fn with_size(width: u32, height: u32) -> Self {
            Self { width, height, published: Vec::new() }
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
        }

        fn set_data(&mut self, pixels: &[PackedColor]) {
            self.published.push(pixels.to_vec());
        }
    }

    #[test]
    fn test_publish_sees_complete_frame() {
        let mut renderer: Renderer<RecordingSurface> =
            Renderer::with_surface(Scene::default(), ShadingMode::Noise).with_parallel(true);
        renderer.resize(16, 9).unwrap();
        renderer.render().unwrap();

        let surface = renderer.image().unwrap();
        assert_eq!(surface.published.len(), 1);
        // Zero-filled pixels would mean a partially written frame
        assert!(surface.published[0].iter().all(|&p| p >> 24 == 0xff));
        assert_eq!(surface.published[0].len(), 16 * 9);
    }
}
