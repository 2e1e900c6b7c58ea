use futures::future::{self, BoxFuture, FutureExt};
use glam::{Mat4, Vec3};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::{camera::CameraTransform, Aabb, Result};

/// Pending result of a snapshot request.
pub type SnapshotFuture = BoxFuture<'static, Result<DynamicImage>>;

/// Boundary to the rendering backend.
///
/// The capture pipeline only moves the camera and asks for pictures; it owns
/// no rendering logic. Snapshots complete asynchronously and may resolve in
/// any order. A failed or empty snapshot resolves to an error.
pub trait Renderer {
    fn apply_pose(&mut self, pose: &CameraTransform);

    fn request_snapshot(&mut self, high_dynamic_range: bool) -> SnapshotFuture;
}

const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// CPU renderer that draws the wireframe of a model's bounding box.
///
/// Stands in for a real engine in the command line tool so an orbit can be
/// captured end-to-end without a GPU.
#[derive(Debug, Clone)]
pub struct WireframeRenderer {
    width: u32,
    height: u32,
    bounds: Aabb,
    view: Mat4,
    background: Rgba<u8>,
    stroke: Rgba<u8>,
}

impl WireframeRenderer {
    pub fn new(width: u32, height: u32, bounds: Aabb) -> Self {
        Self {
            width,
            height,
            bounds,
            view: Mat4::IDENTITY,
            background: Rgba([24, 24, 28, 255]),
            stroke: Rgba([235, 200, 90, 255]),
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn corners(&self) -> [Vec3; 8] {
        let Aabb { min, max } = self.bounds;
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
    }

    /// Rasterizes the current view.
    pub fn render(&self, high_dynamic_range: bool) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(self.width, self.height, self.background);
        if self.width == 0 || self.height == 0 {
            return image;
        }

        let aspect = self.width as f32 / self.height as f32;
        let projection = Mat4::perspective_rh(45_f32.to_radians(), aspect, 0.01, 100.0);
        let clip_from_world = projection * self.view;

        let projected = self.corners().map(|corner| {
            let clip = clip_from_world * corner.extend(1.0);
            if clip.w <= 0.0 {
                return None;
            }
            let ndc = clip.truncate() / clip.w;
            Some((
                (ndc.x + 1.0) * 0.5 * self.width as f32,
                (1.0 - ndc.y) * 0.5 * self.height as f32,
            ))
        });

        let stroke = if high_dynamic_range {
            Rgba([255, 255, 255, 255])
        } else {
            self.stroke
        };
        for (a, b) in CUBE_EDGES {
            if let (Some(from), Some(to)) = (projected[a], projected[b]) {
                draw_line(&mut image, from, to, stroke);
            }
        }
        image
    }
}

impl Renderer for WireframeRenderer {
    fn apply_pose(&mut self, pose: &CameraTransform) {
        self.view = pose.view;
    }

    fn request_snapshot(&mut self, high_dynamic_range: bool) -> SnapshotFuture {
        let image = DynamicImage::ImageRgba8(self.render(high_dynamic_range));
        future::ready(Ok(image)).boxed()
    }
}

fn draw_line(image: &mut RgbaImage, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().min(4096.0) as u32;
    for i in 0..=steps {
        let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
        let (x, y) = (from.0 + dx * t, from.1 + dy * t);
        if x >= 0.0 && y >= 0.0 && (x as u32) < image.width() && (y as u32) < image.height() {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::ArcballCamera;

    fn stroked_pixels(image: &RgbaImage, background: Rgba<u8>) -> usize {
        image.pixels().filter(|pixel| **pixel != background).count()
    }

    #[test]
    fn draws_model_in_view() {
        let mut renderer = WireframeRenderer::new(64, 48, Aabb::cube(0.5));
        let mut camera = ArcballCamera::default();
        camera.fit_to_bounds(&renderer.bounds());
        renderer.apply_pose(&camera.compute_pose());

        let image = renderer.render(false);
        assert_eq!(image.dimensions(), (64, 48));
        assert!(stroked_pixels(&image, renderer.background) > 0);
    }

    #[test]
    fn different_poses_give_different_snapshots() {
        let mut renderer = WireframeRenderer::new(32, 32, Aabb::cube(0.5));
        let mut camera = ArcballCamera::default();
        camera.set_radius(2.0);

        renderer.apply_pose(&camera.compute_pose());
        let first = block_on(renderer.request_snapshot(false)).unwrap();
        camera.set_rotation_angle(0.4);
        renderer.apply_pose(&camera.compute_pose());
        let second = block_on(renderer.request_snapshot(false)).unwrap();

        assert_ne!(first.to_rgba8().into_raw(), second.to_rgba8().into_raw());
    }

    #[test]
    fn empty_viewport_renders_nothing() {
        let renderer = WireframeRenderer::new(0, 0, Aabb::cube(1.0));
        assert_eq!(renderer.render(false).dimensions(), (0, 0));
    }
}
