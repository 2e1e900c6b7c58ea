use glam::{Mat4, Vec3};

/// Orbit parameters of an arcball camera.
///
/// Angles are in radians. `rotation_angle` is the azimuth around the world Y
/// axis, `inclination_angle` the elevation; negative inclinations place the
/// camera above the target looking down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub radius: f32,
    pub inclination_angle: f32,
    pub rotation_angle: f32,
    pub target: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            radius: 0.5,
            inclination_angle: -std::f32::consts::FRAC_PI_6,
            rotation_angle: 0.0,
            target: Vec3::ZERO,
        }
    }
}

/// Renderer-facing transform derived from a [`CameraPose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// World to view matrix (right handed).
    pub view: Mat4,
}

/// Axis aligned bounds of a loaded model, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of a cube of the given half extent centred on the origin.
    pub fn cube(half_extent: f32) -> Self {
        Self::new(Vec3::splat(-half_extent), Vec3::splat(half_extent))
    }
}

/// Camera that orbits a target point.
///
/// Setters do not validate: the camera is driven by external logic (user
/// interaction or a capture session) which owns the valid ranges. Only one of
/// those writers is expected to be active at a time.
#[derive(Debug, Clone, Default)]
pub struct ArcballCamera {
    pose: CameraPose,
}

impl ArcballCamera {
    pub fn new(pose: CameraPose) -> Self {
        Self { pose }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn radius(&self) -> f32 {
        self.pose.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.pose.radius = radius;
    }

    pub fn inclination_angle(&self) -> f32 {
        self.pose.inclination_angle
    }

    pub fn set_inclination_angle(&mut self, angle: f32) {
        self.pose.inclination_angle = angle;
    }

    pub fn rotation_angle(&self) -> f32 {
        self.pose.rotation_angle
    }

    pub fn set_rotation_angle(&mut self, angle: f32) {
        self.pose.rotation_angle = angle;
    }

    pub fn target(&self) -> Vec3 {
        self.pose.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.pose.target = target;
    }

    /// Rotation angle wrapped into `[0, 2π)` for display.
    pub fn normalized_rotation(&self) -> f32 {
        self.pose.rotation_angle.rem_euclid(std::f32::consts::TAU)
    }

    /// Sets the radius so the whole model stays in view: twice the largest
    /// positive bound coordinate. Bounds that would give a non-positive
    /// radius are ignored.
    pub fn fit_to_bounds(&mut self, bounds: &Aabb) -> bool {
        let max_distance = bounds.max.max_element();
        let radius = max_distance * 2.0;
        if radius > 0.0 && radius.is_finite() {
            tracing::debug!(radius, ?bounds, "fitting camera radius to model bounds");
            self.pose.radius = radius;
            true
        } else {
            tracing::warn!(?bounds, "ignoring model bounds that yield a non-positive radius");
            false
        }
    }

    /// Derives the eye position and view matrix from the current parameters.
    pub fn compute_pose(&self) -> CameraTransform {
        let CameraPose {
            radius,
            inclination_angle,
            rotation_angle,
            target,
        } = self.pose;

        let (sin_rot, cos_rot) = rotation_angle.sin_cos();
        let (sin_inc, cos_inc) = inclination_angle.sin_cos();
        let offset = Vec3::new(cos_inc * sin_rot, -sin_inc, cos_inc * cos_rot) * radius;
        let eye = target + offset;

        // Looking straight up or down makes world Y parallel to the view
        // direction; fall back to the horizontal heading.
        let up = if cos_inc.abs() < 1e-6 {
            Vec3::new(-sin_rot, 0.0, -cos_rot) * (-sin_inc).signum()
        } else {
            Vec3::Y
        };

        CameraTransform {
            eye,
            target,
            up,
            view: Mat4::look_at_rh(eye, target, up),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    use super::*;

    fn level_camera(rotation: f32) -> ArcballCamera {
        ArcballCamera::new(CameraPose {
            radius: 2.0,
            inclination_angle: 0.0,
            rotation_angle: rotation,
            target: Vec3::ZERO,
        })
    }

    #[test]
    fn eye_orbits_around_target() {
        let front = level_camera(0.0).compute_pose();
        assert!(front.eye.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));

        let side = level_camera(FRAC_PI_2).compute_pose();
        assert!(side.eye.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));

        let back = level_camera(PI).compute_pose();
        assert!(back.eye.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn negative_inclination_raises_the_eye() {
        let camera = ArcballCamera::default();
        let transform = camera.compute_pose();
        assert!(transform.eye.y > 0.0);
        assert!((transform.eye.length() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn view_matrix_maps_target_in_front_of_camera() {
        let mut camera = level_camera(1.0);
        camera.set_target(Vec3::new(1.0, 2.0, 3.0));
        let transform = camera.compute_pose();

        let target_in_view = transform.view.transform_point3(camera.target());
        assert!(target_in_view.z < 0.0);
        assert!((target_in_view.z + 2.0).abs() < 1e-4);
    }

    #[test]
    fn pose_is_finite_when_looking_straight_down() {
        let mut camera = level_camera(0.3);
        camera.set_inclination_angle(-FRAC_PI_2);
        let transform = camera.compute_pose();

        assert!(transform.view.is_finite());
        assert!(transform.eye.y > 1.99);
    }

    #[test]
    fn compute_pose_has_no_side_effects() {
        let camera = ArcballCamera::default();
        let before = camera.pose();
        let _ = camera.compute_pose();
        assert_eq!(camera.pose(), before);
    }

    #[test]
    fn normalized_rotation_wraps_accumulated_angles() {
        let camera = level_camera(TAU + 0.25);
        assert!((camera.normalized_rotation() - 0.25).abs() < 1e-5);

        let camera = level_camera(-0.25);
        assert!((camera.normalized_rotation() - (TAU - 0.25)).abs() < 1e-5);
    }

    #[test]
    fn fits_radius_to_bounds() {
        let mut camera = ArcballCamera::default();
        let bounds = Aabb::new(Vec3::new(-1.0, -0.5, -3.0), Vec3::new(0.5, 1.5, 0.25));

        assert!(camera.fit_to_bounds(&bounds));
        assert_eq!(camera.radius(), 3.0);
    }

    #[test]
    fn ignores_bounds_with_non_positive_extent() {
        let mut camera = ArcballCamera::default();
        let bounds = Aabb::new(Vec3::splat(-2.0), Vec3::splat(-1.0));

        assert!(!camera.fit_to_bounds(&bounds));
        assert_eq!(camera.radius(), 0.5);
    }
}
