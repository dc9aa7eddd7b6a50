//! # 3D Camera System
//!
//! Perspective camera with an orthonormal heading/right/up basis kept in sync
//! with its look-at. Third-person behaviour is layered on top in
//! [`chase_camera`](super::chase_camera).
//!
//! ## Coordinate System
//! Right-handed, Y-up. The camera looks down its heading; the projection maps
//! depth to `[-1, 1]`.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::physics::{Frustum, Ray};

/// Perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    position: Vec3,

    /// Point the camera is looking at in world space
    target: Vec3,

    /// Unit vector from the position towards the target
    heading: Vec3,

    /// Unit vector pointing to the right of the view
    right: Vec3,

    /// Unit up vector, orthogonal to heading and right
    up: Vec3,

    /// Field of view angle in radians
    fov: f32,

    /// Aspect ratio (width / height)
    aspect: f32,

    /// Distance to near clipping plane
    near: f32,

    /// Distance to far clipping plane
    far: f32,
}

impl Camera {
    /// Create a perspective camera at the origin looking down -Z
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::zeros(),
            target: Vec3::new(0.0, 0.0, -1.0),
            heading: Vec3::new(0.0, 0.0, -1.0),
            right: Vec3::x(),
            up: Vec3::y(),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Change the projection parameters
    pub fn set_perspective_fov(&mut self, fov_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.fov = utils::deg_to_rad(fov_degrees);
        self.aspect = aspect;
        self.near = near;
        self.far = far;
    }

    /// Update camera aspect ratio for viewport changes
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Place the camera and rebuild its basis
    ///
    /// The basis is re-orthogonalized against `up`. When the view direction
    /// is degenerate (target on top of the position, or parallel to `up`)
    /// the previous heading or right vector is kept.
    pub fn set_look_at(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.position = position;
        self.target = target;

        if let Some(heading) = utils::try_normalize(&(target - position)) {
            self.heading = heading;
        }
        if let Some(right) = utils::try_normalize(&self.heading.cross(&up)) {
            self.right = right;
        }
        self.up = self.right.cross(&self.heading);

        log::trace!("Camera look_at updated - position: {:?}, target: {:?}", position, target);
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Look-at target in world space
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Unit view direction
    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// Unit right vector
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Unit up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Field of view in radians
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Aspect ratio
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// View matrix for the current look-at
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Combined projection × view
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View frustum for culling
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection_matrix())
    }

    /// World-space ray through a point in normalized device coordinates
    ///
    /// `(0, 0)` is the centre of the screen; `y` grows upwards.
    pub fn screen_to_world_ray(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        unproject_ray(&self.view_projection_matrix(), self.position, ndc_x, ndc_y)
    }
}

/// Cast a ray from `origin` through an NDC point of the given view-projection
pub(crate) fn unproject_ray(view_projection: &Mat4, origin: Vec3, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
    let inverse = view_projection.try_inverse()?;

    let unproject = |z: f32| -> Vec3 {
        let h = inverse * Vec4::new(ndc_x, ndc_y, z, 1.0);
        h.xyz() / h.w
    };
    let direction = unproject(1.0) - unproject(-1.0);

    Some(Ray::new(origin, direction))
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(45.0, 16.0 / 9.0, 0.1, 2000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_look_at_builds_orthonormal_basis() {
        let mut camera = Camera::default();
        camera.set_look_at(Vec3::new(0.0, 10.0, 10.0), Vec3::zeros(), Vec3::y());

        let heading = camera.heading();
        assert_relative_eq!(heading.magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(heading.dot(&camera.right()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(heading.dot(&camera.up()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.right(), Vec3::x(), epsilon = 1e-5);
        assert!(camera.up().y > 0.0);
    }

    #[test]
    fn test_degenerate_look_at_keeps_basis() {
        let mut camera = Camera::default();
        camera.set_look_at(Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 1.0), Vec3::y());

        assert_relative_eq!(camera.heading(), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(camera.up(), Vec3::y());
    }

    #[test]
    fn test_centre_ray_follows_heading() {
        let mut camera = Camera::perspective(60.0, 1.5, 0.1, 100.0);
        camera.set_look_at(Vec3::new(5.0, 2.0, 0.0), Vec3::new(5.0, 2.0, -10.0), Vec3::y());

        let ray = camera.screen_to_world_ray(0.0, 0.0).unwrap();
        assert_relative_eq!(ray.origin, Vec3::new(5.0, 2.0, 0.0));
        assert_relative_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-4);
    }

    #[test]
    fn test_target_is_inside_frustum() {
        let mut camera = Camera::default();
        camera.set_look_at(Vec3::new(0.0, 5.0, 20.0), Vec3::zeros(), Vec3::y());

        let frustum = camera.frustum();
        let sphere = crate::physics::BoundingSphere::new(Vec3::zeros(), 1.0);
        assert!(frustum.intersects_sphere(&sphere));

        let behind = crate::physics::BoundingSphere::new(Vec3::new(0.0, 5.0, 40.0), 1.0);
        assert!(!frustum.intersects_sphere(&behind));
    }
}
