//! Third-person chase camera
//!
//! The camera trails a target point along the target's direction. Each update
//! the eye moves a fraction of the way towards its desired position, then the
//! distance to the target is clamped into `[min, max]`. A small bounded eye
//! rotation lets the player look around without moving the chase position.

use log::trace;

use crate::core::config::ChaseCameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Unit, Vec3};
use crate::physics::{Frustum, Ray};
use super::camera::{unproject_ray, Camera};

/// Dot product between the approach direction and the chase direction below
/// which the eye gets an extra catch-up boost
const CORRECTION_THRESHOLD: f32 = 0.5;

/// Catch-up boost per unit of chase speed
const CORRECTION_BOOST: f32 = 0.005;

/// Camera that chases a moving target
#[derive(Debug, Clone)]
pub struct ChaseCamera {
    camera: Camera,
    chase_position: Vec3,
    chase_direction: Vec3,
    desired_distance: f32,
    min_distance: f32,
    max_distance: f32,
    chase_speed: f32,
    chase_speed_scale: f32,
    max_eye_rotate: f32,
    eye_rotate: Vec3,
    eye_rotate_velocity: Vec3,
    first_time_chase: bool,
}

impl ChaseCamera {
    /// Create a chase camera with the default chase parameters
    pub fn new(camera: Camera) -> Self {
        let defaults = ChaseCameraConfig::default();
        let mut chase = Self {
            camera,
            chase_position: Vec3::zeros(),
            chase_direction: Vec3::new(0.0, 0.0, -1.0),
            desired_distance: 0.0,
            min_distance: 0.0,
            max_distance: 0.0,
            chase_speed: 0.0,
            chase_speed_scale: 1.0,
            max_eye_rotate: defaults.max_eye_rotate,
            eye_rotate: Vec3::zeros(),
            eye_rotate_velocity: Vec3::zeros(),
            first_time_chase: true,
        };
        chase.set_chase_parameters(
            defaults.chase_speed,
            defaults.desired_distance,
            defaults.min_distance,
            defaults.max_distance,
        );
        chase
    }

    /// Create a chase camera from configuration
    pub fn from_config(config: &ChaseCameraConfig, aspect: f32) -> Self {
        let camera = Camera::perspective(config.fov_degrees, aspect, config.near_plane, config.far_plane);
        let mut chase = Self::new(camera);
        chase.set_chase_parameters(
            config.chase_speed,
            config.desired_distance,
            config.min_distance,
            config.max_distance,
        );
        chase.max_eye_rotate = config.max_eye_rotate;
        chase
    }

    /// Set chase speed and distances
    pub fn set_chase_parameters(&mut self, speed: f32, desired: f32, min: f32, max: f32) {
        self.chase_speed = speed;
        self.desired_distance = desired;
        self.min_distance = min;
        self.max_distance = max.max(min);
    }

    /// Point and direction to chase
    pub fn set_chase(&mut self, position: Vec3, direction: Vec3) {
        self.chase_position = position;
        if let Some(direction) = utils::try_normalize(&direction) {
            self.chase_direction = direction;
        }
    }

    /// Snap to the desired position on the next update
    pub fn rearm(&mut self) {
        self.first_time_chase = true;
    }

    /// Whether the next update snaps instead of interpolating
    pub fn is_first_time_chase(&self) -> bool {
        self.first_time_chase
    }

    /// Base chase speed
    pub fn chase_speed(&self) -> f32 {
        self.chase_speed
    }

    /// Change the base chase speed
    pub fn set_chase_speed(&mut self, speed: f32) {
        self.chase_speed = speed;
    }

    /// Multiplier on the chase speed, supplied by the chased unit each tick
    pub fn set_chase_speed_scale(&mut self, scale: f32) {
        self.chase_speed_scale = scale;
    }

    /// Chase speed including the current multiplier
    pub fn effective_chase_speed(&self) -> f32 {
        self.chase_speed * self.chase_speed_scale
    }

    /// Eye rotation in degrees about the right (x), up (y) and heading (z) axes
    pub fn eye_rotate(&self) -> Vec3 {
        self.eye_rotate
    }

    /// Set the eye rotation, clamped per axis
    pub fn set_eye_rotate(&mut self, rotate: Vec3) {
        let limit = self.max_eye_rotate;
        self.eye_rotate = rotate.map(|angle| angle.clamp(-limit, limit));
    }

    /// Eye rotation velocity in degrees per second
    pub fn eye_rotate_velocity(&self) -> Vec3 {
        self.eye_rotate_velocity
    }

    /// Set the eye rotation velocity
    pub fn set_eye_rotate_velocity(&mut self, velocity: Vec3) {
        self.eye_rotate_velocity = velocity;
    }

    /// Underlying camera holding the unrotated chase eye
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable access to the underlying camera, for projection changes
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Distance from the chase eye to the target
    pub fn distance_to_target(&self) -> f32 {
        (self.camera.position() - self.chase_position).magnitude()
    }

    /// Advance the chase by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let interpolate = !self.first_time_chase;
        self.update_follow_position(dt, interpolate);

        if self.first_time_chase {
            self.eye_rotate = Vec3::zeros();
            self.eye_rotate_velocity = Vec3::zeros();
            self.first_time_chase = false;
        }

        if self.eye_rotate_velocity != Vec3::zeros() {
            let rotate = self.eye_rotate + self.eye_rotate_velocity * dt;
            self.set_eye_rotate(rotate);
        }
    }

    fn update_follow_position(&mut self, dt: f32, interpolate: bool) {
        let target = self.chase_position;
        let mut eye = target - self.chase_direction * self.desired_distance;

        if interpolate {
            let speed = self.effective_chase_speed();
            let current = self.camera.position();
            let mut t = (speed * dt).clamp(0.0, 1.0);

            if let Some(approach) = utils::try_normalize(&(eye - current)) {
                if approach.dot(&self.chase_direction) < CORRECTION_THRESHOLD {
                    t += speed * CORRECTION_BOOST;
                }
            }
            eye = utils::lerp_vec3(&current, &eye, t);
        }

        eye = self.clamp_distance(eye, target);
        trace!("Chase camera eye at {:?}, target {:?}", eye, target);

        let up = self.camera.up();
        self.camera.set_look_at(eye, target, up);
    }

    fn clamp_distance(&self, eye: Vec3, target: Vec3) -> Vec3 {
        let offset = eye - target;
        let length = offset.magnitude();
        let direction = if length > 1.0e-6 { offset / length } else { -self.chase_direction };

        if length < self.min_distance {
            target + direction * self.min_distance
        } else if length > self.max_distance {
            target + direction * self.max_distance
        } else {
            eye
        }
    }

    /// Eye position after applying the eye rotation
    pub fn eye_position(&self) -> Vec3 {
        let target = self.camera.target();
        let offset = self.camera.position() - target;

        let rotation = Mat4::from_axis_angle(
            &Unit::new_normalize(self.camera.heading()),
            utils::deg_to_rad(self.eye_rotate.z),
        ) * Mat4::from_axis_angle(
            &Unit::new_normalize(self.camera.right()),
            utils::deg_to_rad(self.eye_rotate.x),
        ) * Mat4::from_axis_angle(
            &Unit::new_normalize(self.camera.up()),
            utils::deg_to_rad(self.eye_rotate.y),
        );

        rotation.transform_vector(&offset) + target
    }

    /// View matrix including the eye rotation
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.eye_position(), self.camera.target(), self.camera.up())
    }

    /// Projection matrix of the underlying camera
    pub fn projection_matrix(&self) -> Mat4 {
        self.camera.projection_matrix()
    }

    /// Combined projection × view including the eye rotation
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View frustum including the eye rotation
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection_matrix())
    }

    /// World-space ray through a point in normalized device coordinates
    pub fn screen_to_world_ray(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        unproject_ray(&self.view_projection_matrix(), self.eye_position(), ndc_x, ndc_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn follow_camera() -> ChaseCamera {
        ChaseCamera::from_config(&ChaseCameraConfig::follow(), 16.0 / 9.0)
    }

    #[test]
    fn test_first_update_snaps_to_desired_position() {
        let mut chase = follow_camera();
        chase.set_eye_rotate_velocity(Vec3::new(10.0, 0.0, 0.0));
        chase.set_chase(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 0.0, -1.0));

        chase.update(0.016);

        assert_relative_eq!(chase.camera().position(), Vec3::new(0.0, 5.0, 9.0), epsilon = 1e-5);
        assert_eq!(chase.eye_rotate(), Vec3::zeros());
        assert_eq!(chase.eye_rotate_velocity(), Vec3::zeros());
        assert!(!chase.is_first_time_chase());
    }

    #[test]
    fn test_interpolates_towards_desired_position() {
        let mut chase = follow_camera();
        chase.set_chase(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        chase.update(0.0);

        chase.set_chase(Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, -1.0));
        chase.update(0.1);

        // Desired eye is (0, 0, 7); a 0.3 step from (0, 0, 9) lands on 8.4
        assert_relative_eq!(chase.camera().position(), Vec3::new(0.0, 0.0, 8.4), epsilon = 1e-4);
    }

    #[test]
    fn test_distance_stays_clamped_under_target_motion() {
        let mut chase = follow_camera();
        chase.set_chase(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        chase.update(0.016);

        let mut position = Vec3::zeros();
        for step in 0..200 {
            let angle = step as f32 * 0.37;
            let direction = Vec3::new(angle.sin(), 0.0, -angle.cos());
            position += Vec3::new(angle.cos() * 40.0, (step % 7) as f32, angle.sin() * -25.0);

            chase.set_chase(position, direction);
            chase.update(0.016 + (step % 5) as f32 * 0.05);

            let distance = chase.distance_to_target();
            assert!(distance >= 7.0 - 1e-3 && distance <= 14.0 + 1e-3, "distance {distance}");
        }
    }

    #[test]
    fn test_target_on_eye_falls_back_to_chase_direction() {
        let mut chase = follow_camera();
        chase.set_chase(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        chase.update(0.0);

        // Move the target onto a frozen eye
        let eye = chase.camera().position();
        chase.set_chase_speed(0.0);
        chase.set_chase(eye, Vec3::new(1.0, 0.0, 0.0));
        chase.update(0.1);

        let expected = eye - Vec3::new(7.0, 0.0, 0.0);
        assert_relative_eq!(chase.camera().position(), expected, epsilon = 1e-4);

        assert_relative_eq!(chase.distance_to_target(), 7.0, epsilon = 1e-4);
    }

    #[test]
    fn test_eye_rotation_is_clamped() {
        let mut chase = follow_camera();
        chase.set_chase(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        chase.update(0.016);

        chase.set_eye_rotate_velocity(Vec3::new(50.0, -80.0, 0.0));
        for _ in 0..100 {
            chase.update(0.1);
        }

        assert_relative_eq!(chase.eye_rotate(), Vec3::new(30.0, -30.0, 0.0));
    }

    #[test]
    fn test_eye_rotation_orbits_about_target() {
        let mut chase = follow_camera();
        chase.set_chase(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        chase.update(0.016);

        let distance = (chase.eye_position() - chase.camera().target()).magnitude();
        chase.set_eye_rotate(Vec3::new(0.0, 20.0, 0.0));
        let rotated = chase.eye_position();

        assert_relative_eq!((rotated - chase.camera().target()).magnitude(), distance, epsilon = 1e-4);
        assert!(rotated.x.abs() > 1.0);
    }

    #[test]
    fn test_chase_speed_scale_multiplies_speed() {
        let mut chase = follow_camera();
        chase.set_chase_speed_scale(4.0);
        assert_relative_eq!(chase.effective_chase_speed(), 12.0);
    }
}
