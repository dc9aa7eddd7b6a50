//! Terrain-following unit locomotion
//!
//! A [`TerrainUnit`] is a placed, animated model that walks over a
//! [`HeightField`]. Game code drives it by setting linear and angular
//! velocities and requesting animations; [`TerrainUnit::update`] integrates
//! the motion, keeps the unit glued to the ground and plays its jump arcs.
//!
//! Vertical motion uses a per-tick gravity offset (see
//! [`LocomotionConfig`]): while airborne the offset decays towards the
//! terminal value and is added to the height once per tick.

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::animation::{AnimationPlayer, SkinnedModel};
use crate::core::config::LocomotionConfig;
use crate::foundation::math::{Mat4, Point3, Transform, Vec3};
use crate::physics::{Aabb, BoundingSphere, Ray};
use crate::terrain::HeightField;

/// Animated unit clamped to the terrain
#[derive(Debug, Clone)]
pub struct TerrainUnit {
    transform: Transform,
    life: u32,
    max_life: u32,
    speed: f32,

    linear_velocity: Vec3,
    /// Euler angle rates in degrees per second
    angular_velocity: Vec3,
    gravity_velocity: f32,

    heading: Vec3,
    strafe: Vec3,
    up: Vec3,

    is_on_terrain: bool,
    is_dead: bool,
    /// Jump multipliers are applied and must be reverted on landing
    jump_boost: bool,

    model: Arc<SkinnedModel>,
    animation: AnimationPlayer,
    locomotion: LocomotionConfig,
}

impl TerrainUnit {
    /// Create a unit at the origin with full life
    pub fn new(model: Arc<SkinnedModel>, life: u32, speed: f32, locomotion: LocomotionConfig) -> Self {
        let animation = AnimationPlayer::new(Arc::clone(&model.skeleton));
        let transform = Transform::identity();
        Self {
            heading: transform.heading(),
            strafe: transform.strafe(),
            up: transform.up(),
            transform,
            life,
            max_life: life,
            speed,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            gravity_velocity: 0.0,
            is_on_terrain: false,
            is_dead: false,
            jump_boost: false,
            model,
            animation,
            locomotion,
        }
    }

    /// Place the unit and settle it onto the terrain
    ///
    /// Positions off the grid are moved to the nearest point over it.
    pub fn place_on(&mut self, transform: Transform, field: &HeightField) {
        self.transform = transform;

        let position = self.transform.position;
        if !field.contains(position.x, position.z) {
            let inside = field.clamp_inside(position.x, position.z);
            warn!("Unit placed off the terrain at {:?}, moved to {:?}", position, inside);
            self.transform.position.x = inside.x;
            self.transform.position.z = inside.y;
        }

        self.update_height(0.0, field);
        self.refresh_basis();
    }

    /// Advance animation and motion by `dt` seconds
    pub fn update(&mut self, dt: f32, field: &HeightField) {
        self.animation.advance(dt, &Mat4::identity());

        if self.linear_velocity != Vec3::zeros() || self.gravity_velocity != 0.0 {
            let previous = self.transform.position;
            self.transform.position += self.linear_velocity * dt * self.speed;

            // Units never walk off the grid
            if !field.contains(self.transform.position.x, self.transform.position.z) {
                self.transform.position.x = previous.x;
                self.transform.position.z = previous.z;
            }
            self.update_height(dt, field);
        }

        if self.angular_velocity != Vec3::zeros() {
            self.transform.rotation += self.angular_velocity * dt * self.speed;
            self.refresh_basis();
        }
    }

    fn update_height(&mut self, dt: f32, field: &HeightField) {
        // No ground to settle on; keep the height as it is
        let Some(terrain_height) = field.try_height_at(self.transform.position.x, self.transform.position.z) else {
            self.is_on_terrain = false;
            self.gravity_velocity = 0.0;
            return;
        };
        let y = self.transform.position.y;

        if y <= terrain_height + self.locomotion.height_epsilon && self.gravity_velocity <= 0.0 {
            self.is_on_terrain = true;
            self.gravity_velocity = 0.0;
            self.transform.position.y = terrain_height;

            if self.jump_boost {
                self.speed /= self.locomotion.jump_speed_multiplier;
                self.jump_boost = false;
                debug!("Unit landed at {:?}", self.transform.position);
            }
        } else {
            self.is_on_terrain = false;
            if self.gravity_velocity > self.locomotion.min_gravity {
                self.gravity_velocity -= self.locomotion.gravity * dt;
            }
            self.transform.position.y = terrain_height.max(y + self.gravity_velocity);
            trace!("Airborne: y = {:.3}, gravity = {:.3}", self.transform.position.y, self.gravity_velocity);
        }
    }

    fn refresh_basis(&mut self) {
        self.heading = self.transform.heading().normalize();
        self.strafe = self.transform.strafe().normalize();
        self.up = self.transform.up().normalize();
    }

    /// Start a jump; ignored unless standing on the terrain
    ///
    /// While airborne the unit moves faster and [`chase_speed_scale`] asks
    /// the camera to chase faster. Both revert on landing.
    ///
    /// [`chase_speed_scale`]: Self::chase_speed_scale
    pub fn jump(&mut self, height: f32) {
        if !self.is_on_terrain || self.is_dead {
            return;
        }
        self.speed *= self.locomotion.jump_speed_multiplier;
        self.jump_boost = true;
        self.gravity_velocity = self.locomotion.gravity * height * self.locomotion.jump_factor;
        self.is_on_terrain = false;
        debug!("Unit jumped with initial gravity {:.3}", self.gravity_velocity);
    }

    /// Multiplier the chasing camera should apply to its chase speed
    pub fn chase_speed_scale(&self) -> f32 {
        if self.jump_boost {
            self.locomotion.jump_chase_speed_multiplier
        } else {
            1.0
        }
    }

    /// Subtract life; reaching zero kills the unit for good
    pub fn receive_damage(&mut self, amount: u32) {
        if self.is_dead {
            return;
        }
        self.life = self.life.saturating_sub(amount);
        if self.life == 0 {
            self.is_dead = true;
            debug!("Unit died at {:?}", self.transform.position);
        }
    }

    /// Request an animation clip
    ///
    /// Nothing happens when the clip is already playing unless `reset` is
    /// set. With `wait_finish`, the request is dropped while the current clip
    /// is still running.
    pub fn set_animation(&mut self, name: &str, reset: bool, looping: bool, wait_finish: bool) {
        if !reset && self.current_animation() == Some(name) {
            return;
        }
        if wait_finish && !self.animation.is_finished() {
            return;
        }
        match self.animation.play(name) {
            Ok(()) => self.animation.set_looping(looping),
            Err(err) => warn!("Animation request ignored: {}", err),
        }
    }

    /// Name of the playing clip
    pub fn current_animation(&self) -> Option<&str> {
        self.animation.active_clip_name()
    }

    /// Bounding box in world space
    pub fn bounding_box(&self) -> Aabb {
        self.model.bounding_box.translated(self.transform.position)
    }

    /// Bounding sphere in world space
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.model.bounding_sphere.translated(self.transform.position)
    }

    /// Distance along a world ray to the unit's bounding box
    ///
    /// The test runs in model space, so the box turns with the unit.
    pub fn box_intersects(&self, ray: &Ray) -> Option<f32> {
        let inverse = self.transform.to_matrix().try_inverse()?;
        let origin = inverse.transform_point(&Point3::from(ray.origin)).coords;
        let direction = inverse.transform_vector(&ray.direction);
        self.model.bounding_box.intersect_ray(&Ray::new(origin, direction))
    }

    /// Model to world transform
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Placement
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Unit forward vector
    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// Unit right vector
    pub fn strafe(&self) -> Vec3 {
        self.strafe
    }

    /// Unit up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Current life
    pub fn life(&self) -> u32 {
        self.life
    }

    /// Maximum life
    pub fn max_life(&self) -> u32 {
        self.max_life
    }

    /// Speed multiplier, including any jump boost
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Set the speed multiplier
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Linear velocity in world units per second
    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    /// Set the linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    /// Angular velocity in degrees per second
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Set the angular velocity
    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    /// Current per-tick vertical offset
    pub fn gravity_velocity(&self) -> f32 {
        self.gravity_velocity
    }

    /// True while standing on the terrain
    pub fn is_on_terrain(&self) -> bool {
        self.is_on_terrain
    }

    /// True once life has reached zero
    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Model description
    pub fn model(&self) -> &Arc<SkinnedModel> {
        &self.model
    }

    /// Animation state
    pub fn animation(&self) -> &AnimationPlayer {
        &self.animation
    }

    /// Animation state
    pub fn animation_mut(&mut self) -> &mut AnimationPlayer {
        &mut self.animation
    }
}
