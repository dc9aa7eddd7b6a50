//! Player-controlled unit
//!
//! Adds to [`TerrainUnit`]:
//!
//! - a waist bone that bends up and down to aim, driven by a velocity and
//!   clamped to [`MAX_WAIST_ROTATE`]
//! - per-camera chase offsets so each camera frames the player differently
//! - a [`PlayerWeapon`] posed in the right hand

use std::sync::Arc;

use crate::animation::SkinnedModel;
use crate::core::config::LocomotionConfig;
use crate::error::{EngineError, EngineResult};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::ChaseCamera;
use crate::terrain::HeightField;
use super::archetype::PlayerArchetype;
use super::terrain_unit::TerrainUnit;
use super::weapon::PlayerWeapon;

/// Largest waist bend in radians
pub const MAX_WAIST_ROTATE: f32 = 0.5;

/// Bone bent by [`Player::set_waist_rotation`]
pub const WAIST_BONE: usize = 2;

/// Bone the weapon is attached to
pub const RIGHT_HAND_BONE: usize = 15;

/// Clips every player model must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAnimation {
    /// Standing still
    Idle,
    /// Running forwards or backwards
    Run,
    /// Raising the weapon
    Aim,
    /// Firing
    Shoot,
}

impl PlayerAnimation {
    /// All clips
    pub const ALL: [PlayerAnimation; 4] = [Self::Idle, Self::Run, Self::Aim, Self::Shoot];

    /// Clip name in the skeleton's library
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Run => "Run",
            Self::Aim => "Aim",
            Self::Shoot => "Shoot",
        }
    }
}

/// The player
#[derive(Debug, Clone)]
pub struct Player {
    unit: TerrainUnit,
    weapon: Option<PlayerWeapon>,
    chase_offsets: Vec<(String, Vec3)>,
    waist_rotation: f32,
    waist_velocity: f32,
}

impl Player {
    /// Create a player playing its idle clip
    pub fn new(model: Arc<SkinnedModel>, archetype: &PlayerArchetype, locomotion: LocomotionConfig) -> EngineResult<Self> {
        archetype.validate().map_err(EngineError::Configuration)?;
        let clips = PlayerAnimation::ALL.map(PlayerAnimation::name);
        model.skeleton.require_clips(&clips)?;

        let bones = model.skeleton.bone_count();
        if bones <= WAIST_BONE.max(RIGHT_HAND_BONE) {
            return Err(EngineError::Configuration(format!(
                "player model '{}' has {} bones, needs waist bone {} and hand bone {}",
                model.mesh_id, bones, WAIST_BONE, RIGHT_HAND_BONE
            )));
        }

        let mut unit = TerrainUnit::new(model, archetype.life, archetype.speed, locomotion);
        unit.set_animation(PlayerAnimation::Idle.name(), false, true, false);

        Ok(Self {
            unit,
            weapon: None,
            chase_offsets: Vec::new(),
            waist_rotation: 0.0,
            waist_velocity: 0.0,
        })
    }

    /// Put a weapon in the player's hand
    pub fn attach_weapon(&mut self, weapon: PlayerWeapon) {
        self.weapon = Some(weapon);
    }

    /// Advance waist, locomotion and weapon
    pub fn update(&mut self, dt: f32, field: &HeightField) {
        if self.waist_velocity != 0.0 {
            self.set_waist_rotation(self.waist_rotation + self.waist_velocity * dt);
        }

        self.unit.update(dt, field);

        if let Some(weapon) = &mut self.weapon {
            let hand = self
                .unit
                .animation()
                .absolute()
                .get(RIGHT_HAND_BONE)
                .copied()
                .unwrap_or_else(Mat4::identity);
            let parent = self.unit.world_matrix() * hand;

            weapon.set_target_direction(self.unit.heading() + self.unit.up() * self.waist_rotation);
            weapon.update(dt, &parent);
        }
    }

    /// Request a player clip
    pub fn set_animation(&mut self, animation: PlayerAnimation, reset: bool, looping: bool, wait_finish: bool) {
        self.unit.set_animation(animation.name(), reset, looping, wait_finish);
    }

    /// True while `animation` is the active clip
    pub fn is_playing(&self, animation: PlayerAnimation) -> bool {
        self.unit.current_animation() == Some(animation.name())
    }

    /// Waist bend in radians
    pub fn waist_rotation(&self) -> f32 {
        self.waist_rotation
    }

    /// Bend the waist, clamped to [`MAX_WAIST_ROTATE`]
    pub fn set_waist_rotation(&mut self, rotation: f32) {
        self.waist_rotation = rotation.clamp(-MAX_WAIST_ROTATE, MAX_WAIST_ROTATE);
        self.unit
            .animation_mut()
            .set_bone_override(WAIST_BONE, Mat4::rotation_z(self.waist_rotation));
    }

    /// Waist bend rate in radians per second
    pub fn waist_velocity(&self) -> f32 {
        self.waist_velocity
    }

    /// Set the waist bend rate
    pub fn set_waist_velocity(&mut self, velocity: f32) {
        self.waist_velocity = velocity;
    }

    /// Offset of the chase point for the named camera
    ///
    /// `x` moves along the strafe vector, `y` along up and `z` along the
    /// heading.
    pub fn set_chase_offset(&mut self, camera: impl Into<String>, offset: Vec3) {
        let camera = camera.into();
        match self.chase_offsets.iter_mut().find(|(name, _)| *name == camera) {
            Some((_, slot)) => *slot = offset,
            None => self.chase_offsets.push((camera, offset)),
        }
    }

    /// Chase offset for the named camera, zero when none was set
    pub fn chase_offset(&self, camera: &str) -> Vec3 {
        self.chase_offsets
            .iter()
            .find(|(name, _)| name == camera)
            .map_or_else(Vec3::zeros, |(_, offset)| *offset)
    }

    /// World point a camera should chase
    pub fn chase_position(&self, camera: &str) -> Vec3 {
        let offset = self.chase_offset(camera);
        self.unit.bounding_sphere().center
            + self.unit.strafe() * offset.x
            + self.unit.up() * offset.y
            + self.unit.heading() * offset.z
    }

    /// Point the named chase camera at the player
    ///
    /// Also hands over the jump boost so the camera keeps up while airborne.
    pub fn aim_camera(&self, camera_name: &str, camera: &mut ChaseCamera) {
        camera.set_chase(self.chase_position(camera_name), self.unit.heading());
        camera.set_chase_speed_scale(self.unit.chase_speed_scale());
    }

    /// Weapon in hand
    pub fn weapon(&self) -> Option<&PlayerWeapon> {
        self.weapon.as_ref()
    }

    /// Weapon in hand
    pub fn weapon_mut(&mut self) -> Option<&mut PlayerWeapon> {
        self.weapon.as_mut()
    }

    /// Underlying unit
    pub fn unit(&self) -> &TerrainUnit {
        &self.unit
    }

    /// Underlying unit
    pub fn unit_mut(&mut self) -> &mut TerrainUnit {
        &mut self.unit
    }
}
