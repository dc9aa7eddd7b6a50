//! Player weapon
//!
//! The weapon is its own animated model. Each tick it is posed with the
//! player's hand bone as the parent world transform, so its absolute bones
//! are already in world space and the aim bone gives the muzzle position.

use std::sync::Arc;

use log::debug;

use crate::animation::{AnimationPlayer, SkinnedModel};
use crate::error::{EngineError, EngineResult};
use crate::foundation::math::{utils, Mat4, Vec3};
use super::archetype::WeaponArchetype;

/// Bone at the muzzle
pub const WEAPON_AIM_BONE: usize = 2;

/// Weapon carried by the player
#[derive(Debug, Clone)]
pub struct PlayerWeapon {
    model: Arc<SkinnedModel>,
    animation: AnimationPlayer,
    bullet_damage: u32,
    max_bullets: u32,
    bullets: u32,
    fire_position: Vec3,
    target_direction: Vec3,
}

impl PlayerWeapon {
    /// Create a fully loaded weapon
    pub fn new(model: Arc<SkinnedModel>, archetype: &WeaponArchetype) -> EngineResult<Self> {
        archetype.validate().map_err(EngineError::Configuration)?;
        if model.skeleton.bone_count() <= WEAPON_AIM_BONE {
            return Err(EngineError::Configuration(format!(
                "weapon model '{}' has {} bones, the aim bone is {}",
                model.mesh_id,
                model.skeleton.bone_count(),
                WEAPON_AIM_BONE
            )));
        }

        let animation = AnimationPlayer::new(Arc::clone(&model.skeleton));
        Ok(Self {
            model,
            animation,
            bullet_damage: archetype.bullet_damage,
            max_bullets: archetype.bullets,
            bullets: archetype.bullets,
            fire_position: Vec3::zeros(),
            target_direction: Vec3::new(0.0, 0.0, -1.0),
        })
    }

    /// Pose the weapon under `parent_bone` and refresh the fire position
    pub fn update(&mut self, dt: f32, parent_bone: &Mat4) {
        self.animation.advance(dt, parent_bone);
        self.fire_position = utils::translation_of(&self.animation.absolute()[WEAPON_AIM_BONE]);
    }

    /// Spend a bullet; false when empty
    pub fn fire(&mut self) -> bool {
        if self.bullets == 0 {
            debug!("Weapon '{}' is empty", self.model.mesh_id);
            return false;
        }
        self.bullets -= 1;
        true
    }

    /// Muzzle position in world space
    pub fn fire_position(&self) -> Vec3 {
        self.fire_position
    }

    /// Direction the player is aiming
    pub fn target_direction(&self) -> Vec3 {
        self.target_direction
    }

    /// Set the aim direction
    pub fn set_target_direction(&mut self, direction: Vec3) {
        self.target_direction = direction;
    }

    /// Damage per bullet
    pub fn bullet_damage(&self) -> u32 {
        self.bullet_damage
    }

    /// Bullets left
    pub fn bullets(&self) -> u32 {
        self.bullets
    }

    /// Bullets in a full load
    pub fn max_bullets(&self) -> u32 {
        self.max_bullets
    }

    /// Model description
    pub fn model(&self) -> &Arc<SkinnedModel> {
        &self.model
    }

    /// Skinning palette, already in world space
    pub fn skinning(&self) -> &[Mat4] {
        self.animation.skinning()
    }
}
