//! # Unified Configuration System
//!
//! Tunables for every engine subsystem, grouped per concern:
//!
//! - **Terrain**: world size of a grid cell and of a unit of normalized height
//! - **Locomotion**: gravity, ground snapping and jump multipliers
//! - **Chase camera**: projection and chase distances
//! - **Enemy tuning**: AI movement speeds, wander pattern and attack timing
//!
//! Every struct has a `Default` matching the shipped game and a `validate()`
//! that rejects values the simulation cannot run with.

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// # Terrain Configuration
///
/// Scales applied when turning a grid of normalized samples into world space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World units between neighbouring samples
    pub block_scale: f32,
    /// World units per unit of normalized height
    pub height_scale: f32,
}

impl TerrainConfig {
    /// Create a terrain configuration with the default scales
    pub fn new() -> Self {
        Self {
            block_scale: 8.0,
            height_scale: 255.0,
        }
    }

    /// Set the cell size
    pub fn with_block_scale(mut self, block_scale: f32) -> Self {
        self.block_scale = block_scale;
        self
    }

    /// Set the height scale
    pub fn with_height_scale(mut self, height_scale: f32) -> Self {
        self.height_scale = height_scale;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.block_scale > 0.0) {
            return Err(format!("Block scale must be positive, got {}", self.block_scale));
        }
        if !(self.height_scale >= 0.0) {
            return Err(format!("Height scale cannot be negative, got {}", self.height_scale));
        }
        Ok(())
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Locomotion Configuration
///
/// Vertical motion of terrain units. Gravity is a per-tick vertical offset:
/// it shrinks by `gravity * dt` each airborne tick until it reaches
/// `min_gravity`, and is added to the unit's height once per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Gravity deceleration per second
    pub gravity: f32,
    /// Terminal (most negative) gravity velocity
    pub min_gravity: f32,
    /// Distance above the ground still treated as standing on it
    pub height_epsilon: f32,
    /// Scale from requested jump height to initial gravity velocity
    pub jump_factor: f32,
    /// Movement speed multiplier while airborne after a jump
    pub jump_speed_multiplier: f32,
    /// Camera chase speed multiplier while airborne after a jump
    pub jump_chase_speed_multiplier: f32,
}

impl LocomotionConfig {
    /// Create a locomotion configuration with the default values
    pub fn new() -> Self {
        Self {
            gravity: 4.0,
            min_gravity: -1.5,
            height_epsilon: 2.0,
            jump_factor: 0.1,
            jump_speed_multiplier: 1.5,
            jump_chase_speed_multiplier: 4.0,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.gravity > 0.0) {
            return Err("Gravity must be positive".to_string());
        }
        if !(self.min_gravity < 0.0) {
            return Err("Terminal gravity velocity must be negative".to_string());
        }
        if !(self.height_epsilon >= 0.0) {
            return Err("Height epsilon cannot be negative".to_string());
        }
        if !(self.jump_speed_multiplier > 0.0) || !(self.jump_chase_speed_multiplier > 0.0) {
            return Err("Jump multipliers must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Chase Camera Configuration
///
/// Projection and chase parameters for one third-person camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseCameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip plane
    pub near_plane: f32,
    /// Far clip plane
    pub far_plane: f32,
    /// How quickly the eye catches up with its desired position
    pub chase_speed: f32,
    /// Preferred distance from the eye to the target
    pub desired_distance: f32,
    /// Closest allowed distance
    pub min_distance: f32,
    /// Farthest allowed distance
    pub max_distance: f32,
    /// Eye rotation clamp per axis, in degrees
    pub max_eye_rotate: f32,
}

impl ChaseCameraConfig {
    /// Create a camera configuration with the default chase parameters
    pub fn new() -> Self {
        Self {
            fov_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 2000.0,
            chase_speed: 2.0,
            desired_distance: 10.0,
            min_distance: 5.0,
            max_distance: 15.0,
            max_eye_rotate: 30.0,
        }
    }

    /// Over-the-shoulder camera used while running around
    pub fn follow() -> Self {
        Self::new()
            .with_fov(60.0)
            .with_chase(3.0, 9.0, 7.0, 14.0)
    }

    /// Tight camera used while aiming
    pub fn aim() -> Self {
        Self::new()
            .with_fov(45.0)
            .with_chase(5.0, 6.0, 6.0, 6.0)
    }

    /// Set the field of view in degrees
    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    /// Set chase speed and the desired, minimum and maximum distances
    pub fn with_chase(mut self, speed: f32, desired: f32, min: f32, max: f32) -> Self {
        self.chase_speed = speed;
        self.desired_distance = desired;
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(format!("Field of view must be in (0, 180), got {}", self.fov_degrees));
        }
        if !(self.near_plane > 0.0 && self.far_plane > self.near_plane) {
            return Err("Clip planes must satisfy 0 < near < far".to_string());
        }
        if !(self.min_distance >= 0.0 && self.min_distance <= self.max_distance) {
            return Err(format!(
                "Chase distances must satisfy 0 <= min <= max, got [{}, {}]",
                self.min_distance, self.max_distance
            ));
        }
        if self.chase_speed < 0.0 {
            return Err("Chase speed cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for ChaseCameraConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Enemy Tuning
///
/// Constants shared by every enemy AI regardless of archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Distance at which a destination counts as reached
    pub arrive_distance: f32,
    /// Linear speed when moving
    pub linear_velocity: f32,
    /// Turn rate scale, degrees per second per radian of heading error
    pub angular_velocity: f32,
    /// Heading error (radians) below which the enemy stops turning
    pub turn_threshold: f32,
    /// Wander moves before returning to the start position
    pub wander_max_moves: u32,
    /// Half extent of the square a wander destination is drawn from
    pub wander_distance: f32,
    /// Minimum idle time between wander moves
    pub wander_delay: f32,
    /// Random extra idle time added to `wander_delay`
    pub wander_delay_jitter: f32,
    /// Time between bites
    pub attack_delay: f32,
    /// Attack keeps going until the player is beyond this many attack distances
    pub attack_hysteresis: f32,
}

impl EnemyTuning {
    /// Create the default tuning
    pub fn new() -> Self {
        Self {
            arrive_distance: 1.0,
            linear_velocity: 35.0,
            angular_velocity: 100.0,
            turn_threshold: 0.1,
            wander_max_moves: 3,
            wander_distance: 80.0,
            wander_delay: 4.0,
            wander_delay_jitter: 4.0,
            attack_delay: 1.5,
            attack_hysteresis: 1.5,
        }
    }

    /// Validate the tuning
    pub fn validate(&self) -> Result<(), String> {
        if !(self.linear_velocity > 0.0) {
            return Err("Enemy linear velocity must be positive".to_string());
        }
        if !(self.arrive_distance > 0.0) {
            return Err("Arrive distance must be positive".to_string());
        }
        if !(self.wander_distance >= 0.0) || self.wander_delay < 0.0 || self.wander_delay_jitter < 0.0 {
            return Err("Wander distance and delays cannot be negative".to_string());
        }
        if !(self.attack_hysteresis >= 1.0) {
            return Err(format!(
                "Attack hysteresis must be at least 1.0, got {}",
                self.attack_hysteresis
            ));
        }
        Ok(())
    }
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self::new()
    }
}

/// # Engine Configuration
///
/// Aggregate of all subsystem configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Terrain scales
    pub terrain: TerrainConfig,
    /// Unit locomotion
    pub locomotion: LocomotionConfig,
    /// Third-person camera while moving
    pub follow_camera: ChaseCameraConfig,
    /// Third-person camera while aiming
    pub aim_camera: ChaseCameraConfig,
    /// Enemy AI constants
    pub enemy: EnemyTuning,
}

impl EngineConfig {
    /// Create the default engine configuration
    pub fn new() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            locomotion: LocomotionConfig::default(),
            follow_camera: ChaseCameraConfig::follow(),
            aim_camera: ChaseCameraConfig::aim(),
            enemy: EnemyTuning::default(),
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.terrain.validate()?;
        self.locomotion.validate()?;
        self.follow_camera.validate().map_err(|e| format!("follow camera: {e}"))?;
        self.aim_camera.validate().map_err(|e| format!("aim camera: {e}"))?;
        self.enemy.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::new().validate().is_ok());
        assert!(ChaseCameraConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_chase_distances() {
        let camera = ChaseCameraConfig::new().with_chase(2.0, 10.0, 15.0, 5.0);
        assert!(camera.validate().is_err());
    }

    #[test]
    fn test_rejects_hysteresis_below_one() {
        let tuning = EnemyTuning {
            attack_hysteresis: 0.5,
            ..EnemyTuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let text = "[terrain]\nblock_scale = 4.0\n\n[enemy]\nattack_hysteresis = 2.0\n";
        let config = EngineConfig::parse(text, ConfigFormat::Toml).unwrap();

        assert_eq!(config.terrain.block_scale, 4.0);
        assert_eq!(config.terrain.height_scale, TerrainConfig::default().height_scale);
        assert_eq!(config.enemy.attack_hysteresis, 2.0);
        assert_eq!(config.locomotion.gravity, 4.0);
    }
}
