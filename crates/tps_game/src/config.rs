//! Game configuration
//!
//! Everything the demo needs to build a level lives in one [`GameConfig`]
//! that can be loaded from a `.toml` or `.ron` file. Missing sections fall
//! back to the defaults of the single shipped level.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use terrain_engine::config::Config;
use terrain_engine::core::config::EngineConfig;
use terrain_engine::input::KeyMap;
use terrain_engine::units::{EnemyArchetype, PlayerArchetype, WeaponArchetype};

/// Game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Engine subsystems
    pub engine: EngineConfig,

    /// Level layout
    pub level: LevelConfig,

    /// Player type
    pub player: PlayerArchetype,

    /// Enemy type scattered over the level
    pub enemy: EnemyArchetype,

    /// Weapon handed to the player
    pub weapon: WeaponArchetype,

    /// Keyboard bindings
    pub controls: KeyMap,

    /// Headless loop settings
    pub simulation: SimulationConfig,
}

impl GameConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        self.level.validate()?;
        self.player.validate()?;
        self.enemy.validate()?;
        self.weapon.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

impl Config for GameConfig {}

/// Level layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Grayscale heightmap image; a procedural field is used when unset
    pub heightmap: Option<PathBuf>,

    /// Samples per side of the procedural field
    pub terrain_size: usize,

    /// Seed for terrain generation, enemy scattering and wandering
    pub seed: u64,

    /// Enemies scattered around the player
    pub enemy_count: usize,

    /// Enemies never spawn inside this square around the player
    pub enemy_min_distance: f32,

    /// Largest spawn offset from the player on each axis
    pub enemy_spread: f32,

    /// Player start position; the height is snapped to the terrain
    pub player_position: [f32; 3],

    /// Player start rotation in degrees
    pub player_rotation: [f32; 3],

    /// Playback speed of the player's clips
    pub player_animation_speed: f32,

    /// Chase point offset while following (strafe, up, heading)
    pub follow_chase_offset: [f32; 3],

    /// Chase point offset while aiming (strafe, up, heading)
    pub aim_chase_offset: [f32; 3],

    /// Viewport aspect ratio
    pub aspect_ratio: f32,
}

impl LevelConfig {
    /// Create the default level layout
    pub fn new() -> Self {
        Self {
            heightmap: None,
            terrain_size: 257,
            seed: 7,
            enemy_count: 20,
            enemy_min_distance: 150.0,
            enemy_spread: 800.0,
            player_position: [-210.0, 0.0, 10.0],
            player_rotation: [0.0, 70.0, 0.0],
            player_animation_speed: 1.3,
            follow_chase_offset: [3.0, 5.0, 0.0],
            aim_chase_offset: [3.0, 4.0, 0.0],
            aspect_ratio: 16.0 / 9.0,
        }
    }

    /// Set the heightmap image
    pub fn with_heightmap(mut self, path: impl Into<PathBuf>) -> Self {
        self.heightmap = Some(path.into());
        self
    }

    /// Set the number of enemies
    pub fn with_enemy_count(mut self, count: usize) -> Self {
        self.enemy_count = count;
        self
    }

    /// Validate the layout
    pub fn validate(&self) -> Result<(), String> {
        if self.heightmap.is_none() && self.terrain_size < 2 {
            return Err("Procedural terrain needs at least 2 samples per side".to_string());
        }
        if !(self.enemy_min_distance >= 0.0) {
            return Err("Enemy minimum distance must not be negative".to_string());
        }
        if !(self.enemy_spread > self.enemy_min_distance) {
            return Err("Enemy spread must exceed the minimum distance".to_string());
        }
        if !(self.player_animation_speed > 0.0) {
            return Err("Player animation speed must be positive".to_string());
        }
        if !(self.aspect_ratio > 0.0) {
            return Err("Aspect ratio must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Headless loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed update rate in ticks per second
    pub tick_rate: f32,

    /// Ticks to run before exiting
    pub ticks: u32,

    /// Ticks between HUD log lines
    pub hud_interval: u32,
}

impl SimulationConfig {
    /// Validate the loop settings
    pub fn validate(&self) -> Result<(), String> {
        if !(self.tick_rate >= 1.0) {
            return Err("Tick rate must be at least 1 Hz".to_string());
        }
        if self.hud_interval == 0 {
            return Err("HUD interval must be at least one tick".to_string());
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            ticks: 1800,
            hud_interval: 120,
        }
    }
}
