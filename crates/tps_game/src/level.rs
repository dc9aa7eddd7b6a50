//! Level creation
//!
//! A level is the terrain, two chase cameras, the armed player and a herd
//! of enemies scattered around the player. Terrain and models are loaded
//! once into [`LevelAssets`]; restarting only rebuilds the units and cameras.

use std::sync::Arc;

use log::{info, warn};
use rand::Rng;
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use terrain_engine::foundation::math::{Transform, Vec3};
use terrain_engine::render::{CameraManager, ChaseCamera, SceneCamera};
use terrain_engine::terrain::{HeightField, TerrainMesh};
use terrain_engine::units::{random_offset_xz, Enemy, Player, PlayerWeapon};
use terrain_engine::EngineError;

use crate::assets::{load_height_field, AssetError, ModelLibrary};
use crate::config::GameConfig;

/// Camera used while running around
pub const FOLLOW_CAMERA: &str = "FollowCamera";

/// Camera used while aiming
pub const AIM_CAMERA: &str = "FPSCamera";

/// Spawn draws per enemy before an off-terrain position is accepted
const MAX_SPAWN_ATTEMPTS: u32 = 64;

new_key_type! {
    /// Stable handle of an enemy in a level
    pub struct EnemyKey;
}

/// Level errors
#[derive(Error, Debug)]
pub enum LevelError {
    /// Asset lookup or loading failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// A unit or camera rejected its data
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Data shared by every run of a level
#[derive(Debug, Clone)]
pub struct LevelAssets {
    /// Skinned models by name
    pub models: ModelLibrary,
    /// Height queries
    pub terrain: Arc<HeightField>,
    /// Render geometry of the terrain
    pub terrain_mesh: Arc<TerrainMesh>,
}

impl LevelAssets {
    /// Load the configured terrain and the built-in models
    pub fn load(config: &GameConfig) -> Result<Self, AssetError> {
        let terrain = load_height_field(&config.level, &config.engine.terrain)?;
        Ok(Self::new(ModelLibrary::builtin()?, terrain))
    }

    /// Bundle models with a height field, building its mesh
    pub fn new(models: ModelLibrary, terrain: HeightField) -> Self {
        let terrain_mesh = Arc::new(TerrainMesh::build(&terrain));
        Self {
            models,
            terrain: Arc::new(terrain),
            terrain_mesh,
        }
    }
}

/// Everything live in one run of a level
#[derive(Debug, Clone)]
pub struct GameLevel {
    /// Height queries
    pub terrain: Arc<HeightField>,
    /// Render geometry of the terrain
    pub terrain_mesh: Arc<TerrainMesh>,
    /// Follow and aim cameras
    pub cameras: CameraManager,
    /// The player
    pub player: Player,
    /// Enemies, alive or dead
    pub enemies: SlotMap<EnemyKey, Enemy>,
}

impl GameLevel {
    /// Enemies still alive
    pub fn alive_enemies(&self) -> usize {
        self.enemies.values().filter(|enemy| !enemy.unit().is_dead()).count()
    }

    /// Chase camera registered under `name`
    pub fn chase_camera_mut(&mut self, name: &str) -> Option<&mut ChaseCamera> {
        self.cameras.get_mut(name).and_then(SceneCamera::as_chase_mut)
    }
}

/// Build a fresh run of the level
pub fn create_level<R: Rng + ?Sized>(
    config: &GameConfig,
    assets: &LevelAssets,
    rng: &mut R,
) -> Result<GameLevel, LevelError> {
    let layout = &config.level;
    let terrain = Arc::clone(&assets.terrain);

    let mut cameras = CameraManager::new();
    cameras.add(
        FOLLOW_CAMERA,
        SceneCamera::Chase(ChaseCamera::from_config(&config.engine.follow_camera, layout.aspect_ratio)),
    );
    cameras.add(
        AIM_CAMERA,
        SceneCamera::Chase(ChaseCamera::from_config(&config.engine.aim_camera, layout.aspect_ratio)),
    );
    cameras.set_active(FOLLOW_CAMERA)?;

    let mut player = Player::new(
        assets.models.get(&config.player.model)?,
        &config.player,
        config.engine.locomotion.clone(),
    )?;
    player.unit_mut().animation_mut().set_speed(layout.player_animation_speed);
    player.unit_mut().place_on(
        Transform::from_position_rotation(Vec3::from(layout.player_position), Vec3::from(layout.player_rotation)),
        &terrain,
    );
    player.attach_weapon(PlayerWeapon::new(assets.models.get(&config.weapon.model)?, &config.weapon)?);
    player.set_chase_offset(FOLLOW_CAMERA, Vec3::from(layout.follow_chase_offset));
    player.set_chase_offset(AIM_CAMERA, Vec3::from(layout.aim_chase_offset));

    let enemies = scatter_enemies(config, assets, player.unit().position(), rng)?;

    info!(
        "Level created: {} enemies around the player at {:?}",
        enemies.len(),
        player.unit().position()
    );

    Ok(GameLevel {
        terrain,
        terrain_mesh: Arc::clone(&assets.terrain_mesh),
        cameras,
        player,
        enemies,
    })
}

/// Place the configured number of enemies around `center`
pub fn scatter_enemies<R: Rng + ?Sized>(
    config: &GameConfig,
    assets: &LevelAssets,
    center: Vec3,
    rng: &mut R,
) -> Result<SlotMap<EnemyKey, Enemy>, LevelError> {
    let layout = &config.level;
    let model = assets.models.get(&config.enemy.model)?;
    let mut enemies = SlotMap::with_capacity_and_key(layout.enemy_count);

    for _ in 0..layout.enemy_count {
        let mut enemy = Enemy::new(
            Arc::clone(&model),
            &config.enemy,
            config.engine.enemy.clone(),
            config.engine.locomotion.clone(),
        )?;

        let mut position = center + spawn_offset(rng, layout.enemy_min_distance, layout.enemy_spread);
        let mut attempts = 1;
        while !assets.terrain.contains(position.x, position.z) && attempts < MAX_SPAWN_ATTEMPTS {
            position = center + spawn_offset(rng, layout.enemy_min_distance, layout.enemy_spread);
            attempts += 1;
        }
        if !assets.terrain.contains(position.x, position.z) {
            warn!("No spawn on the terrain after {} draws, clamping {:?} onto it", attempts, position);
        }

        enemy.place_on(Transform::from_position(position), &assets.terrain);
        enemies.insert(enemy);
    }

    Ok(enemies)
}

/// Random XZ offset outside the square of half-size `min_distance`
///
/// When `spread` leaves no room outside that square the offset lies on its
/// edge instead.
pub fn spawn_offset<R: Rng + ?Sized>(rng: &mut R, min_distance: f32, spread: f32) -> Vec3 {
    let min_distance = min_distance.max(0.0);
    if spread <= min_distance {
        let edge = if rng.gen::<bool>() { min_distance } else { -min_distance };
        let along = rng.gen_range(-min_distance..=min_distance);
        return if rng.gen::<bool>() {
            Vec3::new(edge, 0.0, along)
        } else {
            Vec3::new(along, 0.0, edge)
        };
    }

    loop {
        let offset = random_offset_xz(rng, spread);
        if offset.x.abs() >= min_distance || offset.z.abs() >= min_distance {
            return offset;
        }
    }
}
