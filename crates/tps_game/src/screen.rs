//! Game screen
//!
//! Owns the running level and drives one tick in a fixed order:
//!
//! 1. restart when the player died or every enemy is dead
//! 2. controls (aim mode or normal mode)
//! 3. player, then the active chase camera's target
//! 4. weapon target picking
//! 5. active camera
//! 6. enemies that are on screen or already engaged

use std::fmt;
use std::sync::Arc;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use terrain_engine::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use terrain_engine::input::{Buttons, ControlState, InputManager};
use terrain_engine::physics::Ray;
use terrain_engine::render::{FrameView, RenderError, RenderQueue, Renderer, SceneCamera};
use terrain_engine::units::PlayerAnimation;

use crate::config::GameConfig;
use crate::level::{create_level, EnemyKey, GameLevel, LevelAssets, LevelError, AIM_CAMERA, FOLLOW_CAMERA};

/// Forward speed while running
const RUN_SPEED: f32 = 30.0;

/// Speed while backing up
const BACK_SPEED: f32 = 20.0;

/// Turn rate at full stick deflection, degrees per second
const TURN_RATE: f32 = 70.0;

/// Camera pitch rate at full stick deflection, degrees per second
const EYE_PITCH_RATE: f32 = 50.0;

/// Waist bend rate at full stick deflection, radians per second
const WAIST_RATE: f32 = 0.8;

/// Jump height passed to the player
const JUMP_HEIGHT: f32 = 2.5;

/// Distance of the crosshair point along the aim direction
const WEAPON_TARGET_DISTANCE: f32 = 300.0;

/// Numbers shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudStats {
    /// Player life
    pub life: u32,
    /// Player life when spawned
    pub max_life: u32,
    /// Bullets left
    pub bullets: u32,
    /// Bullets in a full load
    pub max_bullets: u32,
    /// Enemies alive after the last target pass
    pub enemies_alive: usize,
    /// Enemies in the level
    pub enemies_total: usize,
}

impl fmt::Display for HudStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Health: {}/{}  Bullets: {}/{}  Enemies Alive: {}/{}",
            self.life, self.max_life, self.bullets, self.max_bullets, self.enemies_alive, self.enemies_total
        )
    }
}

/// Crosshair drawn while aiming
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crosshair {
    /// Position in normalized device coordinates
    pub ndc: Vec2,
    /// True when an enemy is in the line of fire
    pub on_target: bool,
}

/// The running game
pub struct GameScreen {
    config: GameConfig,
    assets: LevelAssets,
    level: GameLevel,
    input: InputManager,
    rng: StdRng,
    queue: RenderQueue,

    aiming: bool,
    aim_enemy: Option<EnemyKey>,
    weapon_target: Vec3,
    enemies_alive: usize,
    restarts: u32,
}

impl GameScreen {
    /// Create the screen and its first level
    pub fn new(config: GameConfig, assets: LevelAssets) -> Result<Self, LevelError> {
        let mut rng = StdRng::seed_from_u64(config.level.seed);
        let level = create_level(&config, &assets, &mut rng)?;
        let enemies_alive = level.alive_enemies();
        let input = InputManager::with_key_map(config.controls.clone());

        Ok(Self {
            config,
            assets,
            level,
            input,
            rng,
            queue: RenderQueue::new(),
            aiming: false,
            aim_enemy: None,
            weapon_target: Vec3::zeros(),
            enemies_alive,
            restarts: 0,
        })
    }

    /// Input sink for keyboard and gamepad events
    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Advance the game by `dt` seconds
    pub fn update(&mut self, dt: f32) -> Result<(), LevelError> {
        let cleared = self.enemies_alive == 0 && !self.level.enemies.is_empty();
        if self.level.player.unit().is_dead() || cleared {
            self.restart()?;
        }

        let controls = self.input.update();
        self.update_controls(&controls)?;

        let level = &mut self.level;
        level.player.update(dt, &level.terrain);
        let camera_name = if self.aiming { AIM_CAMERA } else { FOLLOW_CAMERA };
        if let Some(camera) = level.cameras.get_mut(camera_name).and_then(SceneCamera::as_chase_mut) {
            level.player.aim_camera(camera_name, camera);
        }

        self.update_weapon_target();

        let level = &mut self.level;
        let Some(camera) = level.cameras.active_mut() else {
            return Ok(());
        };
        camera.update(dt);
        let frustum = camera.frustum();

        for enemy in level.enemies.values_mut() {
            if enemy.is_engaged() || frustum.intersects_sphere(&enemy.unit().bounding_sphere()) {
                enemy.update(dt, level.player.unit_mut(), &level.terrain, &mut self.rng);
            }
        }
        Ok(())
    }

    fn update_controls(&mut self, controls: &ControlState) -> Result<(), LevelError> {
        let thumb = controls.left_thumb;
        let level = &mut self.level;

        if controls.is_held(Buttons::LEFT_SHOULDER) && level.player.unit().is_on_terrain() {
            if !self.aiming {
                level.cameras.set_active(AIM_CAMERA)?;
                self.aiming = true;
                level.player.set_animation(PlayerAnimation::Aim, false, false, false);
            }
            if let Some(camera) = level.chase_camera_mut(AIM_CAMERA) {
                camera.set_eye_rotate_velocity(Vec3::new(thumb.y * EYE_PITCH_RATE, 0.0, 0.0));
            }

            let player = &mut level.player;
            player.unit_mut().set_linear_velocity(Vec3::zeros());
            player.unit_mut().set_angular_velocity(Vec3::new(0.0, -thumb.x * TURN_RATE, 0.0));
            player.set_waist_velocity(thumb.y * WAIST_RATE);

            let loaded = player.weapon().is_some_and(|weapon| weapon.bullets() > 0);
            if controls.is_just_pressed(Buttons::A) && loaded && player.unit().animation().is_finished() {
                player.set_animation(PlayerAnimation::Shoot, true, false, false);
                let damage = player
                    .weapon_mut()
                    .and_then(|weapon| weapon.fire().then_some(weapon.bullet_damage()));

                if let (Some(damage), Some(key)) = (damage, self.aim_enemy) {
                    if let Some(enemy) = level.enemies.get_mut(key) {
                        debug!("Enemy hit for {} damage", damage);
                        enemy.receive_damage(damage);
                    }
                }
            }
            return Ok(());
        }

        if self.aiming {
            level.cameras.set_active(FOLLOW_CAMERA)?;
            self.aiming = false;
            level.player.set_waist_rotation(0.0);
            level.player.set_waist_velocity(0.0);
        }
        if let Some(camera) = level.chase_camera_mut(FOLLOW_CAMERA) {
            camera.set_eye_rotate_velocity(Vec3::new(thumb.y * EYE_PITCH_RATE, 0.0, 0.0));
        }

        let player = &mut level.player;
        player.unit_mut().set_angular_velocity(Vec3::new(0.0, -thumb.x * TURN_RATE, 0.0));

        let mut idle = true;
        let heading = player.unit().heading();
        if controls.is_held(Buttons::X) {
            player.set_animation(PlayerAnimation::Run, false, true, false);
            player.unit_mut().set_linear_velocity(heading * RUN_SPEED);
            idle = false;
        } else if controls.is_held(Buttons::A) {
            player.set_animation(PlayerAnimation::Run, false, true, false);
            player.unit_mut().set_linear_velocity(-heading * BACK_SPEED);
            idle = false;
        } else {
            player.unit_mut().set_linear_velocity(Vec3::zeros());
        }

        if controls.is_just_pressed(Buttons::LEFT_STICK) {
            player.unit_mut().jump(JUMP_HEIGHT);
            idle = false;
        }
        if idle {
            player.set_animation(PlayerAnimation::Idle, false, true, false);
        }
        Ok(())
    }

    /// Pick the nearest thing along the line of fire and count live enemies
    fn update_weapon_target(&mut self) {
        self.aim_enemy = None;
        self.enemies_alive = 0;

        let ray = self
            .level
            .player
            .weapon()
            .map(|weapon| Ray::new(weapon.fire_position(), weapon.target_direction()));
        let mut distance = ray.as_ref().and_then(|ray| self.level.terrain.intersect(ray));

        for (key, enemy) in &self.level.enemies {
            if enemy.unit().is_dead() {
                continue;
            }
            self.enemies_alive += 1;

            let Some(hit) = ray.as_ref().and_then(|ray| enemy.unit().box_intersects(ray)) else {
                continue;
            };
            if distance.map_or(true, |nearest| hit <= nearest) {
                distance = Some(hit);
                self.aim_enemy = Some(key);
            }
        }

        if let Some(weapon) = self.level.player.weapon() {
            self.weapon_target = weapon.fire_position() + weapon.target_direction() * WEAPON_TARGET_DISTANCE;
        }
        trace!("Weapon target {:?}, aimed enemy {:?}", self.weapon_target, self.aim_enemy);
    }

    /// Throw the level away and build a fresh one
    pub fn restart(&mut self) -> Result<(), LevelError> {
        info!(
            "Restarting level: player life {}, {} enemies alive",
            self.level.player.unit().life(),
            self.enemies_alive
        );
        self.level = create_level(&self.config, &self.assets, &mut self.rng)?;
        self.aiming = false;
        self.aim_enemy = None;
        self.enemies_alive = self.level.alive_enemies();
        self.restarts += 1;
        Ok(())
    }

    /// Queue the frame and hand it to `renderer`
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        let Some(camera) = self.level.cameras.active() else {
            return Ok(());
        };
        let view = FrameView {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            eye: camera.eye_position(),
        };
        let frustum = camera.frustum();

        self.queue.clear();
        self.queue.submit_terrain(Arc::clone(&self.level.terrain_mesh), Mat4::identity());

        let player = self.level.player.unit();
        self.queue
            .submit_skinned(player.model().mesh_id.as_str(), player.world_matrix(), player.animation().skinning());
        if let Some(weapon) = self.level.player.weapon() {
            self.queue.submit_skinned(weapon.model().mesh_id.as_str(), Mat4::identity(), weapon.skinning());
        }

        for enemy in self.level.enemies.values() {
            let unit = enemy.unit();
            if frustum.intersects_sphere(&unit.bounding_sphere()) {
                self.queue
                    .submit_skinned(unit.model().mesh_id.as_str(), unit.world_matrix(), unit.animation().skinning());
            }
        }

        self.queue.sort_front_to_back(&view.eye);
        renderer.render(&view, &self.queue)
    }

    /// Numbers for the HUD
    pub fn hud(&self) -> HudStats {
        let player = &self.level.player;
        let (bullets, max_bullets) = player
            .weapon()
            .map_or((0, 0), |weapon| (weapon.bullets(), weapon.max_bullets()));
        HudStats {
            life: player.unit().life(),
            max_life: player.unit().max_life(),
            bullets,
            max_bullets,
            enemies_alive: self.enemies_alive,
            enemies_total: self.level.enemies.len(),
        }
    }

    /// Crosshair position while aiming
    ///
    /// `None` outside aim mode or when the target point is behind the eye.
    pub fn crosshair(&self) -> Option<Crosshair> {
        if !self.aiming {
            return None;
        }
        let camera = self.level.cameras.active()?;
        let view_projection = camera.projection_matrix() * camera.view_matrix();
        let target = self.weapon_target;
        let clip = view_projection * Vec4::new(target.x, target.y, target.z, 1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        Some(Crosshair {
            ndc: Vec2::new(clip.x / clip.w, clip.y / clip.w),
            on_target: self.aim_enemy.is_some(),
        })
    }

    /// The running level
    pub fn level(&self) -> &GameLevel {
        &self.level
    }

    /// True in aim mode
    pub fn is_aiming(&self) -> bool {
        self.aiming
    }

    /// Enemy in the line of fire
    pub fn aim_enemy(&self) -> Option<EnemyKey> {
        self.aim_enemy
    }

    /// Crosshair point in world space
    pub fn weapon_target(&self) -> Vec3 {
        self.weapon_target
    }

    /// Number of restarts so far
    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}
