//! Enemy AI
//!
//! Enemies run a small state machine on top of a [`TerrainUnit`]:
//!
//! - **Wander**: walk to random nearby points, idling between moves, and
//!   return to the start after a few moves
//! - **ChasePlayer**: run straight at the player
//! - **AttackPlayer**: bite on a cooldown while the player stays close
//! - **Dead**: terminal, only the death clip plays out
//!
//! The AI keeps its own clock from the `dt` values it is given, so it never
//! needs a global game time.

use std::sync::Arc;

use log::debug;
use rand::Rng;

use crate::animation::SkinnedModel;
use crate::core::config::{EnemyTuning, LocomotionConfig};
use crate::error::{EngineError, EngineResult};
use crate::foundation::math::{utils, Transform, Vec3};
use crate::terrain::HeightField;
use super::archetype::EnemyArchetype;
use super::terrain_unit::TerrainUnit;

/// AI state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyState {
    /// Roaming around the spawn point
    Wander,
    /// Running at the player
    ChasePlayer,
    /// Biting the player
    AttackPlayer,
    /// Terminal
    Dead,
}

/// Clips every enemy model must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyAnimation {
    /// Standing still
    Idle,
    /// Moving
    Run,
    /// Attacking
    Bite,
    /// Hit reaction
    TakeDamage,
    /// Death
    Die,
}

impl EnemyAnimation {
    /// All clips
    pub const ALL: [EnemyAnimation; 5] = [Self::Idle, Self::Run, Self::Bite, Self::TakeDamage, Self::Die];

    /// Clip name in the skeleton's library
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Run => "Run",
            Self::Bite => "Bite",
            Self::TakeDamage => "TakeDamage",
            Self::Die => "Die",
        }
    }
}

/// Random offset on the XZ plane with each component in `[-extent, extent]`
pub fn random_offset_xz<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> Vec3 {
    let extent = extent.abs();
    Vec3::new(rng.gen_range(-extent..=extent), 0.0, rng.gen_range(-extent..=extent))
}

/// An AI-driven terrain unit
#[derive(Debug, Clone)]
pub struct Enemy {
    unit: TerrainUnit,
    archetype: EnemyArchetype,
    tuning: EnemyTuning,
    state: EnemyState,

    clock: f32,
    next_action_time: f32,

    wander_moves: u32,
    wander_position: Vec3,
    wander_start: Vec3,
    is_hit: bool,
}

impl Enemy {
    /// Create an enemy playing its idle clip
    ///
    /// Fails when the model lacks one of the [`EnemyAnimation`] clips.
    pub fn new(
        model: Arc<SkinnedModel>,
        archetype: &EnemyArchetype,
        tuning: EnemyTuning,
        locomotion: LocomotionConfig,
    ) -> EngineResult<Self> {
        archetype.validate().map_err(EngineError::Configuration)?;
        tuning.validate().map_err(EngineError::Configuration)?;
        let clips = EnemyAnimation::ALL.map(EnemyAnimation::name);
        model.skeleton.require_clips(&clips)?;

        let mut unit = TerrainUnit::new(model, archetype.life, archetype.speed, locomotion);
        unit.set_animation(EnemyAnimation::Idle.name(), false, true, false);

        Ok(Self {
            unit,
            archetype: archetype.clone(),
            tuning,
            state: EnemyState::Wander,
            clock: 0.0,
            next_action_time: 0.0,
            wander_moves: 0,
            wander_position: Vec3::zeros(),
            wander_start: Vec3::zeros(),
            is_hit: false,
        })
    }

    /// Place the enemy; the placement becomes its wander origin
    pub fn place_on(&mut self, transform: Transform, field: &HeightField) {
        self.unit.place_on(transform, field);
        self.wander_position = self.unit.position();
        self.wander_start = self.unit.position();
    }

    /// Run one AI tick and move the enemy
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, player: &mut TerrainUnit, field: &HeightField, rng: &mut R) {
        self.clock += dt;
        self.unit.set_linear_velocity(Vec3::zeros());
        self.unit.set_angular_velocity(Vec3::zeros());

        let to_player = player.position() - self.unit.position();
        let distance = to_player.magnitude();
        let chase_direction = utils::try_normalize(&Vec3::new(to_player.x, 0.0, to_player.z));

        match self.state {
            EnemyState::Wander => {
                if self.is_hit || distance < self.archetype.perception_distance {
                    self.transition(EnemyState::ChasePlayer);
                } else {
                    self.wander(dt, field, rng);
                }
            }
            EnemyState::ChasePlayer => {
                if distance <= self.archetype.attack_distance {
                    self.transition(EnemyState::AttackPlayer);
                    self.next_action_time = 0.0;
                } else if let Some(direction) = chase_direction {
                    self.move_towards(direction, self.tuning.linear_velocity);
                }
            }
            EnemyState::AttackPlayer => {
                if distance > self.archetype.attack_distance * self.tuning.attack_hysteresis {
                    self.transition(EnemyState::ChasePlayer);
                } else {
                    self.attack(player);
                }
            }
            EnemyState::Dead => {}
        }

        self.unit.update(dt, field);
    }

    fn transition(&mut self, state: EnemyState) {
        debug!("{} enemy: {:?} -> {:?}", self.archetype.name, self.state, state);
        self.state = state;
    }

    fn wander<R: Rng + ?Sized>(&mut self, dt: f32, field: &HeightField, rng: &mut R) {
        let position = self.unit.position();
        let mut to_target = self.wander_position - position;
        to_target.y = 0.0;
        let distance = to_target.magnitude();

        if distance < self.tuning.arrive_distance {
            self.set_animation(EnemyAnimation::Idle, false, true, false);

            let destination = position + random_offset_xz(rng, self.tuning.wander_distance);
            if self.wander_moves < self.tuning.wander_max_moves && field.contains(destination.x, destination.z) {
                self.wander_position = destination;
                self.wander_moves += 1;
            } else {
                self.wander_position = self.wander_start;
                self.wander_moves = 0;
            }

            self.next_action_time =
                self.clock + self.tuning.wander_delay + self.tuning.wander_delay_jitter * rng.gen::<f32>();
            return;
        }

        if self.clock > self.next_action_time {
            if let Some(direction) = utils::try_normalize(&to_target) {
                // Slow down on the last step instead of overshooting the destination
                let step = dt * self.unit.speed();
                let speed = if step > 0.0 {
                    self.tuning.linear_velocity.min(distance / step)
                } else {
                    self.tuning.linear_velocity
                };
                self.move_towards(direction, speed);
            }
        }
    }

    /// Run along `direction`, turning towards it
    fn move_towards(&mut self, direction: Vec3, speed: f32) {
        let recovering = self.is_playing(EnemyAnimation::TakeDamage);
        self.set_animation(EnemyAnimation::Run, false, true, recovering);
        self.unit.set_linear_velocity(direction * speed);

        let angle = self.unit.heading().dot(&direction).clamp(-1.0, 1.0).acos();
        if angle >= self.tuning.turn_threshold {
            let turn = Vec3::new(0.0, self.tuning.angular_velocity * angle, 0.0);
            // Positive yaw turns left
            let turn_right = self.unit.strafe().dot(&direction) > 0.0;
            self.unit.set_angular_velocity(if turn_right { -turn } else { turn });
        }
    }

    fn attack(&mut self, player: &mut TerrainUnit) {
        if self.clock > self.next_action_time {
            self.set_animation(EnemyAnimation::Bite, false, true, false);
            player.receive_damage(self.archetype.attack_damage);
            self.next_action_time = self.clock + self.tuning.attack_delay;
        }
    }

    /// Take a hit; reacts with the hit clip, or dies
    pub fn receive_damage(&mut self, amount: u32) {
        if self.unit.is_dead() {
            return;
        }
        self.unit.receive_damage(amount);
        self.is_hit = true;

        if self.unit.is_dead() {
            self.transition(EnemyState::Dead);
            self.set_animation(EnemyAnimation::Die, false, false, false);
        } else if self.is_playing(EnemyAnimation::TakeDamage) {
            self.set_animation(EnemyAnimation::TakeDamage, true, false, true);
        } else if !self.is_playing(EnemyAnimation::Bite) {
            self.set_animation(EnemyAnimation::TakeDamage, false, false, false);
        }
    }

    fn set_animation(&mut self, animation: EnemyAnimation, reset: bool, looping: bool, wait_finish: bool) {
        self.unit.set_animation(animation.name(), reset, looping, wait_finish);
    }

    fn is_playing(&self, animation: EnemyAnimation) -> bool {
        self.unit.current_animation() == Some(animation.name())
    }

    /// Current AI state
    pub fn state(&self) -> EnemyState {
        self.state
    }

    /// True while the enemy is after the player
    pub fn is_engaged(&self) -> bool {
        matches!(self.state, EnemyState::ChasePlayer | EnemyState::AttackPlayer)
    }

    /// Type data
    pub fn archetype(&self) -> &EnemyArchetype {
        &self.archetype
    }

    /// Point the enemy is currently wandering towards
    pub fn wander_position(&self) -> Vec3 {
        self.wander_position
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, SkeletonPose};
    use crate::foundation::math::Mat4;
    use crate::physics::Aabb;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> Arc<SkinnedModel> {
        let clips = EnemyAnimation::ALL
            .iter()
            .map(|animation| AnimationClip::new(animation.name(), 0.5, Vec::new()).unwrap())
            .collect();
        let skeleton = SkeletonPose::from_bind_pose(vec![Mat4::identity()], vec![None], clips).unwrap();
        let bounds = Aabb::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 3.0, 2.0));
        Arc::new(SkinnedModel::new("beast", Arc::new(skeleton), bounds))
    }

    fn field() -> HeightField {
        HeightField::flat(128, 128, 0.0, 8.0, 1.0).unwrap()
    }

    fn player_at(position: Vec3, field: &HeightField) -> TerrainUnit {
        let mut player = TerrainUnit::new(model(), 100, 1.0, LocomotionConfig::default());
        player.place_on(Transform::from_position(position), field);
        player
    }

    fn enemy_at(position: Vec3, field: &HeightField) -> Enemy {
        let mut enemy = Enemy::new(model(), &EnemyArchetype::beast(), EnemyTuning::default(), LocomotionConfig::default())
            .unwrap();
        enemy.place_on(Transform::from_position(position), field);
        enemy
    }

    #[test]
    fn test_missing_clip_is_rejected() {
        let clips = vec![AnimationClip::new("Idle", 1.0, Vec::new()).unwrap()];
        let skeleton = SkeletonPose::from_bind_pose(vec![Mat4::identity()], vec![None], clips).unwrap();
        let bounds = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let model = Arc::new(SkinnedModel::new("broken", Arc::new(skeleton), bounds));

        let result = Enemy::new(model, &EnemyArchetype::beast(), EnemyTuning::default(), LocomotionConfig::default());
        assert!(matches!(result, Err(EngineError::UnknownAnimation(_))));
    }

    #[test]
    fn test_notices_player_within_perception() {
        let field = field();
        let mut rng = StdRng::seed_from_u64(7);
        let mut enemy = enemy_at(Vec3::new(200.0, 0.0, 0.0), &field);
        let mut player = player_at(Vec3::zeros(), &field);

        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.state(), EnemyState::Wander);

        player.place_on(Transform::from_position(Vec3::new(enemy.unit().position().x - 100.0, 0.0, 0.0)), &field);
        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.state(), EnemyState::ChasePlayer);
    }

    #[test]
    fn test_hit_enemy_gives_chase() {
        let field = field();
        let mut rng = StdRng::seed_from_u64(1);
        let mut enemy = enemy_at(Vec3::new(300.0, 0.0, 0.0), &field);
        let mut player = player_at(Vec3::zeros(), &field);

        enemy.receive_damage(12);
        assert_eq!(enemy.unit().current_animation(), Some("TakeDamage"));

        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.state(), EnemyState::ChasePlayer);
    }

    #[test]
    fn test_chase_runs_and_turns_towards_player() {
        let field = field();
        let mut rng = StdRng::seed_from_u64(3);
        let mut enemy = enemy_at(Vec3::new(100.0, 0.0, 0.0), &field);
        let mut player = player_at(Vec3::zeros(), &field);

        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.state(), EnemyState::ChasePlayer);

        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.unit().current_animation(), Some("Run"));
        assert_relative_eq!(enemy.unit().linear_velocity(), Vec3::new(-35.0, 0.0, 0.0), epsilon = 1e-4);
        // Facing -Z, the player is on the left
        assert!(enemy.unit().angular_velocity().y > 0.0);
        assert!(enemy.unit().position().x < 100.0);
    }

    #[test]
    fn test_attacks_on_cooldown_with_hysteresis() {
        let field = field();
        let mut rng = StdRng::seed_from_u64(5);
        let mut enemy = enemy_at(Vec3::new(20.0, 0.0, 0.0), &field);
        let mut player = player_at(Vec3::zeros(), &field);

        enemy.update(0.1, &mut player, &field, &mut rng);
        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.state(), EnemyState::AttackPlayer);

        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(player.life(), 92);
        assert_eq!(enemy.unit().current_animation(), Some("Bite"));

        // Cooldown
        enemy.update(0.5, &mut player, &field, &mut rng);
        assert_eq!(player.life(), 92);
        enemy.update(1.1, &mut player, &field, &mut rng);
        assert_eq!(player.life(), 84);

        // Within 1.5x the attack distance the bite goes on
        player.place_on(Transform::from_position(Vec3::new(-20.0, 0.0, 0.0)), &field);
        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.state(), EnemyState::AttackPlayer);

        player.place_on(Transform::from_position(Vec3::new(-40.0, 0.0, 0.0)), &field);
        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.state(), EnemyState::ChasePlayer);
    }

    #[test]
    fn test_death_is_terminal() {
        let field = field();
        let mut rng = StdRng::seed_from_u64(9);
        let mut enemy = enemy_at(Vec3::new(10.0, 0.0, 0.0), &field);
        let mut player = player_at(Vec3::zeros(), &field);

        enemy.receive_damage(200);
        assert_eq!(enemy.state(), EnemyState::Dead);
        assert!(enemy.unit().is_dead());
        assert_eq!(enemy.unit().current_animation(), Some("Die"));

        for _ in 0..10 {
            enemy.update(0.1, &mut player, &field, &mut rng);
        }
        assert_eq!(enemy.state(), EnemyState::Dead);
        assert_eq!(player.life(), 100);
        assert!(enemy.unit().animation().is_finished());
    }

    #[test]
    fn test_biting_ignores_hit_reaction() {
        let field = field();
        let mut rng = StdRng::seed_from_u64(11);
        let mut enemy = enemy_at(Vec3::new(20.0, 0.0, 0.0), &field);
        let mut player = player_at(Vec3::zeros(), &field);

        for _ in 0..3 {
            enemy.update(0.1, &mut player, &field, &mut rng);
        }
        assert_eq!(enemy.unit().current_animation(), Some("Bite"));

        enemy.receive_damage(12);
        assert_eq!(enemy.unit().current_animation(), Some("Bite"));
        assert_eq!(enemy.unit().life(), 138);
    }

    #[test]
    fn test_wander_idles_then_moves_and_returns() {
        let field = field();
        let mut rng = StdRng::seed_from_u64(21);
        let start = Vec3::new(0.0, 0.0, 200.0);
        let mut enemy = enemy_at(start, &field);
        let mut player = player_at(Vec3::new(0.0, 0.0, -300.0), &field);

        // Arrived at the spawn point: idle and pick a destination
        enemy.update(0.1, &mut player, &field, &mut rng);
        assert_eq!(enemy.unit().current_animation(), Some("Idle"));
        let destination = enemy.wander_position();
        assert!((destination - start).x.abs() <= 80.0);
        assert!((destination - start).z.abs() <= 80.0);

        // Longest possible idle is 8 seconds
        let mut ran = false;
        for _ in 0..85 {
            enemy.update(0.1, &mut player, &field, &mut rng);
            ran |= enemy.unit().current_animation() == Some("Run");
        }
        assert!(ran);

        let mut visited_start = false;
        for _ in 0..5000 {
            enemy.update(0.1, &mut player, &field, &mut rng);
            if enemy.wander_position() == start {
                visited_start = true;
            }
        }
        assert!(visited_start);
        assert_eq!(enemy.state(), EnemyState::Wander);
    }
}
