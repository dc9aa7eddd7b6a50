//! Game units
//!
//! - [`TerrainUnit`]: animated locomotion over a height field
//! - [`Player`] and [`PlayerWeapon`]: the player-controlled unit and its gun
//! - [`Enemy`]: wander/chase/attack AI driven by [`EnemyState`]
//! - archetypes: per-type data loaded from configuration

pub mod archetype;
pub mod terrain_unit;
pub mod enemy;
pub mod player;
pub mod weapon;

pub use archetype::{EnemyArchetype, PlayerArchetype, WeaponArchetype};
pub use terrain_unit::TerrainUnit;
pub use enemy::{random_offset_xz, Enemy, EnemyAnimation, EnemyState};
pub use player::{Player, PlayerAnimation, MAX_WAIST_ROTATE, RIGHT_HAND_BONE, WAIST_BONE};
pub use weapon::{PlayerWeapon, WEAPON_AIM_BONE};
