//! Unit archetypes
//!
//! Static per-type data for players, enemies and weapons. Archetypes are
//! plain serde structs so a game can ship them in its configuration file.

use serde::{Deserialize, Serialize};

/// Player type data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerArchetype {
    /// Display name
    pub name: String,
    /// Model asset handle
    pub model: String,
    /// Starting and maximum life
    pub life: u32,
    /// Movement and turn speed multiplier
    pub speed: f32,
}

impl PlayerArchetype {
    /// The marine
    pub fn marine() -> Self {
        Self {
            name: "Marine".to_string(),
            model: "PlayerMarine".to_string(),
            life: 100,
            speed: 1.0,
        }
    }

    /// Validate the archetype
    pub fn validate(&self) -> Result<(), String> {
        if self.life == 0 {
            return Err(format!("Player '{}' must start with some life", self.name));
        }
        if !(self.speed > 0.0) {
            return Err(format!("Player '{}' speed must be positive", self.name));
        }
        Ok(())
    }
}

impl Default for PlayerArchetype {
    fn default() -> Self {
        Self::marine()
    }
}

/// Enemy type data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyArchetype {
    /// Display name
    pub name: String,
    /// Model asset handle
    pub model: String,
    /// Starting and maximum life
    pub life: u32,
    /// Movement and turn speed multiplier
    pub speed: f32,
    /// Distance at which the enemy notices the player
    pub perception_distance: f32,
    /// Distance at which the enemy starts biting
    pub attack_distance: f32,
    /// Damage per bite
    pub attack_damage: u32,
}

impl EnemyArchetype {
    /// The beast
    pub fn beast() -> Self {
        Self {
            name: "Beast".to_string(),
            model: "EnemyBeast".to_string(),
            life: 150,
            speed: 1.0,
            perception_distance: 120.0,
            attack_distance: 30.0,
            attack_damage: 8,
        }
    }

    /// Validate the archetype
    pub fn validate(&self) -> Result<(), String> {
        if self.life == 0 {
            return Err(format!("Enemy '{}' must start with some life", self.name));
        }
        if !(self.speed > 0.0) {
            return Err(format!("Enemy '{}' speed must be positive", self.name));
        }
        if !(self.attack_distance >= 0.0) || !(self.perception_distance >= self.attack_distance) {
            return Err(format!(
                "Enemy '{}' perception distance ({}) must cover its attack distance ({})",
                self.name, self.perception_distance, self.attack_distance
            ));
        }
        Ok(())
    }
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self::beast()
    }
}

/// Weapon type data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponArchetype {
    /// Display name
    pub name: String,
    /// Model asset handle
    pub model: String,
    /// Damage per bullet
    pub bullet_damage: u32,
    /// Bullets in a full load
    pub bullets: u32,
}

impl WeaponArchetype {
    /// The machine gun
    pub fn machine_gun() -> Self {
        Self {
            name: "MachineGun".to_string(),
            model: "WeaponMachineGun".to_string(),
            bullet_damage: 12,
            bullets: 300,
        }
    }

    /// Validate the archetype
    pub fn validate(&self) -> Result<(), String> {
        if self.bullet_damage == 0 {
            return Err(format!("Weapon '{}' must deal damage", self.name));
        }
        Ok(())
    }
}

impl Default for WeaponArchetype {
    fn default() -> Self {
        Self::machine_gun()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PlayerArchetype::default().validate().is_ok());
        assert!(EnemyArchetype::default().validate().is_ok());
        assert!(WeaponArchetype::default().validate().is_ok());
    }

    #[test]
    fn test_enemy_must_see_before_biting() {
        let enemy = EnemyArchetype {
            perception_distance: 10.0,
            ..EnemyArchetype::beast()
        };
        assert!(enemy.validate().is_err());
    }

    #[test]
    fn test_partial_archetype_uses_defaults() {
        let enemy: EnemyArchetype = toml::from_str("name = \"Runt\"\nlife = 40").unwrap();
        assert_eq!(enemy.name, "Runt");
        assert_eq!(enemy.life, 40);
        assert_eq!(enemy.attack_damage, 8);
    }
}
