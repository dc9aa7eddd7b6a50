//! # Terrain Engine
//!
//! Core of a third-person game: heightmap terrain, skeletal animation,
//! terrain-following units and a chase camera.
//!
//! ## Features
//!
//! - **Terrain**: height field queries, ray picking and a normal-mapping ready mesh
//! - **Skeletal Animation**: shared skeletons and per-instance players producing skinning palettes
//! - **Units**: locomotion with gravity and jumps, enemy AI, player and weapon
//! - **Chase Camera**: smoothed third-person camera with distance clamps and eye rotation
//! - **Render Queue**: backend-agnostic draw submission through the [`render::Renderer`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use terrain_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let field = HeightField::flat(64, 64, 0.1, 8.0, 255.0)?;
//!     let mesh = TerrainMesh::build(&field);
//!
//!     let mut camera = ChaseCamera::from_config(&ChaseCameraConfig::follow(), 16.0 / 9.0);
//!     camera.set_chase(Vec3::new(0.0, field.height_at(0.0, 0.0), 0.0), Vec3::new(0.0, 0.0, -1.0));
//!     camera.update(1.0 / 60.0);
//!
//!     println!("{} triangles, eye at {:?}", mesh.triangle_count(), camera.eye_position());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod core;
pub mod error;
pub mod physics;
pub mod terrain;
pub mod animation;
pub mod render;
pub mod input;
pub mod units;

#[cfg(test)]
mod tests;

pub use error::{EngineError, EngineResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        EngineError, EngineResult,
        foundation::{
            math::{Vec2, Vec3, Mat4, Transform},
            time::{FrameClock, Stopwatch},
        },
        config::{Config, ConfigError},
        core::config::{EngineConfig, TerrainConfig, LocomotionConfig, ChaseCameraConfig, EnemyTuning},
        physics::{Aabb, BoundingSphere, Frustum, Ray},
        terrain::{HeightField, TerrainMesh, NOT_ON_FIELD},
        animation::{AnimationClip, AnimationPlayer, Keyframe, SkeletonPose, SkinnedModel},
        render::{Camera, CameraManager, ChaseCamera, RenderQueue, Renderer, SceneCamera},
        input::{Buttons, ControlState, InputManager, KeyCode, KeyMap},
        units::{Enemy, EnemyState, Player, PlayerWeapon, TerrainUnit},
    };
}
