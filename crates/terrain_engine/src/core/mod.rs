//! # Core Engine Module
//!
//! Shared configuration for every subsystem. The structs here are plain serde
//! data with defaults matching the shipped game tuning; games embed them in
//! their own configuration files.

pub mod config;

// Re-export commonly used config types
pub use config::{
    EngineConfig,
    TerrainConfig,
    LocomotionConfig,
    ChaseCameraConfig,
    EnemyTuning,
    Config,
    ConfigError,
};
