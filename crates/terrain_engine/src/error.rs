//! Engine error types
//!
//! Construction-time validation is the only fallible part of the engine.
//! Per-frame updates never fail: out-of-range queries return sentinels or
//! `None`, and commands sent to dead units are ignored.

use thiserror::Error;

use crate::config::ConfigError;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing collaborator or data, or tunables out of range
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Imported data breaks a structural rule (bone order, array lengths)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Height samples that cannot form a grid
    #[error("Invalid height field: {0}")]
    InvalidHeightField(String),

    /// Requested animation clip is not in the skeleton's library
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),

    /// Configuration file could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used by engine constructors
pub type EngineResult<T> = Result<T, EngineError>;
