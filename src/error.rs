//! Error types.
//!
//! Errors only surface while wiring things up (loading configuration, building
//! the combat engine). The per-frame update never returns an error.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CombatError {
    #[error("detection range must be positive, got {0}")]
    InvalidDetectionRange(f32),

    #[error("{name} duration must be non-zero")]
    ZeroDuration { name: &'static str },

    #[error("projectile speed must be positive, got {0}")]
    InvalidProjectileSpeed(f32),

    #[error("cascade step limit must be non-zero")]
    ZeroCascadeLimit,
}
