// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CronsyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid cron schedule '{expr}': {reason}")]
    CronError { expr: String, reason: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CronsyncError>;
