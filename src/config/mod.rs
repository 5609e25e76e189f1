// src/config/mod.rs

//! Configuration: TOML model, validation, cron parsing and the reload cache.
//!
//! - [`model`] holds both the raw serde view and the validated [`ConfigFile`].
//! - [`validate`] implements `TryFrom<RawConfigFile> for ConfigFile`.
//! - [`schedule`] wraps the cron expression parser.
//! - [`cache`] keeps the last parsed snapshot until the watcher invalidates it.

pub mod cache;
pub mod loader;
pub mod model;
pub mod schedule;
pub mod validate;

pub use cache::ConfigCache;
pub use loader::{load_and_validate, load_and_validate_from_fs, load_from_fs};
pub use model::{ConfigFile, NotifierSpec, RawConfigFile, RawNotifier, RawTelemetry, TelemetryConfig};
pub use schedule::CronSchedule;
