// src/config/loader.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

/// Read and deserialize the TOML at `path` through `fs`, without validation.
pub fn load_from_fs(fs: &dyn FileSystem, path: &Path) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Checks required keys, the retention age and the cron expression.
/// - Resolves `[[notifiers]]` entries, skipping ones it cannot use.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    load_and_validate_from_fs(&RealFileSystem, path.as_ref())
}

pub fn load_and_validate_from_fs(fs: &dyn FileSystem, path: &Path) -> Result<ConfigFile> {
    let raw_config = load_from_fs(fs, path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}
