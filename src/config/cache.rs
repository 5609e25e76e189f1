// src/config/cache.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::loader::load_and_validate_from_fs;
use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::fs::FileSystem;

/// Last successfully parsed snapshot of one config file.
///
/// The watcher invalidates it on every change notification; the next
/// [`ConfigCache::get_or_load`] re-reads and re-validates the file from
/// scratch and hands out a brand-new `Arc<ConfigFile>`.
#[derive(Debug)]
pub struct ConfigCache {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    cached: Option<Arc<ConfigFile>>,
}

impl ConfigCache {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Get the snapshot, parsing the file if nothing is cached.
    ///
    /// On error the cache stays empty.
    pub fn get_or_load(&mut self) -> Result<Arc<ConfigFile>> {
        if let Some(cfg) = &self.cached {
            return Ok(Arc::clone(cfg));
        }

        debug!("cache miss: parsing config {:?}", self.path);
        let cfg = Arc::new(load_and_validate_from_fs(self.fs.as_ref(), &self.path)?);
        self.cached = Some(Arc::clone(&cfg));
        Ok(cfg)
    }

    /// Drop the cached snapshot (e.g. on change).
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            debug!("invalidated cached config for {:?}", self.path);
        }
    }
}
