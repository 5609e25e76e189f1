// src/watch/mod.rs

//! Config file watching.
//!
//! Turns filesystem notifications about the config file into
//! `RuntimeEvent::ConfigChanged`. It does **not** parse anything; the runtime
//! invalidates its `ConfigCache` and reloads on each event.

pub mod watcher;

pub use watcher::{spawn_config_watcher, WatcherHandle};
