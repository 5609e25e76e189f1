// src/watch/watcher.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::RuntimeEvent;

/// Handle for the config file watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `config_path` and send `RuntimeEvent::ConfigChanged` for every
/// change notification that touches it.
///
/// The parent directory is watched (non-recursively) rather than the file
/// itself, so editors that save by writing a new file and renaming it over
/// the old one are still picked up. There is no debouncing: each matching
/// notification is one reload.
pub fn spawn_config_watcher(
    config_path: impl Into<PathBuf>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let config_path = config_path.into();
    let file_name = config_path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| anyhow!("config path {:?} has no file name", config_path))?;
    let dir = watch_dir(&config_path);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("config watcher loop gone; dropping notify event");
                }
            }
            Err(err) => {
                error!(error = %err, "config file watch error");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {:?}", dir))?;

    info!("config watcher started on {:?}", config_path);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_config_change(&event, &file_name) {
                continue;
            }

            debug!(?event, "config file changed");
            if runtime_tx.send(RuntimeEvent::ConfigChanged).await.is_err() {
                debug!("runtime gone; stopping config watcher loop");
                break;
            }
        }
        debug!("config watcher loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Directory to watch for `config_path`; a bare file name means the cwd.
pub fn watch_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` is a content change of the file called `file_name`.
pub fn is_config_change(event: &Event, file_name: &OsString) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    );

    relevant_kind
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
