// src/logging.rs

//! Logging setup for `cronsync` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CRONSYNC_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! The output sink sits behind a `reload` layer so every config reload can
//! swap it: console (stderr) by default, or the telemetry forwarder when the
//! config carries telemetry credentials.

use anyhow::{anyhow, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Layer, Registry};

use crate::cli::LogLevel;
use crate::config::TelemetryConfig;
use crate::telemetry;

/// Type-erased sink installed in the reload slot.
pub type BoxedSink = Box<dyn Layer<Registry> + Send + Sync>;

/// Handle used to swap the active sink after startup.
#[derive(Clone)]
pub struct LogHandle {
    handle: reload::Handle<BoxedSink, Registry>,
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle").finish_non_exhaustive()
    }
}

impl LogHandle {
    /// Build the sink a config asks for without installing it.
    ///
    /// Must be called from within a Tokio runtime when telemetry is
    /// configured, since the forwarder spawns its shipping task.
    pub fn build_sink(telemetry: Option<&TelemetryConfig>) -> Result<BoxedSink> {
        match telemetry {
            Some(cfg) => telemetry::telemetry_sink(cfg),
            None => Ok(console_sink()),
        }
    }

    /// Replace the active sink. Later log calls go to `sink`.
    pub fn install(&self, sink: BoxedSink) -> Result<()> {
        self.handle
            .reload(sink)
            .map_err(|e| anyhow!("swapping log sink: {e}"))
    }
}

/// Initialise global logging subscriber with the console sink.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<LogHandle> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("CRONSYNC_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let (sink, handle) = reload::Layer::new(console_sink());

    tracing_subscriber::registry()
        .with(sink)
        .with(LevelFilter::from_level(level))
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    Ok(LogHandle { handle })
}

/// Plain console output on stderr; keeps stdout free for `--dry-run` output.
pub fn console_sink() -> BoxedSink {
    fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .boxed()
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
