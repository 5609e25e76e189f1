// src/engine/mod.rs

//! Orchestration engine for cronsync.
//!
//! This module ties together:
//! - the lifecycle state machine (no job / running epoch N)
//! - the per-epoch runtime context (config, notification channels, job)
//! - the cron timer that fires sync runs
//! - the main runtime event loop that reacts to:
//!   - config file changes
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Events flowing into the runtime from the watcher and signal handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The config file changed on disk (or is being loaded for the first time).
    ConfigChanged,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod context;
pub mod core;
pub mod job;
pub mod runtime;

pub use context::{BackendFactory, HttpBackends, PreparedContext, RuntimeContext};
pub use core::{CoreCommand, CoreEvent, CoreRuntime, CoreStep, LifecycleState};
pub use job::JobHandle;
pub use runtime::Runtime;
