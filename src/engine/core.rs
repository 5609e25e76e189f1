// src/engine/core.rs

//! Pure lifecycle state machine.
//!
//! The core decides *what* happens on each reload outcome; the async shell
//! (`engine::runtime::Runtime`) does the IO: reading the config, building the
//! new context, stopping and starting timers, sending notifications.
//!
//! The core has no Tokio types, no channels and no IO, so it is unit tested
//! directly.

/// Whether a job is currently scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NoJob,
    Running { epoch: u64 },
}

/// Outcome of one reload attempt (or a shutdown request), as seen by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    /// A new config was parsed and its context fully built.
    ContextReady,
    /// The config could not be loaded or the context could not be built.
    ReloadFailed,
    ShutdownRequested,
}

/// Command produced by the core, to be executed by the outer IO shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Stop the currently scheduled job (future fires only).
    StopJob { epoch: u64 },
    /// Install the freshly built context under `epoch` and start its job.
    StartJob { epoch: u64 },
    /// Announce the new schedule on the notification channels.
    AnnounceSchedule { epoch: u64 },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct CoreRuntime {
    state: LifecycleState,
    last_epoch: u64,
}

impl Default for CoreRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreRuntime {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::NoJob,
            last_epoch: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn step(&mut self, event: CoreEvent) -> CoreStep {
        match event {
            CoreEvent::ContextReady => {
                let mut commands = Vec::new();
                if let LifecycleState::Running { epoch } = self.state {
                    commands.push(CoreCommand::StopJob { epoch });
                }

                self.last_epoch += 1;
                let epoch = self.last_epoch;
                commands.push(CoreCommand::StartJob { epoch });
                commands.push(CoreCommand::AnnounceSchedule { epoch });
                self.state = LifecycleState::Running { epoch };

                CoreStep {
                    commands,
                    keep_running: true,
                }
            }
            // The previous job, if any, keeps running untouched.
            CoreEvent::ReloadFailed => CoreStep {
                commands: Vec::new(),
                keep_running: true,
            },
            CoreEvent::ShutdownRequested => {
                let mut commands = Vec::new();
                if let LifecycleState::Running { epoch } = self.state {
                    commands.push(CoreCommand::StopJob { epoch });
                }
                self.state = LifecycleState::NoJob;
                CoreStep {
                    commands,
                    keep_running: false,
                }
            }
        }
    }
}
