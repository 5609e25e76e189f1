// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The sync task talks to a `CommandRunner` instead of spawning processes
//! itself. This makes it easy to swap in a fake runner in tests while keeping
//! the production implementation in [`runner`](super::runner).

use std::future::Future;
use std::pin::Pin;

use super::CommandResult;
use super::runner::run_command;

/// Trait abstracting how the sync tool is invoked.
///
/// Implementations never fail: spawn errors and non-zero exits are both
/// reported through [`CommandResult::status`].
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        args: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>>;
}

/// Runs the configured program (usually `rclone`) as a child process.
#[derive(Debug, Clone)]
pub struct RealCommandRunner {
    program: String,
}

impl RealCommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CommandRunner for RealCommandRunner {
    fn run<'a>(
        &'a self,
        args: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>> {
        Box::pin(run_command(&self.program, args))
    }
}
