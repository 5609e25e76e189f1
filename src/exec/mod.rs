// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the external sync tool,
//! using `tokio::process::Command`, streaming its output into the log and
//! handing back a [`CommandResult`].
//!
//! - [`runner`] spawns one process and captures stdout/stderr as they arrive.
//! - [`backend`] provides the `CommandRunner` trait and the concrete
//!   `RealCommandRunner` used in production, which tests replace with a fake.

pub mod backend;
pub mod runner;

use std::fmt;

use crate::types::StreamTag;

pub use backend::{CommandRunner, RealCommandRunner};
pub use runner::run_command;

/// One line of output, tagged with the pipe it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: StreamTag,
    pub text: String,
}

impl OutputChunk {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: StreamTag::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: StreamTag::Stderr,
            text: text.into(),
        }
    }
}

/// How the process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Normal exit with a status code.
    Exited(i32),
    /// Killed by a signal (the number, when the platform reports one).
    Signaled(Option<i32>),
    /// The process could not be started or waited on.
    SpawnFailed(String),
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Exited(code) => write!(f, "exit code: {code}"),
            CommandStatus::Signaled(Some(sig)) => write!(f, "terminated by signal {sig}"),
            CommandStatus::Signaled(None) => f.write_str("terminated by signal"),
            CommandStatus::SpawnFailed(reason) => write!(f, "failed to launch: {reason}"),
        }
    }
}

/// Number of trailing output lines kept per invocation.
pub const OUTPUT_TAIL_LEN: usize = 40;

/// Outcome of one sync tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub args: Vec<String>,
    /// The last lines of output, in arrival order.
    pub output: Vec<OutputChunk>,
    /// Lines that arrived before `output` and were not kept.
    pub omitted: usize,
    pub status: CommandStatus,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        matches!(self.status, CommandStatus::Exited(0))
    }

    /// Every line the process printed, kept or not.
    pub fn total_lines(&self) -> usize {
        self.omitted + self.output.len()
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            CommandStatus::Exited(code) => Some(code),
            _ => None,
        }
    }
}
