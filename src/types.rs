// src/types.rs

use std::fmt;

/// Which pipe of the sync tool a captured chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTag {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamTag::Stdout => f.write_str("stdout"),
            StreamTag::Stderr => f.write_str("stderr"),
        }
    }
}

/// The two phases of a sync run, in the order they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Prune files older than the retention age from the destination.
    Delete,
    /// Mirror the source directory into the destination.
    Copy,
}

impl SyncPhase {
    /// Lead-in used for the failure notification of this phase.
    pub fn failure_message(self) -> &'static str {
        match self {
            SyncPhase::Delete => "error while deleting",
            SyncPhase::Copy => "error while copying",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Delete => f.write_str("delete"),
            SyncPhase::Copy => f.write_str("copy"),
        }
    }
}
