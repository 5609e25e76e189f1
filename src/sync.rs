// src/sync.rs

//! One sync run: prune the destination, then mirror the source into it.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::ConfigFile;
use crate::exec::{CommandResult, CommandRunner, OUTPUT_TAIL_LEN};
use crate::notifier::Fanout;
use crate::types::SyncPhase;

/// Failure reports keep only this many trailing output chunks.
pub const MAX_REPORTED_CHUNKS: usize = OUTPUT_TAIL_LEN;

pub const FAILURE_TOPIC: &str = "sync failure";

/// Argument vector of the prune phase.
pub fn delete_args(config: &ConfigFile) -> Vec<String> {
    vec![
        "delete".to_string(),
        "--min-age".to_string(),
        config.files_retention.clone(),
        "--exclude-from".to_string(),
        config.delete_ignore_file.display().to_string(),
        config.destination_dir.display().to_string(),
    ]
}

/// Argument vector of the mirror phase.
pub fn copy_args(config: &ConfigFile) -> Vec<String> {
    vec![
        "copy".to_string(),
        "--exclude-from".to_string(),
        config.copy_ignore_file.display().to_string(),
        config.source_dir.display().to_string(),
        config.destination_dir.display().to_string(),
    ]
}

/// Both phase results of one run.
#[derive(Debug, Clone)]
pub struct SyncRunReport {
    pub delete: CommandResult,
    pub copy: CommandResult,
}

impl SyncRunReport {
    pub fn success(&self) -> bool {
        self.delete.success() && self.copy.success()
    }
}

/// The unit of work fired on every tick.
pub struct SyncTask {
    config: Arc<ConfigFile>,
    runner: Arc<dyn CommandRunner>,
    fanout: Arc<Fanout>,
}

impl std::fmt::Debug for SyncTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTask")
            .field("source", &self.config.source_dir)
            .field("destination", &self.config.destination_dir)
            .field("fanout", &self.fanout)
            .finish_non_exhaustive()
    }
}

impl SyncTask {
    pub fn new(
        config: Arc<ConfigFile>,
        runner: Arc<dyn CommandRunner>,
        fanout: Arc<Fanout>,
    ) -> Self {
        Self {
            config,
            runner,
            fanout,
        }
    }

    /// Run delete then copy. The copy phase starts once delete has finished,
    /// whatever its outcome. Never fails; failures are reported instead.
    pub async fn run(&self) -> SyncRunReport {
        info!(job = %self.config.job_name, "sync run started");

        let delete = self.run_phase(SyncPhase::Delete, delete_args(&self.config)).await;
        let copy = self.run_phase(SyncPhase::Copy, copy_args(&self.config)).await;

        let report = SyncRunReport { delete, copy };
        info!(
            job = %self.config.job_name,
            success = report.success(),
            "sync run finished"
        );
        report
    }

    async fn run_phase(&self, phase: SyncPhase, args: Vec<String>) -> CommandResult {
        let result = self.runner.run(args).await;

        if result.success() {
            info!(%phase, "phase succeeded");
        } else {
            error!(%phase, status = %result.status, "phase failed");
            let message = failure_message(&self.config.job_name, phase, &result);
            self.fanout.broadcast(&message, Some(FAILURE_TOPIC)).await;
        }

        result
    }
}

/// Text of the notification sent when a phase fails.
///
/// ```text
/// [backup] error while copying - exit code: 1
/// ```
/// followed by the (tail of the) captured output in a code block.
pub fn failure_message(job_name: &str, phase: SyncPhase, result: &CommandResult) -> String {
    let mut message = format!(
        "[{job_name}] {} - {}",
        phase.failure_message(),
        result.status
    );

    if result.output.is_empty() {
        message.push_str("\n(no output captured)");
        return message;
    }

    let skipped = result.output.len().saturating_sub(MAX_REPORTED_CHUNKS);
    let omitted = result.omitted + skipped;
    message.push_str("\n```\n");
    if omitted > 0 {
        message.push_str(&format!("... {omitted} earlier lines omitted\n"));
    }
    for chunk in &result.output[skipped..] {
        message.push_str(&format!("[{}] {}\n", chunk.stream, chunk.text));
    }
    message.push_str("```");
    message
}
