// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::config::schedule::CronSchedule;

pub const DEFAULT_SYNC_BINARY: &str = "rclone";
pub const DEFAULT_DELETE_IGNORE_FILE: &str = "./.deleteIgnore";
pub const DEFAULT_COPY_IGNORE_FILE: &str = "./.copyIgnore";
pub const DEFAULT_JOB_NAME: &str = "cronsync";
pub const DEFAULT_TELEMETRY_ENDPOINT: &str = "https://logs.mezmo.com/logs/ingest";

/// Configuration file exactly as read from TOML.
///
/// ```toml
/// sourceDir = "/data/photos"
/// destinationDir = "remote:backup/photos"
/// filesRetention = "720h"
/// cronSchedule = "0 3 * * *"
///
/// [[notifiers]]
/// type = "slack"
/// webhook = "https://hooks.slack.com/services/..."
/// ```
///
/// Required keys are `Option`s here so that a missing key is reported by
/// validation with a readable message instead of a serde error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfigFile {
    pub source_dir: Option<String>,
    pub destination_dir: Option<String>,

    #[serde(alias = "filesRetentionAge")]
    pub files_retention: Option<String>,

    pub cron_schedule: Option<String>,

    /// Program used for both phases. Defaults to `rclone`.
    pub sync_binary: Option<String>,
    pub delete_ignore_file: Option<String>,
    pub copy_ignore_file: Option<String>,

    /// Short name used in notification text.
    pub job_name: Option<String>,

    /// Legacy single-webhook key; becomes the first Slack notifier.
    pub slack_webhook: Option<String>,

    #[serde(default)]
    pub notifiers: Vec<RawNotifier>,

    pub telemetry: Option<RawTelemetry>,
}

/// One `[[notifiers]]` entry before it is resolved into a [`NotifierSpec`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotifier {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub webhook: Option<String>,
    pub site: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<String>,
    /// Zulip stream. Wins over `channel` when both are set.
    pub to: Option<String>,
    pub channel: Option<String>,
    pub topic: Option<String>,
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTelemetry {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub hostname: Option<String>,
    pub app: Option<String>,
}

/// Validated, immutable configuration snapshot.
///
/// Produced via `ConfigFile::try_from(RawConfigFile)`; every reload builds a
/// new one and the running job only ever sees it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub files_retention: String,
    pub cron_schedule: CronSchedule,
    pub sync_binary: String,
    pub delete_ignore_file: PathBuf,
    pub copy_ignore_file: PathBuf,
    pub job_name: String,
    pub notifiers: Vec<NotifierSpec>,
    pub telemetry: Option<TelemetryConfig>,
}

/// A notification channel that will be wired into the fanout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierSpec {
    /// Slack incoming webhook.
    Slack { webhook: String },
    /// Zulip stream message.
    Zulip {
        site: String,
        email: String,
        api_key: String,
        channel: String,
        topic: Option<String>,
    },
}

impl NotifierSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            NotifierSpec::Slack { .. } => "slack",
            NotifierSpec::Zulip { .. } => "zulip",
        }
    }
}

/// Credentials and routing for the log shipping sink.
#[derive(Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub api_key: String,
    pub endpoint: String,
    pub hostname: String,
    pub app: String,
}

impl std::fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("endpoint", &self.endpoint)
            .field("hostname", &self.hostname)
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}
