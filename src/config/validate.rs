// src/config/validate.rs

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::config::model::{
    ConfigFile, NotifierSpec, RawConfigFile, RawNotifier, RawTelemetry, TelemetryConfig,
    DEFAULT_COPY_IGNORE_FILE, DEFAULT_DELETE_IGNORE_FILE, DEFAULT_JOB_NAME, DEFAULT_SYNC_BINARY,
    DEFAULT_TELEMETRY_ENDPOINT,
};
use crate::config::schedule::CronSchedule;
use crate::errors::{CronsyncError, Result};

/// rclone duration syntax, e.g. `720h`, `30d`, `1w2d`, `1.5h`.
static RETENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(\.\d+)?(ms|s|m|h|d|w|M|y))+$").expect("static regex is valid")
});

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CronsyncError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let source_dir = required(raw.source_dir, "sourceDir")?;
        let destination_dir = required(raw.destination_dir, "destinationDir")?;
        let files_retention = required(raw.files_retention, "filesRetention")?;
        let cron_expr = required(raw.cron_schedule, "cronSchedule")?;

        validate_retention(&files_retention)?;
        let cron_schedule = CronSchedule::parse(&cron_expr)?;

        let mut notifiers = Vec::new();
        if let Some(webhook) = non_empty(raw.slack_webhook) {
            notifiers.push(NotifierSpec::Slack { webhook });
        }
        notifiers.extend(
            raw.notifiers
                .into_iter()
                .enumerate()
                .filter_map(|(idx, n)| resolve_notifier(idx, n)),
        );

        let telemetry = raw.telemetry.map(resolve_telemetry).transpose()?;

        Ok(ConfigFile {
            source_dir: PathBuf::from(source_dir),
            destination_dir: PathBuf::from(destination_dir),
            files_retention,
            cron_schedule,
            sync_binary: non_empty(raw.sync_binary)
                .unwrap_or_else(|| DEFAULT_SYNC_BINARY.to_string()),
            delete_ignore_file: PathBuf::from(
                non_empty(raw.delete_ignore_file)
                    .unwrap_or_else(|| DEFAULT_DELETE_IGNORE_FILE.to_string()),
            ),
            copy_ignore_file: PathBuf::from(
                non_empty(raw.copy_ignore_file)
                    .unwrap_or_else(|| DEFAULT_COPY_IGNORE_FILE.to_string()),
            ),
            job_name: non_empty(raw.job_name).unwrap_or_else(|| DEFAULT_JOB_NAME.to_string()),
            notifiers,
            telemetry,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| {
        CronsyncError::ConfigError(format!("`{key}` is required and must not be empty"))
    })
}

fn validate_retention(retention: &str) -> Result<()> {
    if retention == "off" || RETENTION_RE.is_match(retention) {
        return Ok(());
    }
    Err(CronsyncError::ConfigError(format!(
        "`filesRetention` must be a duration like \"720h\" or \"30d\" (got \"{retention}\")"
    )))
}

/// Turn a raw `[[notifiers]]` entry into a spec.
///
/// Entries with an unknown or missing `type`, or missing the fields their type
/// needs, are skipped rather than failing the whole config.
fn resolve_notifier(idx: usize, raw: RawNotifier) -> Option<NotifierSpec> {
    let kind = raw.kind.as_deref().map(|k| k.trim().to_lowercase());

    match kind.as_deref() {
        Some("slack") => match non_empty(raw.webhook) {
            Some(webhook) => Some(NotifierSpec::Slack { webhook }),
            None => {
                warn!(notifier = idx, "slack notifier without `webhook`; skipping");
                None
            }
        },
        Some("zulip") => {
            let site = non_empty(raw.site);
            let email = non_empty(raw.email);
            let api_key = non_empty(raw.api_key);
            let channel = match (non_empty(raw.to), non_empty(raw.channel)) {
                (Some(to), Some(channel)) => {
                    if to != channel {
                        warn!(notifier = idx, %to, %channel, "zulip notifier sets both `to` and `channel`; using `to`");
                    }
                    Some(to)
                }
                (to, channel) => to.or(channel),
            };
            match (site, email, api_key, channel) {
                (Some(site), Some(email), Some(api_key), Some(channel)) => {
                    Some(NotifierSpec::Zulip {
                        site: site.trim_end_matches('/').to_string(),
                        email,
                        api_key,
                        channel,
                        topic: non_empty(raw.topic),
                    })
                }
                _ => {
                    warn!(
                        notifier = idx,
                        "zulip notifier needs `site`, `email`, `apiKey` and `to` (or `channel`); skipping"
                    );
                    None
                }
            }
        }
        other => {
            warn!(notifier = idx, kind = ?other, "unknown notifier type; skipping");
            None
        }
    }
}

fn resolve_telemetry(raw: RawTelemetry) -> Result<TelemetryConfig> {
    let api_key = non_empty(raw.api_key).ok_or_else(|| {
        CronsyncError::ConfigError("[telemetry].apiKey must be set when [telemetry] is present".to_string())
    })?;

    Ok(TelemetryConfig {
        api_key,
        endpoint: non_empty(raw.endpoint)
            .unwrap_or_else(|| DEFAULT_TELEMETRY_ENDPOINT.to_string()),
        hostname: non_empty(raw.hostname).unwrap_or_else(|| DEFAULT_JOB_NAME.to_string()),
        app: non_empty(raw.app).unwrap_or_else(|| DEFAULT_JOB_NAME.to_string()),
    })
}
