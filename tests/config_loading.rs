// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::NamedTempFile;

use cronsync::config::{load_and_validate, ConfigCache, NotifierSpec};
use cronsync::errors::CronsyncError;
use cronsync::fs::mock::MockFileSystem;
use cronsync_test_utils::builders::config_toml;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_the_reference_config() {
    let file = write_config(&config_toml("/a", "/b", "0 * * * *", &["https://x"]));

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.source_dir, PathBuf::from("/a"));
    assert_eq!(cfg.destination_dir, PathBuf::from("/b"));
    assert_eq!(cfg.files_retention, "24h");
    assert_eq!(cfg.cron_schedule.expr(), "0 * * * *");
    assert_eq!(
        cfg.notifiers,
        vec![NotifierSpec::Slack { webhook: "https://x".into() }]
    );
}

#[test]
fn loads_every_optional_key() {
    let file = write_config(
        r#"
sourceDir = "/data"
destinationDir = "remote:backup"
filesRetentionAge = "30d"
cronSchedule = "*/30 * * * * *"
syncBinary = "/usr/local/bin/rclone"
deleteIgnoreFile = "/etc/cronsync/delete.ignore"
copyIgnoreFile = "/etc/cronsync/copy.ignore"
jobName = "photos"
slackWebhook = "https://legacy"

[[notifiers]]
type = "zulip"
site = "https://chat.example.com"
email = "bot@example.com"
apiKey = "k"
to = "ops"
topic = "backups"

[[notifiers]]
type = "carrier-pigeon"

[telemetry]
apiKey = "ingest-key"
hostname = "nas"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.files_retention, "30d");
    assert_eq!(cfg.sync_binary, "/usr/local/bin/rclone");
    assert_eq!(cfg.job_name, "photos");
    assert_eq!(cfg.notifiers.len(), 2);
    assert_eq!(cfg.notifiers[0].kind(), "slack");
    assert_eq!(
        cfg.notifiers[1],
        NotifierSpec::Zulip {
            site: "https://chat.example.com".into(),
            email: "bot@example.com".into(),
            api_key: "k".into(),
            channel: "ops".into(),
            topic: Some("backups".into()),
        }
    );

    let telemetry = cfg.telemetry.unwrap();
    assert_eq!(telemetry.api_key, "ingest-key");
    assert_eq!(telemetry.hostname, "nas");
    assert_eq!(telemetry.app, "cronsync");
    assert!(telemetry.endpoint.starts_with("https://"));
}

#[test]
fn zulip_entry_with_both_to_and_channel_loads() {
    let mut text = config_toml("/a", "/b", "0 * * * *", &[]);
    text.push_str(
        r#"
[[notifiers]]
type = "zulip"
site = "https://chat.example.com"
email = "bot@example.com"
apiKey = "k"
to = "ops"
channel = "backups"
"#,
    );
    let file = write_config(&text);

    let cfg = load_and_validate(file.path()).unwrap();

    match &cfg.notifiers[..] {
        [NotifierSpec::Zulip { channel, .. }] => assert_eq!(channel, "ops"),
        other => panic!("expected one zulip notifier, got {other:?}"),
    }
}

#[test]
fn zulip_entry_with_only_channel_loads() {
    let mut text = config_toml("/a", "/b", "0 * * * *", &[]);
    text.push_str(
        r#"
[[notifiers]]
type = "zulip"
site = "https://chat.example.com"
email = "bot@example.com"
apiKey = "k"
channel = "backups"
"#,
    );
    let file = write_config(&text);

    let cfg = load_and_validate(file.path()).unwrap();
    assert!(matches!(
        &cfg.notifiers[..],
        [NotifierSpec::Zulip { channel, .. }] if channel == "backups"
    ));
}

#[test]
fn missing_cron_schedule_is_a_config_error() {
    let file = write_config(
        r#"
sourceDir = "/a"
destinationDir = "/b"
filesRetention = "24h"
"#,
    );

    match load_and_validate(file.path()) {
        Err(CronsyncError::ConfigError(msg)) => assert!(msg.contains("cronSchedule")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn invalid_cron_expression_is_reported() {
    let file = write_config(&config_toml("/a", "/b", "61 * * * *", &[]));

    match load_and_validate(file.path()) {
        Err(CronsyncError::CronError { expr, .. }) => assert_eq!(expr, "61 * * * *"),
        other => panic!("expected CronError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_reported() {
    let file = write_config("sourceDir = \"/a\"\ncronSchedule = [");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(CronsyncError::TomlError(_))
    ));
}

#[test]
fn cache_serves_snapshot_until_invalidated() {
    let fs = MockFileSystem::new();
    fs.add_file("/etc/cronsync.toml", config_toml("/a", "/b", "0 * * * *", &[]));

    let mut cache = ConfigCache::new("/etc/cronsync.toml", Arc::new(fs.clone()));
    let first = cache.get_or_load().unwrap();

    fs.add_file("/etc/cronsync.toml", config_toml("/a", "/c", "0 * * * *", &[]));
    let still_cached = cache.get_or_load().unwrap();
    assert!(Arc::ptr_eq(&first, &still_cached));

    cache.invalidate();
    let reloaded = cache.get_or_load().unwrap();
    assert_eq!(reloaded.destination_dir, PathBuf::from("/c"));
    assert_eq!(first.destination_dir, PathBuf::from("/b"), "old snapshot is untouched");
}

#[test]
fn cache_stays_empty_after_a_failed_load() {
    let fs = MockFileSystem::new();
    let mut cache = ConfigCache::new("/etc/cronsync.toml", Arc::new(fs.clone()));
    assert!(cache.get_or_load().is_err());

    fs.add_file("/etc/cronsync.toml", config_toml("/a", "/b", "0 * * * *", &[]));
    assert!(cache.get_or_load().is_ok());
}
