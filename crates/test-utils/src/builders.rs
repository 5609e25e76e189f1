#![allow(dead_code)]

use cronsync::config::{ConfigFile, RawConfigFile, RawNotifier};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the canonical `/a` → `/b`, `24h`, hourly config.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                source_dir: Some("/a".to_string()),
                destination_dir: Some("/b".to_string()),
                files_retention: Some("24h".to_string()),
                cron_schedule: Some("0 * * * *".to_string()),
                ..Default::default()
            },
        }
    }

    pub fn source_dir(mut self, dir: &str) -> Self {
        self.config.source_dir = Some(dir.to_string());
        self
    }

    pub fn destination_dir(mut self, dir: &str) -> Self {
        self.config.destination_dir = Some(dir.to_string());
        self
    }

    pub fn retention(mut self, age: &str) -> Self {
        self.config.files_retention = Some(age.to_string());
        self
    }

    pub fn schedule(mut self, expr: &str) -> Self {
        self.config.cron_schedule = Some(expr.to_string());
        self
    }

    pub fn job_name(mut self, name: &str) -> Self {
        self.config.job_name = Some(name.to_string());
        self
    }

    pub fn with_slack(mut self, webhook: &str) -> Self {
        self.config.notifiers.push(RawNotifier {
            kind: Some("slack".to_string()),
            webhook: Some(webhook.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_zulip(mut self, site: &str, channel: &str) -> Self {
        self.config.notifiers.push(RawNotifier {
            kind: Some("zulip".to_string()),
            site: Some(site.to_string()),
            email: Some("bot@example.com".to_string()),
            api_key: Some("secret".to_string()),
            channel: Some(channel.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a config as TOML text, the way a user would write it.
pub fn config_toml(source: &str, destination: &str, schedule: &str, webhooks: &[&str]) -> String {
    let mut text = format!(
        "sourceDir = \"{source}\"\n\
         destinationDir = \"{destination}\"\n\
         filesRetention = \"24h\"\n\
         cronSchedule = \"{schedule}\"\n"
    );
    for webhook in webhooks {
        text.push_str(&format!("\n[[notifiers]]\ntype = \"slack\"\nwebhook = \"{webhook}\"\n"));
    }
    text
}
