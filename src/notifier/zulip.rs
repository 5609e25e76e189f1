// src/notifier/zulip.rs

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result, bail};

use super::NotificationChannel;

pub const DEFAULT_TOPIC: &str = "cronsync";

/// Zulip stream message via `POST <site>/api/v1/messages`.
pub struct ZulipStream {
    client: reqwest::Client,
    url: String,
    email: String,
    api_key: String,
    channel: String,
    default_topic: Option<String>,
}

impl ZulipStream {
    pub fn new(
        client: reqwest::Client,
        site: &str,
        email: &str,
        api_key: &str,
        channel: &str,
        default_topic: Option<String>,
    ) -> Self {
        Self {
            client,
            url: format!("{}/api/v1/messages", site.trim_end_matches('/')),
            email: email.to_string(),
            api_key: api_key.to_string(),
            channel: channel.to_string(),
            default_topic,
        }
    }

    /// An explicit broadcast topic wins over the configured one.
    fn topic<'a>(&'a self, topic: Option<&'a str>) -> &'a str {
        topic
            .or(self.default_topic.as_deref())
            .unwrap_or(DEFAULT_TOPIC)
    }
}

impl NotificationChannel for ZulipStream {
    fn kind(&self) -> &'static str {
        "zulip"
    }

    fn deliver<'a>(
        &'a self,
        text: &'a str,
        topic: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let form = [
                ("type", "stream"),
                ("to", self.channel.as_str()),
                ("topic", self.topic(topic)),
                ("content", text),
            ];

            let response = self
                .client
                .post(&self.url)
                .basic_auth(&self.email, Some(&self.api_key))
                .form(&form)
                .send()
                .await
                .context("posting zulip message")?;

            if !response.status().is_success() {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                bail!("zulip returned {status}: {detail}");
            }
            Ok(())
        })
    }
}
