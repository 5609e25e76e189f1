// src/notifier/slack.rs

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result, bail};
use serde_json::json;

use super::NotificationChannel;

/// Slack incoming webhook: `POST <webhook>` with `{"text": ...}`.
///
/// Webhooks have no notion of topic, so a topic is rendered as a bold first line.
pub struct SlackWebhook {
    client: reqwest::Client,
    webhook: String,
}

impl SlackWebhook {
    pub fn new(client: reqwest::Client, webhook: impl Into<String>) -> Self {
        Self {
            client,
            webhook: webhook.into(),
        }
    }

    fn render(text: &str, topic: Option<&str>) -> String {
        match topic {
            Some(topic) => format!("*{topic}*\n{text}"),
            None => text.to_string(),
        }
    }
}

impl NotificationChannel for SlackWebhook {
    fn kind(&self) -> &'static str {
        "slack"
    }

    fn deliver<'a>(
        &'a self,
        text: &'a str,
        topic: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let body = json!({ "text": Self::render(text, topic) });
            let response = self
                .client
                .post(&self.webhook)
                .json(&body)
                .send()
                .await
                .context("posting to slack webhook")?;

            if !response.status().is_success() {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                bail!("slack webhook returned {status}: {detail}");
            }
            Ok(())
        })
    }
}
