// src/notifier/mod.rs

//! Outbound notifications.
//!
//! Every configured notifier becomes one [`NotificationChannel`]; the
//! [`Fanout`] delivers a message to all of them and swallows per-channel
//! failures so that reporting can never take the sync job down.

pub mod fanout;
pub mod slack;
pub mod zulip;

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::config::NotifierSpec;

pub use fanout::{BroadcastSummary, Fanout};
pub use slack::SlackWebhook;
pub use zulip::ZulipStream;

/// A place messages can be delivered to.
pub trait NotificationChannel: Send + Sync {
    /// Stable channel kind (e.g. `slack`, `zulip`), used in logs.
    fn kind(&self) -> &'static str;

    /// Deliver `text`, optionally under `topic`. One attempt, no retry.
    fn deliver<'a>(
        &'a self,
        text: &'a str,
        topic: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Build the HTTP-backed channel for a spec, sharing `client`.
pub fn channel_from_spec(
    spec: &NotifierSpec,
    client: &reqwest::Client,
) -> Box<dyn NotificationChannel> {
    match spec {
        NotifierSpec::Slack { webhook } => Box::new(SlackWebhook::new(client.clone(), webhook)),
        NotifierSpec::Zulip {
            site,
            email,
            api_key,
            channel,
            topic,
        } => Box::new(ZulipStream::new(
            client.clone(),
            site,
            email,
            api_key,
            channel,
            topic.clone(),
        )),
    }
}
