use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use cronsync::config::{ConfigFile, NotifierSpec};
use cronsync::engine::BackendFactory;
use cronsync::exec::CommandRunner;
use cronsync::notifier::NotificationChannel;

use crate::fake_runner::FakeCommandRunner;

/// One recorded delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: String,
    pub text: String,
    pub topic: Option<String>,
}

/// Shared log of delivery attempts across several channels.
#[derive(Debug, Clone, Default)]
pub struct DeliveryLog {
    inner: Arc<Mutex<Vec<Delivery>>>,
}

impl DeliveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Delivery> {
        self.inner.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.all().into_iter().map(|d| d.text).collect()
    }

    fn push(&self, delivery: Delivery) {
        self.inner.lock().unwrap().push(delivery);
    }
}

/// A channel that records every attempt and optionally fails it.
pub struct RecordingChannel {
    name: String,
    fail: bool,
    log: DeliveryLog,
}

impl RecordingChannel {
    pub fn new(name: &str, log: DeliveryLog) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            log,
        }
    }

    pub fn failing(name: &str, log: DeliveryLog) -> Self {
        Self {
            name: name.to_string(),
            fail: true,
            log,
        }
    }
}

impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> &'static str {
        "recording"
    }

    fn deliver<'a>(
        &'a self,
        text: &'a str,
        topic: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.log.push(Delivery {
                channel: self.name.clone(),
                text: text.to_string(),
                topic: topic.map(str::to_string),
            });
            if self.fail {
                bail!("channel {} is down", self.name);
            }
            Ok(())
        })
    }
}

/// Backends for runtime tests: every context shares one fake runner and every
/// notifier becomes a [`RecordingChannel`] writing to one log.
///
/// A Slack spec whose webhook contains `fail` yields a failing channel.
#[derive(Clone, Default)]
pub struct FakeBackends {
    pub runner: FakeCommandRunner,
    pub deliveries: DeliveryLog,
}

impl FakeBackends {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackendFactory for FakeBackends {
    fn command_runner(&self, _config: &ConfigFile) -> Arc<dyn CommandRunner> {
        Arc::new(self.runner.clone())
    }

    fn notification_channel(&self, spec: &NotifierSpec) -> Box<dyn NotificationChannel> {
        let name = match spec {
            NotifierSpec::Slack { webhook } => webhook.clone(),
            NotifierSpec::Zulip { channel, .. } => channel.clone(),
        };
        if name.contains("fail") {
            Box::new(RecordingChannel::failing(&name, self.deliveries.clone()))
        } else {
            Box::new(RecordingChannel::new(&name, self.deliveries.clone()))
        }
    }
}
