// src/notifier/fanout.rs

use tracing::{debug, error};

use super::NotificationChannel;

/// Counts from one [`Fanout::broadcast`]. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastSummary {
    pub attempted: usize,
    pub delivered: usize,
}

impl BroadcastSummary {
    pub fn failed(&self) -> usize {
        self.attempted - self.delivered
    }
}

/// All notification channels of one configuration epoch.
#[derive(Default)]
pub struct Fanout {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl std::fmt::Debug for Fanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<_> = self.channels.iter().map(|c| c.kind()).collect();
        f.debug_struct("Fanout").field("channels", &kinds).finish()
    }
}

impl Fanout {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver `message` to every channel, in configured order.
    ///
    /// A failing channel is logged and skipped; it never stops delivery to
    /// the remaining channels and never turns into an error for the caller.
    pub async fn broadcast(&self, message: &str, topic: Option<&str>) -> BroadcastSummary {
        let mut summary = BroadcastSummary::default();

        for (idx, channel) in self.channels.iter().enumerate() {
            summary.attempted += 1;
            match channel.deliver(message, topic).await {
                Ok(()) => {
                    summary.delivered += 1;
                    debug!(channel = channel.kind(), idx, "notification delivered");
                }
                Err(err) => {
                    error!(
                        channel = channel.kind(),
                        idx,
                        error = %format!("{err:#}"),
                        "notification delivery failed"
                    );
                }
            }
        }

        summary
    }
}
