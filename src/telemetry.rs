// src/telemetry.rs

//! Line-oriented log forwarding to an HTTP ingest endpoint.
//!
//! [`TelemetryLayer`] turns each tracing event into one [`TelemetryLine`] and
//! pushes it onto a channel; a background task drains the channel in batches
//! and POSTs them as `{"lines": [...]}`. When the layer is swapped out on a
//! reload its sender is dropped, the shipper flushes what is left and exits.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::config::TelemetryConfig;
use crate::logging::BoxedSink;

const BATCH_SIZE: usize = 256;
const SHIP_TIMEOUT: Duration = Duration::from_secs(10);

/// Targets whose events are never forwarded: shipping them would feed the
/// shipper's own HTTP traffic back into itself.
const MUTED_TARGETS: &[&str] = &["reqwest", "hyper", "h2", "rustls"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryLine {
    pub timestamp: i64,
    pub level: String,
    pub app: String,
    pub line: String,
}

#[derive(Debug, Serialize)]
struct IngestBody<'a> {
    lines: &'a [TelemetryLine],
}

/// Tracing layer that forwards formatted events to a channel.
#[derive(Debug, Clone)]
pub struct TelemetryLayer {
    app: String,
    tx: mpsc::UnboundedSender<TelemetryLine>,
}

impl TelemetryLayer {
    pub fn new(app: impl Into<String>, tx: mpsc::UnboundedSender<TelemetryLine>) -> Self {
        Self { app: app.into(), tx }
    }
}

impl<S: Subscriber> Layer<S> for TelemetryLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if MUTED_TARGETS
            .iter()
            .any(|muted| meta.target().starts_with(muted))
        {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = TelemetryLine {
            timestamp: Utc::now().timestamp_millis(),
            level: meta.level().to_string(),
            app: self.app.clone(),
            line: format!("{}: {}", meta.target(), visitor.finish()),
        };
        // Receiver gone means the shipper exited; nothing left to do.
        let _ = self.tx.send(line);
    }
}

/// Renders `message` first, then the remaining fields as `key=value`.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Build the telemetry sink and spawn its shipper.
pub fn telemetry_sink(cfg: &TelemetryConfig) -> Result<BoxedSink> {
    let client = reqwest::Client::builder()
        .timeout(SHIP_TIMEOUT)
        .build()
        .context("building HTTP client for telemetry")?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(ship_lines(client, cfg.clone(), rx));

    let sink: BoxedSink = Box::new(TelemetryLayer::new(cfg.app.clone(), tx));
    Ok(sink)
}

/// Drain `rx` in batches until every sender is gone.
pub async fn ship_lines(
    client: reqwest::Client,
    cfg: TelemetryConfig,
    mut rx: mpsc::UnboundedReceiver<TelemetryLine>,
) {
    let mut batch = Vec::with_capacity(BATCH_SIZE);
    loop {
        let received = rx.recv_many(&mut batch, BATCH_SIZE).await;
        if received == 0 {
            break;
        }

        // Shipping errors cannot be traced: that would enqueue more lines.
        if let Err(err) = post_batch(&client, &cfg, &batch).await {
            eprintln!("cronsync: failed to ship {} log lines: {err:#}", batch.len());
        }
        batch.clear();
    }
}

async fn post_batch(
    client: &reqwest::Client,
    cfg: &TelemetryConfig,
    lines: &[TelemetryLine],
) -> Result<()> {
    let response = client
        .post(&cfg.endpoint)
        .basic_auth(&cfg.api_key, None::<&str>)
        .query(&[("hostname", cfg.hostname.as_str())])
        .json(&IngestBody { lines })
        .send()
        .await
        .context("posting log lines")?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("ingest endpoint returned {status}");
    }
    Ok(())
}
