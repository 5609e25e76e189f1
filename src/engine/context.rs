// src/engine/context.rs

//! Everything one configuration epoch owns, and how it is built.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tracing::{info, warn};

use crate::config::{ConfigFile, NotifierSpec};
use crate::engine::job::JobHandle;
use crate::errors::Result;
use crate::exec::{CommandRunner, RealCommandRunner};
use crate::fs::FileSystem;
use crate::notifier::{Fanout, NotificationChannel, channel_from_spec};
use crate::sync::SyncTask;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds the IO-facing collaborators of a context.
///
/// Production code uses [`HttpBackends`]; tests provide fakes that record
/// invocations instead of spawning processes or talking HTTP.
pub trait BackendFactory: Send + Sync {
    fn command_runner(&self, config: &ConfigFile) -> Arc<dyn CommandRunner>;
    fn notification_channel(&self, spec: &NotifierSpec) -> Box<dyn NotificationChannel>;
}

/// Real processes and real HTTP channels sharing one `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpBackends {
    client: reqwest::Client,
}

impl HttpBackends {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("building HTTP client for notifications")?;
        Ok(Self { client })
    }
}

impl BackendFactory for HttpBackends {
    fn command_runner(&self, config: &ConfigFile) -> Arc<dyn CommandRunner> {
        Arc::new(RealCommandRunner::new(config.sync_binary.clone()))
    }

    fn notification_channel(&self, spec: &NotifierSpec) -> Box<dyn NotificationChannel> {
        channel_from_spec(spec, &self.client)
    }
}

/// A fully built epoch that has not been started yet.
#[derive(Debug)]
pub struct PreparedContext {
    pub config: Arc<ConfigFile>,
    pub fanout: Arc<Fanout>,
    pub task: Arc<SyncTask>,
}

impl PreparedContext {
    pub fn build(config: Arc<ConfigFile>, backends: &dyn BackendFactory, fs: &dyn FileSystem) -> Self {
        for ignore_file in [&config.delete_ignore_file, &config.copy_ignore_file] {
            if !fs.is_file(ignore_file) {
                warn!(file = ?ignore_file, "exclude file not found; the sync tool will report it");
            }
        }

        let channels = config
            .notifiers
            .iter()
            .map(|spec| backends.notification_channel(spec))
            .collect();
        let fanout = Arc::new(Fanout::new(channels));
        let runner = backends.command_runner(&config);
        let task = Arc::new(SyncTask::new(
            Arc::clone(&config),
            runner,
            Arc::clone(&fanout),
        ));

        info!(
            schedule = %config.cron_schedule,
            notifiers = fanout.len(),
            "context prepared"
        );

        Self {
            config,
            fanout,
            task,
        }
    }

    /// Start the job and turn this into the live context of `epoch`.
    pub fn start(self, epoch: u64) -> RuntimeContext {
        let job = JobHandle::start(
            epoch,
            self.config.cron_schedule.clone(),
            Arc::clone(&self.task),
        );
        RuntimeContext {
            epoch,
            config: self.config,
            fanout: self.fanout,
            job,
        }
    }
}

/// The live epoch: config snapshot, its notification channels and its job.
#[derive(Debug)]
pub struct RuntimeContext {
    pub epoch: u64,
    pub config: Arc<ConfigFile>,
    pub fanout: Arc<Fanout>,
    pub job: JobHandle,
}

impl RuntimeContext {
    /// Notice broadcast whenever a job (re)starts.
    pub fn schedule_notice(&self) -> String {
        let next = match self.job.next_fire() {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
            None => "never".to_string(),
        };
        format!(
            "[{}] sync {} -> {} scheduled with `{}`, next run at {}",
            self.config.job_name,
            self.config.source_dir.display(),
            self.config.destination_dir.display(),
            self.config.cron_schedule,
            next
        )
    }
}
