// src/engine/job.rs

//! The cron-triggered timer that fires the sync task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CronSchedule;
use crate::sync::SyncTask;

/// Handle for one scheduled job.
///
/// The timer runs in its own Tokio task. Each tick awaits a full sync run
/// before the next fire time is computed, so ticks of one job never overlap;
/// fire times that pass while a run is in flight are skipped.
///
/// Dropping the handle stops the job the same way [`JobHandle::stop`] does.
pub struct JobHandle {
    epoch: u64,
    schedule: CronSchedule,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("epoch", &self.epoch)
            .field("schedule", &self.schedule)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl JobHandle {
    /// Start firing `task` on `schedule`.
    pub fn start(epoch: u64, schedule: CronSchedule, task: Arc<SyncTask>) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let timer_schedule = schedule.clone();

        let handle = tokio::spawn(async move {
            run_timer(epoch, timer_schedule, task, stop_rx).await;
        });

        info!(epoch, schedule = %schedule, "job started");

        Self {
            epoch,
            schedule,
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        self.schedule.next_fire()
    }

    /// Cancel future fires. A run that is already executing finishes.
    ///
    /// Calling this more than once is a no-op.
    pub fn stop(&mut self) {
        match self.stop_tx.take() {
            Some(tx) => {
                if tx.send(()).is_err() {
                    debug!(epoch = self.epoch, "job timer already finished while stopping");
                }
                info!(epoch = self.epoch, "job stopped");
            }
            None => debug!(epoch = self.epoch, "job already stopped"),
        }
    }

    /// True once `stop` was called (or the timer ran out of fire times).
    pub fn is_stopped(&self) -> bool {
        self.stop_tx.is_none() || self.handle.is_finished()
    }

    /// True once the timer task has fully exited, including any in-flight run.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run_timer(
    epoch: u64,
    schedule: CronSchedule,
    task: Arc<SyncTask>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut last_fire: Option<DateTime<Local>> = None;

    loop {
        let now = Local::now();
        let from = match last_fire {
            Some(last) if last > now => last,
            _ => now,
        };
        let Some(next) = schedule.next_after(&from) else {
            warn!(epoch, schedule = %schedule, "cron expression has no future fire time; job idle");
            break;
        };

        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(epoch, next = %next, "waiting for next tick");

        // A dropped sender ends the timer as well.
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = tokio::time::sleep(wait) => {}
        }

        last_fire = Some(next);
        info!(epoch, "tick");
        task.run().await;
    }

    debug!(epoch, "job timer finished");
}
