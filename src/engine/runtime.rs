// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ConfigCache;
use crate::errors::Result;
use crate::logging::{BoxedSink, LogHandle};

use super::context::{BackendFactory, PreparedContext, RuntimeContext};
use super::core::{CoreCommand, CoreEvent, CoreRuntime, LifecycleState};
use super::job::JobHandle;
use super::RuntimeEvent;

const SCHEDULE_TOPIC: &str = "schedule";

/// Drives the lifecycle state machine in response to `RuntimeEvent`s.
///
/// This is the IO shell around `CoreRuntime`: it reloads the config, builds
/// the next context, swaps the log sink and starts/stops jobs as the core
/// instructs. Events are handled one at a time, so reloads never race each
/// other and at most one job is ever live.
pub struct Runtime<B: BackendFactory> {
    core: CoreRuntime,
    cache: ConfigCache,
    backends: B,
    log_handle: Option<LogHandle>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    active: Option<RuntimeContext>,
    pending: Option<(PreparedContext, Option<BoxedSink>)>,
}

impl<B: BackendFactory> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("cache", &self.cache)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<B: BackendFactory> Runtime<B> {
    /// `log_handle` is `None` when the process-wide subscriber is not ours to
    /// swap (tests).
    pub fn new(
        cache: ConfigCache,
        backends: B,
        log_handle: Option<LogHandle>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            core: CoreRuntime::new(),
            cache,
            backends,
            log_handle,
            event_rx,
            active: None,
            pending: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.core.state()
    }

    pub fn active_context(&self) -> Option<&RuntimeContext> {
        self.active.as_ref()
    }

    pub fn active_job(&self) -> Option<&JobHandle> {
        self.active.as_ref().map(|ctx| &ctx.job)
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Reloads the config and feeds the outcome into the core.
    /// - Executes commands returned by the core (stop, start, announce).
    pub async fn run(mut self) -> Result<()> {
        info!("cronsync runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    self.handle_event(RuntimeEvent::ShutdownRequested).await;
                    break;
                }
            };

            debug!(?event, "runtime received event");

            if !self.handle_event(event).await {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Handle one event; returns whether the loop should keep running.
    pub async fn handle_event(&mut self, event: RuntimeEvent) -> bool {
        let core_event = match event {
            RuntimeEvent::ConfigChanged => self.reload(),
            RuntimeEvent::ShutdownRequested => CoreEvent::ShutdownRequested,
        };

        let step = self.core.step(core_event);
        for command in step.commands {
            self.execute_command(command).await;
        }
        step.keep_running
    }

    /// Invalidate, re-parse and prepare the next context.
    ///
    /// Any failure is logged and reported as `ReloadFailed`, which leaves the
    /// current job alone.
    fn reload(&mut self) -> CoreEvent {
        self.cache.invalidate();

        let config = match self.cache.get_or_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(
                    path = ?self.cache.path(),
                    error = %err,
                    "config reload failed; keeping the current job"
                );
                return CoreEvent::ReloadFailed;
            }
        };

        let sink = match &self.log_handle {
            Some(_) => match LogHandle::build_sink(config.telemetry.as_ref()) {
                Ok(sink) => Some(sink),
                Err(err) => {
                    error!(error = %format!("{err:#}"), "building log sink failed; keeping the current job");
                    return CoreEvent::ReloadFailed;
                }
            },
            None => None,
        };

        let prepared = PreparedContext::build(config, &self.backends, self.cache.fs().as_ref());
        self.pending = Some((prepared, sink));
        CoreEvent::ContextReady
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::StopJob { epoch } => match self.active.as_mut() {
                Some(ctx) if ctx.epoch == epoch => ctx.job.stop(),
                _ => warn!(epoch, "no active job for this epoch to stop"),
            },
            CoreCommand::StartJob { epoch } => {
                let Some((prepared, sink)) = self.pending.take() else {
                    warn!(epoch, "start requested without a prepared context");
                    return;
                };

                if let (Some(handle), Some(sink)) = (&self.log_handle, sink) {
                    if let Err(err) = handle.install(sink) {
                        error!(error = %format!("{err:#}"), "failed to swap log sink");
                    }
                }

                // Replacing drops the previous context; its timer is already
                // stopped and an in-flight run keeps its own references.
                self.active = Some(prepared.start(epoch));
                info!(epoch, "configuration epoch active");
            }
            CoreCommand::AnnounceSchedule { epoch } => {
                let Some(ctx) = self.active.as_ref().filter(|ctx| ctx.epoch == epoch) else {
                    return;
                };
                let notice = ctx.schedule_notice();
                info!(epoch, "{}", notice);
                ctx.fanout.broadcast(&notice, Some(SCHEDULE_TOPIC)).await;
            }
        }
    }
}
