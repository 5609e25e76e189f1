// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod notifier;
pub mod sync;
pub mod telemetry;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigCache, ConfigFile};
use crate::engine::{BackendFactory, HttpBackends, PreparedContext, Runtime, RuntimeEvent};
use crate::fs::RealFileSystem;
use crate::logging::LogHandle;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - runtime (lifecycle core + IO shell)
/// - config file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs, log_handle: LogHandle) -> Result<()> {
    let config_path = PathBuf::from(&args.config);

    if args.dry_run {
        let cfg = load_and_validate(&config_path)?;
        print_dry_run(&cfg);
        return Ok(());
    }

    let backends = HttpBackends::new()?;

    if args.once {
        let cfg = Arc::new(load_and_validate(&config_path)?);
        return run_once(cfg, &backends, &log_handle).await;
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _watcher_handle = crate::watch::spawn_config_watcher(&config_path, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Seed the initial load; later loads come from the watcher.
    rt_tx.send(RuntimeEvent::ConfigChanged).await?;

    let cache = ConfigCache::new(config_path, Arc::new(RealFileSystem));
    let runtime = Runtime::new(cache, backends, Some(log_handle), rt_rx);
    runtime.run().await?;
    Ok(())
}

/// `--once`: one sync run right now, failing the process if a phase failed.
async fn run_once(
    cfg: Arc<ConfigFile>,
    backends: &dyn BackendFactory,
    log_handle: &LogHandle,
) -> Result<()> {
    log_handle.install(LogHandle::build_sink(cfg.telemetry.as_ref())?)?;

    let prepared = PreparedContext::build(cfg, backends, &RealFileSystem);
    let report = prepared.task.run().await;

    if report.success() {
        info!("one-off sync finished successfully");
        Ok(())
    } else {
        Err(anyhow!(
            "sync failed (delete: {}, copy: {})",
            report.delete.status,
            report.copy.status
        ))
    }
}

/// Simple dry-run output: schedule, notifiers and both command lines.
fn print_dry_run(cfg: &ConfigFile) {
    println!("cronsync dry-run");
    println!("  job: {}", cfg.job_name);
    println!("  schedule: {}", cfg.cron_schedule);
    match cfg.cron_schedule.next_fire() {
        Some(next) => println!("  next run: {}", next.format("%Y-%m-%d %H:%M:%S %:z")),
        None => println!("  next run: never"),
    }
    println!();

    println!("notifiers ({}):", cfg.notifiers.len());
    for spec in cfg.notifiers.iter() {
        println!("  - {}", spec.kind());
    }
    if let Some(ref telemetry) = cfg.telemetry {
        println!("telemetry: {} (app {})", telemetry.endpoint, telemetry.app);
    }
    println!();

    println!("commands:");
    println!("  {} {}", cfg.sync_binary, crate::sync::delete_args(cfg).join(" "));
    println!("  {} {}", cfg.sync_binary, crate::sync::copy_args(cfg).join(" "));

    debug!("dry-run complete (no execution)");
}
