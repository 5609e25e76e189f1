// tests/job_handle.rs

use std::sync::Arc;
use std::time::Duration;

use cronsync::config::CronSchedule;
use cronsync::engine::JobHandle;
use cronsync::notifier::Fanout;
use cronsync::sync::SyncTask;
use cronsync_test_utils::builders::ConfigFileBuilder;
use cronsync_test_utils::fake_runner::FakeCommandRunner;
use cronsync_test_utils::{init_tracing, with_timeout};

fn every_second_job(runner: &FakeCommandRunner) -> JobHandle {
    let cfg = ConfigFileBuilder::new().schedule("* * * * * *").build();
    let schedule = cfg.cron_schedule.clone();
    let task = SyncTask::new(
        Arc::new(cfg),
        Arc::new(runner.clone()),
        Arc::new(Fanout::default()),
    );
    JobHandle::start(1, schedule, Arc::new(task))
}

#[tokio::test]
async fn fires_delete_and_copy_on_every_tick() {
    init_tracing();
    with_timeout(async {
        let runner = FakeCommandRunner::new();
        let mut job = every_second_job(&runner);

        tokio::time::sleep(Duration::from_millis(2300)).await;
        job.stop();

        let phases: Vec<_> = runner.calls().into_iter().map(|argv| argv[0].clone()).collect();
        assert!(phases.len() >= 2, "expected at least one full run: {phases:?}");
        for pair in phases.chunks(2) {
            assert_eq!(pair[0], "delete");
            if pair.len() == 2 {
                assert_eq!(pair[1], "copy");
            }
        }
    })
    .await;
}

#[tokio::test]
async fn slow_runs_do_not_overlap() {
    init_tracing();
    with_timeout(async {
        // Each phase takes longer than the one-second period.
        let runner = FakeCommandRunner::new().with_delay(Duration::from_millis(800));
        let mut job = every_second_job(&runner);

        tokio::time::sleep(Duration::from_millis(4500)).await;
        job.stop();

        let phases: Vec<_> = runner.calls().into_iter().map(|argv| argv[0].clone()).collect();
        let expected: Vec<_> = ["delete", "copy"]
            .iter()
            .cycle()
            .take(phases.len())
            .map(|p| p.to_string())
            .collect();
        assert_eq!(phases, expected, "phases strictly alternate");
        assert!(phases.len() <= 6, "missed fires are skipped, not queued: {phases:?}");
    })
    .await;
}

#[tokio::test]
async fn stop_is_idempotent_and_halts_future_fires() {
    init_tracing();
    with_timeout(async {
        let runner = FakeCommandRunner::new();
        let mut job = every_second_job(&runner);
        assert!(!job.is_stopped());

        job.stop();
        job.stop();
        assert!(job.is_stopped());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(runner.calls().is_empty());
        assert!(job.is_finished());
    })
    .await;
}

#[tokio::test]
async fn in_flight_run_completes_after_stop() {
    init_tracing();
    with_timeout(async {
        let runner = FakeCommandRunner::new().with_delay(Duration::from_millis(400));
        let mut job = every_second_job(&runner);

        // Wait until the first run is in its delete phase.
        while runner.calls().is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        job.stop();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let phases: Vec<_> = runner.calls().into_iter().map(|argv| argv[0].clone()).collect();
        assert_eq!(phases, vec!["delete", "copy"]);
        assert!(job.is_finished());
    })
    .await;
}

#[test]
fn schedule_reports_next_fire_after_a_given_instant() {
    let schedule = CronSchedule::parse("0 * * * *").unwrap();
    let now = chrono::Local::now();
    let next = schedule.next_after(&now).unwrap();
    assert!(next > now);
    assert!(next - now <= chrono::Duration::hours(1));
}
