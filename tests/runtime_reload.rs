// tests/runtime_reload.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use cronsync::config::ConfigCache;
use cronsync::engine::{LifecycleState, Runtime, RuntimeEvent};
use cronsync::fs::mock::MockFileSystem;
use cronsync_test_utils::builders::config_toml;
use cronsync_test_utils::fake_notifier::FakeBackends;
use cronsync_test_utils::{init_tracing, with_timeout};

const CONFIG_PATH: &str = "/etc/cronsync.toml";
const EVERY_SECOND: &str = "* * * * * *";

struct Harness {
    fs: MockFileSystem,
    backends: FakeBackends,
    runtime: Runtime<FakeBackends>,
    _tx: mpsc::Sender<RuntimeEvent>,
}

fn harness(initial: Option<String>) -> Harness {
    let fs = MockFileSystem::new();
    if let Some(text) = initial {
        fs.add_file(CONFIG_PATH, text);
    }
    let backends = FakeBackends::new();
    let cache = ConfigCache::new(CONFIG_PATH, Arc::new(fs.clone()));
    let (tx, rx) = mpsc::channel(8);
    let runtime = Runtime::new(cache, backends.clone(), None, rx);
    Harness {
        fs,
        backends,
        runtime,
        _tx: tx,
    }
}

fn destinations(calls: &[Vec<String>]) -> Vec<String> {
    calls
        .iter()
        .filter_map(|argv| argv.last().cloned())
        .collect()
}

#[tokio::test]
async fn first_load_starts_job_and_announces_schedule() {
    init_tracing();
    with_timeout(async {
        let mut h = harness(Some(config_toml("/a", "/b", "0 * * * *", &["https://x"])));

        assert!(h.runtime.handle_event(RuntimeEvent::ConfigChanged).await);
        assert_eq!(h.runtime.state(), LifecycleState::Running { epoch: 1 });

        let deliveries = h.backends.deliveries.all();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].channel, "https://x");
        assert_eq!(deliveries[0].topic.as_deref(), Some("schedule"));
        assert!(deliveries[0].text.contains("/a -> /b"));
        assert!(deliveries[0].text.contains("`0 * * * *`"));
        assert!(deliveries[0].text.contains("next run at"));
    })
    .await;
}

#[tokio::test]
async fn reload_replaces_the_job() {
    init_tracing();
    with_timeout(async {
        let mut h = harness(Some(config_toml("/a", "/b", EVERY_SECOND, &[])));
        h.runtime.handle_event(RuntimeEvent::ConfigChanged).await;

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(
            destinations(&h.backends.runner.calls()).iter().any(|d| d == "/b"),
            "first job fired"
        );

        h.fs.add_file(CONFIG_PATH, config_toml("/a", "/c", EVERY_SECOND, &[]));
        assert!(h.runtime.handle_event(RuntimeEvent::ConfigChanged).await);
        assert_eq!(h.runtime.state(), LifecycleState::Running { epoch: 2 });
        assert_eq!(h.runtime.active_job().map(|j| j.epoch()), Some(2));

        tokio::time::sleep(Duration::from_millis(50)).await;
        h.backends.runner.clear_calls();
        tokio::time::sleep(Duration::from_millis(2200)).await;

        let dests = destinations(&h.backends.runner.calls());
        assert!(!dests.is_empty(), "new job fired");
        assert!(dests.iter().all(|d| d == "/c"), "only the new job fires: {dests:?}");
    })
    .await;
}

#[tokio::test]
async fn invalid_reload_keeps_the_previous_job() {
    init_tracing();
    with_timeout(async {
        let mut h = harness(Some(config_toml("/a", "/b", EVERY_SECOND, &["https://x"])));
        h.runtime.handle_event(RuntimeEvent::ConfigChanged).await;
        assert_eq!(h.backends.deliveries.all().len(), 1);

        h.fs.add_file(CONFIG_PATH, config_toml("/a", "/c", "not a cron", &["https://x"]));
        assert!(h.runtime.handle_event(RuntimeEvent::ConfigChanged).await);
        assert_eq!(h.runtime.state(), LifecycleState::Running { epoch: 1 });

        h.backends.runner.clear_calls();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let dests = destinations(&h.backends.runner.calls());
        assert!(!dests.is_empty());
        assert!(dests.iter().all(|d| d == "/b"));
        assert_eq!(h.backends.deliveries.all().len(), 1, "no new schedule notice");
    })
    .await;
}

#[tokio::test]
async fn deleted_config_keeps_the_running_job() {
    init_tracing();
    with_timeout(async {
        let mut h = harness(Some(config_toml("/a", "/b", EVERY_SECOND, &[])));
        h.runtime.handle_event(RuntimeEvent::ConfigChanged).await;

        h.fs.remove_file(CONFIG_PATH);
        assert!(h.runtime.handle_event(RuntimeEvent::ConfigChanged).await);
        assert_eq!(h.runtime.state(), LifecycleState::Running { epoch: 1 });
        assert!(h.runtime.active_job().is_some_and(|job| !job.is_stopped()));

        h.backends.runner.clear_calls();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(destinations(&h.backends.runner.calls()).iter().any(|d| d == "/b"));
    })
    .await;
}

#[tokio::test]
async fn missing_initial_config_waits_for_a_valid_one() {
    init_tracing();
    with_timeout(async {
        let mut h = harness(None);

        assert!(h.runtime.handle_event(RuntimeEvent::ConfigChanged).await);
        assert_eq!(h.runtime.state(), LifecycleState::NoJob);
        assert!(h.runtime.active_context().is_none());

        h.fs.add_file(CONFIG_PATH, config_toml("/a", "/b", "0 * * * *", &[]));
        h.runtime.handle_event(RuntimeEvent::ConfigChanged).await;
        assert_eq!(h.runtime.state(), LifecycleState::Running { epoch: 1 });
    })
    .await;
}

#[tokio::test]
async fn each_epoch_notifies_its_own_channels() {
    init_tracing();
    with_timeout(async {
        let mut h = harness(Some(config_toml("/a", "/b", "0 * * * *", &["https://old"])));
        h.runtime.handle_event(RuntimeEvent::ConfigChanged).await;

        h.fs.add_file(
            CONFIG_PATH,
            config_toml("/a", "/b", "0 * * * *", &["https://new-1", "https://new-2"]),
        );
        h.runtime.handle_event(RuntimeEvent::ConfigChanged).await;

        let channels: Vec<_> = h
            .backends
            .deliveries
            .all()
            .into_iter()
            .map(|d| d.channel)
            .collect();
        assert_eq!(channels, vec!["https://old", "https://new-1", "https://new-2"]);
    })
    .await;
}

#[tokio::test]
async fn shutdown_stops_the_job_and_exits() {
    init_tracing();
    with_timeout(async {
        let mut h = harness(Some(config_toml("/a", "/b", EVERY_SECOND, &[])));
        h.runtime.handle_event(RuntimeEvent::ConfigChanged).await;

        assert!(!h.runtime.handle_event(RuntimeEvent::ShutdownRequested).await);
        assert_eq!(h.runtime.state(), LifecycleState::NoJob);
        assert!(h.runtime.active_job().is_some_and(|job| job.is_stopped()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        h.backends.runner.clear_calls();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(h.backends.runner.calls().is_empty());
    })
    .await;
}

#[tokio::test]
async fn run_loop_exits_on_shutdown_event() {
    init_tracing();
    with_timeout(async {
        let fs = MockFileSystem::new();
        fs.add_file(CONFIG_PATH, config_toml("/a", "/b", "0 * * * *", &[]));
        let cache = ConfigCache::new(CONFIG_PATH, Arc::new(fs));
        let (tx, rx) = mpsc::channel(8);
        let runtime = Runtime::new(cache, FakeBackends::new(), None, rx);

        tx.send(RuntimeEvent::ConfigChanged).await.unwrap();
        tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

        runtime.run().await.unwrap();
    })
    .await;
}
