// tests/fanout.rs

use cronsync_test_utils::fake_notifier::{DeliveryLog, RecordingChannel};
use cronsync_test_utils::init_tracing;

use cronsync::notifier::{Fanout, NotificationChannel};
use proptest::prelude::*;

fn channels(failing: &[bool], log: &DeliveryLog) -> Vec<Box<dyn NotificationChannel>> {
    failing
        .iter()
        .enumerate()
        .map(|(i, &fail)| {
            let name = format!("ch{i}");
            let channel: Box<dyn NotificationChannel> = if fail {
                Box::new(RecordingChannel::failing(&name, log.clone()))
            } else {
                Box::new(RecordingChannel::new(&name, log.clone()))
            };
            channel
        })
        .collect()
}

#[tokio::test]
async fn failing_channel_does_not_stop_the_others() {
    init_tracing();
    let log = DeliveryLog::new();
    let fanout = Fanout::new(channels(&[false, true, false], &log));

    let summary = fanout.broadcast("backup failed", Some("sync failure")).await;

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.delivered, 2);
    assert_eq!(summary.failed(), 1);

    let order: Vec<_> = log.all().into_iter().map(|d| d.channel).collect();
    assert_eq!(order, vec!["ch0", "ch1", "ch2"]);
    assert!(log
        .all()
        .iter()
        .all(|d| d.text == "backup failed" && d.topic.as_deref() == Some("sync failure")));
}

#[tokio::test]
async fn zero_channels_is_a_no_op() {
    let fanout = Fanout::default();
    assert!(fanout.is_empty());

    let summary = fanout.broadcast("nobody listens", None).await;
    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.delivered, 0);
}

proptest! {
    #[test]
    fn broadcast_attempts_every_channel(failing in proptest::collection::vec(any::<bool>(), 0..8)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let log = DeliveryLog::new();
        let fanout = Fanout::new(channels(&failing, &log));
        let summary = rt.block_on(fanout.broadcast("msg", None));

        prop_assert_eq!(summary.attempted, failing.len());
        prop_assert_eq!(summary.delivered, failing.iter().filter(|f| !**f).count());
        prop_assert_eq!(log.all().len(), failing.len());
    }
}
