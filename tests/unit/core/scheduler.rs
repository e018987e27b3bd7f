use chrono::Utc;
use cron::Schedule;
use scm_pulse::core::scheduler::{cron_expression, SnapshotRefresher};
use scm_pulse::data::{Dataset, InMemorySource, SnapshotStore};
use std::str::FromStr;
use std::sync::Arc;

/// Seconds between the next few firings of the schedule for `interval`
fn tick_gaps(interval: u64, ticks: usize) -> Vec<i64> {
    let schedule = Schedule::from_str(&cron_expression(interval).unwrap()).unwrap();
    let upcoming: Vec<_> = schedule.upcoming(Utc).take(ticks + 1).collect();
    upcoming.windows(2).map(|w| (w[1] - w[0]).num_seconds()).collect()
}

#[test]
fn cron_expression_matches_interval_unit() {
    assert_eq!(cron_expression(15).unwrap(), "*/15 * * * * *");
    assert_eq!(cron_expression(300).unwrap(), "0 */5 * * * *");
    assert_eq!(cron_expression(7200).unwrap(), "0 0 */2 * * *");
    assert_eq!(cron_expression(86400).unwrap(), "0 0 0 * * *");
}

#[test]
fn ticks_are_evenly_spaced() {
    for interval in [1, 15, 30, 60, 300, 900, 3600, 7200, 21600, 86400] {
        let gaps = tick_gaps(interval, 6);
        assert!(
            gaps.iter().all(|&gap| gap == interval as i64),
            "interval {} fired with gaps {:?}",
            interval,
            gaps
        );
    }
}

#[test]
fn intervals_that_do_not_divide_their_unit_are_rejected() {
    for interval in [45, 90, 420, 5400, 18000, 43201, 86401, 172800] {
        assert!(cron_expression(interval).is_err(), "{} should be rejected", interval);
    }
}

#[test]
fn zero_interval_is_rejected() {
    assert!(cron_expression(0).is_err());

    let store = Arc::new(SnapshotStore::empty());
    let source = Arc::new(InMemorySource::new(Dataset::new()));
    assert!(SnapshotRefresher::new(store, source, 0).is_err());
}

#[tokio::test]
async fn start_and_stop_toggle_running_state() {
    let store = Arc::new(SnapshotStore::empty());
    let source = Arc::new(InMemorySource::new(Dataset::new()));
    let refresher = SnapshotRefresher::new(store, source, 30).unwrap();
    assert_eq!(refresher.cron_expr(), "*/30 * * * * *");

    assert!(!refresher.is_running().await);
    refresher.start().await;
    assert!(refresher.is_running().await);
    refresher.stop().await;
    assert!(!refresher.is_running().await);
}

#[tokio::test]
async fn ticks_reload_the_snapshot() {
    let store = Arc::new(SnapshotStore::empty());
    let source = Arc::new(InMemorySource::new(Dataset::new().with_rejected_rows(7)));
    let refresher = SnapshotRefresher::new(store.clone(), source, 1).unwrap();

    refresher.start().await;
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(5);
    while store.current().rejected_rows != 7 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
    refresher.stop().await;

    assert_eq!(store.current().rejected_rows, 7);
}
