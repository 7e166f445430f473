//! Scheduler timing on a paused tokio clock.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{Harness, fast_config};
use watcher::models::ScheduleConfig;
use watcher::pipeline::Scheduler;

fn schedule(interval_secs: u64, initial_delay_secs: u64, run_on_start: bool) -> ScheduleConfig {
    ScheduleConfig {
        interval_secs,
        initial_delay_secs,
        run_on_start,
    }
}

#[tokio::test(start_paused = true)]
async fn runs_on_start_then_every_interval() {
    let harness = Harness::with_listings(&["A"]);
    let handle = Scheduler::new(harness.runner(&fast_config()), schedule(300, 20, true)).start();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.snapshot.calls(), 1);

    // Warm-up delay, then a full interval before the next cycle
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(harness.snapshot.calls(), 1);
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(harness.snapshot.calls(), 2);
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(harness.snapshot.calls(), 3);

    handle.stop().await;

    // Later cycles saw nothing new
    assert_eq!(harness.sink.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn first_tick_waits_for_initial_delay_when_not_running_on_start() {
    let harness = Harness::with_listings(&["A"]);
    let handle = Scheduler::new(harness.runner(&fast_config()), schedule(300, 20, false)).start();

    tokio::time::sleep(Duration::from_secs(19)).await;
    assert_eq!(harness.snapshot.calls(), 0);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.snapshot.calls(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn slow_cycles_never_overlap_or_burst() {
    let harness = Harness::with_listings(&["A"]);
    harness
        .snapshot
        .set_delay(Some(Duration::from_secs(700)));
    let handle = Scheduler::new(harness.runner(&fast_config()), schedule(300, 0, false)).start();

    tokio::time::sleep(Duration::from_secs(1_000)).await;
    handle.stop().await;

    // Missed ticks at 300 and 600 are coalesced, not replayed back to back
    let calls = harness.snapshot.calls();
    assert!((2..=3).contains(&calls), "unexpected call count {calls}");
    assert_eq!(harness.snapshot.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_cycles_do_not_stop_the_loop() {
    let harness = Harness::with_listings(&[]);
    let handle = Scheduler::new(harness.runner(&fast_config()), schedule(60, 0, true)).start();

    tokio::time::sleep(Duration::from_secs(121)).await;
    assert!(!handle.is_finished());
    assert!(harness.snapshot.calls() >= 3);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_drops_the_in_flight_cycle() {
    let harness = Harness::with_listings(&["A"]);
    harness
        .snapshot
        .set_delay(Some(Duration::from_secs(10_000)));
    let handle = Scheduler::new(harness.runner(&fast_config()), schedule(300, 0, true)).start();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(harness.snapshot.calls(), 1);
    handle.stop().await;

    assert!(harness.events().is_empty());
    assert!(harness.sink.messages().is_empty());
}
