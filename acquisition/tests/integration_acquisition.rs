use acquisition::{AcquisitionConfig, LinkStatus};
use link::mock::{MockLink, MockStep};
use std::time::{Duration, Instant};

const VALID_A: &str = "45.0,6200,120.5,30.2,78,33,OK";
const VALID_B: &str = "46.5,6300,121.0,30.0,77,34,OK";

/// Polls `condition` until it holds or the deadline passes.
fn wait_for(condition: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn publishes_parsed_snapshots_while_streaming() {
    let mock = MockLink::new([MockStep::Line(VALID_A)]);
    let handle = acquisition::spawn(mock, AcquisitionConfig::default());
    let store = handle.store();

    assert!(wait_for(
        || store.current().is_some(),
        Duration::from_secs(5)
    ));
    let snapshot = store.current().unwrap();
    assert_eq!(snapshot.speed, 45.0);
    assert_eq!(snapshot.rpm, 6200.0);
    assert_eq!(snapshot.error, "OK");
    assert_eq!(store.status(), LinkStatus::Streaming);

    handle.shutdown();
}

#[test]
fn no_snapshot_before_the_first_valid_record() {
    let mock = MockLink::new([]);
    let handle = acquisition::spawn(mock, AcquisitionConfig::default());
    let store = handle.store();

    std::thread::sleep(Duration::from_millis(50));
    assert!(store.current().is_none());

    handle.shutdown();
}

#[test]
fn malformed_records_leave_the_previous_snapshot_in_place() {
    let mock = MockLink::new([
        MockStep::Line(VALID_A),
        MockStep::Line("12 55"),
        MockStep::Line("45.0,notanumber,120.5,30.2,78,33,OK"),
        MockStep::Line("45.0,6200,120.5,30.2,140,33,OK"),
    ]);
    let handle = acquisition::spawn(mock, AcquisitionConfig::default());
    let store = handle.store();

    assert!(wait_for(
        || store.current().is_some(),
        Duration::from_secs(5)
    ));
    // Give the loop time to chew through the malformed tail.
    std::thread::sleep(Duration::from_millis(100));

    let snapshot = store.current().unwrap();
    assert_eq!(snapshot.speed, 45.0);
    assert_eq!(store.status(), LinkStatus::Streaming);

    handle.shutdown();
}

#[test]
fn reconnects_and_resumes_after_a_lost_link() {
    let mock = MockLink::new([
        MockStep::Line(VALID_A),
        MockStep::Closed,
        MockStep::Line(VALID_B),
    ]);
    let handle = acquisition::spawn(mock.clone(), AcquisitionConfig::default());
    let store = handle.store();

    assert!(wait_for(
        || store
            .current()
            .is_some_and(|snapshot| snapshot.speed == 46.5),
        Duration::from_secs(5)
    ));
    assert_eq!(store.status(), LinkStatus::Streaming);
    assert_eq!(mock.open_attempts(), 2);

    handle.shutdown();
}

#[test]
fn binary_blocks_flow_through_the_same_loop() {
    let block = telemetry::encode_block(45.0, 6200.0, 120.5, 30.2, 78.0, 33.0, 0x02).to_vec();
    let mock = MockLink::new([MockStep::Block(block)]);
    let handle = acquisition::spawn(mock, AcquisitionConfig::default());
    let store = handle.store();

    assert!(wait_for(
        || store.current().is_some(),
        Duration::from_secs(5)
    ));
    let snapshot = store.current().unwrap();
    assert_eq!(snapshot.soc, 78.0);
    assert_eq!(snapshot.error, "OVERTEMP");

    handle.shutdown();
}

#[test]
fn exhausted_retry_budget_goes_fatal() {
    let mock = MockLink::new([MockStep::FailOpen, MockStep::FailOpen, MockStep::FailOpen]);
    let handle = acquisition::spawn(
        mock.clone(),
        AcquisitionConfig { max_retries: 2 },
    );
    let store = handle.store();

    assert!(wait_for(
        || store.status() == LinkStatus::Fatal,
        Duration::from_secs(5)
    ));
    assert_eq!(mock.open_attempts(), 3);
    assert!(store.current().is_none());

    // The thread has already exited; shutdown just joins it.
    handle.shutdown();
}

#[test]
fn flapping_link_backs_off_and_hits_the_budget() {
    // Opens always succeed but every read kills the link; without backoff
    // this reconnects in a tight loop forever.
    let mock = MockLink::new(vec![MockStep::Closed; 10]);
    let start = Instant::now();
    let handle = acquisition::spawn(mock.clone(), AcquisitionConfig { max_retries: 2 });
    let store = handle.store();

    assert!(wait_for(
        || store.status() == LinkStatus::Fatal,
        Duration::from_secs(5)
    ));
    // One initial open plus one reopen per budgeted attempt, each after its
    // backoff delay (100 ms + 200 ms).
    assert_eq!(mock.open_attempts(), 3);
    assert!(start.elapsed() >= Duration::from_millis(300));

    handle.shutdown();
}

#[test]
fn successful_read_resets_the_retry_budget() {
    let mock = MockLink::new([
        MockStep::Closed,
        MockStep::Line(VALID_A),
        MockStep::Closed,
        MockStep::Line(VALID_B),
    ]);
    let handle = acquisition::spawn(mock.clone(), AcquisitionConfig { max_retries: 1 });
    let store = handle.store();

    // Two separate losses, each within a budget of one: only possible if a
    // delivered record resets the counter in between.
    assert!(wait_for(
        || store
            .current()
            .is_some_and(|snapshot| snapshot.speed == 46.5),
        Duration::from_secs(5)
    ));
    assert_eq!(store.status(), LinkStatus::Streaming);
    assert_eq!(mock.open_attempts(), 3);

    handle.shutdown();
}

#[test]
fn reconnecting_status_is_visible_while_the_link_is_down() {
    let mock = MockLink::new([MockStep::FailOpen, MockStep::FailOpen]);
    let handle = acquisition::spawn(mock, AcquisitionConfig::default());
    let store = handle.store();

    assert!(wait_for(
        || store.status() == LinkStatus::Reconnecting,
        Duration::from_secs(5)
    ));

    handle.shutdown();
}

#[test]
fn shutdown_is_observed_within_one_read_window() {
    let mock = MockLink::new([]);
    let handle = acquisition::spawn(mock, AcquisitionConfig::default());

    std::thread::sleep(Duration::from_millis(20));
    let start = Instant::now();
    handle.shutdown();
    assert!(start.elapsed() < Duration::from_secs(1));
}
