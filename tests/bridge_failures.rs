mod support;

use std::time::{Duration, Instant};
use support::{left_controller, scripted_bridge};
use vrbridge::{BridgeConfig, BridgeEvent, ConnectionState, RuntimeError};

fn config() -> BridgeConfig {
    BridgeConfig {
        failure_threshold: 3,
        backoff_initial_ms: 25,
        backoff_cap_ms: 400,
        ..BridgeConfig::default()
    }
}

#[test]
fn transient_failure_backs_off_then_recovers() {
    let (mut bridge, script, sink) = scripted_bridge(config());
    script.attach(left_controller("LHR-LEFT"));
    bridge.refresh();
    let device = bridge.devices()[0].id;

    script.push_failure("LHR-LEFT", RuntimeError::Timeout);

    let t0 = Instant::now();
    assert_eq!(bridge.tick(t0), 0);
    assert_eq!(sink.poll_errors(), 1);

    // Inside the 25ms backoff window the device is not sampled at all.
    assert_eq!(bridge.tick(t0 + Duration::from_millis(10)), 0);
    assert_eq!(sink.poll_errors(), 1);

    // Past the window the steady sample succeeds and tracking resumes.
    assert_eq!(bridge.tick(t0 + Duration::from_millis(30)), 1);
    assert_eq!(sink.frames().len(), 1);
    assert_eq!(
        bridge.device(device).unwrap().state,
        ConnectionState::Tracking
    );
    assert!(sink.lost_events().is_empty());
}

#[test]
fn three_consecutive_failures_lose_the_device_exactly_once() {
    let (mut bridge, script, sink) = scripted_bridge(config());
    script.attach(left_controller("LHR-LEFT"));
    bridge.refresh();
    let device = bridge.devices()[0].id;

    for _ in 0..3 {
        script.push_failure("LHR-LEFT", RuntimeError::Timeout);
    }

    let t0 = Instant::now();
    bridge.tick(t0); // failure 1, backoff 25ms
    bridge.tick(t0 + Duration::from_millis(30)); // failure 2, backoff 50ms
    bridge.tick(t0 + Duration::from_millis(90)); // failure 3 -> Lost

    assert_eq!(sink.poll_errors(), 3);
    assert_eq!(
        sink.lost_events(),
        vec![BridgeEvent::Lost { device, failures: 3 }]
    );
    assert_eq!(bridge.device(device).unwrap().state, ConnectionState::Lost);

    // Lost devices are skipped: no further samples, no repeated event.
    bridge.tick(t0 + Duration::from_millis(500));
    assert_eq!(sink.poll_errors(), 3);
    assert_eq!(sink.lost_events().len(), 1);
    assert!(sink.frames().is_empty());
}

#[test]
fn a_lost_device_recovers_through_refresh_with_the_same_id() {
    let (mut bridge, script, sink) = scripted_bridge(config());
    script.attach(left_controller("LHR-LEFT"));
    bridge.refresh();
    let device = bridge.devices()[0].id;

    // Track for a couple of frames first.
    let t0 = Instant::now();
    bridge.tick(t0);
    bridge.tick(t0 + Duration::from_millis(11));
    let published = bridge.last_sequence(device);
    assert_eq!(published, 2);

    for _ in 0..3 {
        script.push_failure("LHR-LEFT", RuntimeError::Native("usb reset".into()));
    }
    bridge.tick(t0 + Duration::from_millis(22));
    bridge.tick(t0 + Duration::from_millis(60));
    bridge.tick(t0 + Duration::from_millis(130));
    assert_eq!(bridge.device(device).unwrap().state, ConnectionState::Lost);

    // The hardware is still attached; the next rescan re-admits it.
    let delta = bridge.refresh();
    assert_eq!(delta.added, vec![device]);
    assert_eq!(
        bridge.device(device).unwrap().state,
        ConnectionState::Connecting
    );

    bridge.tick(t0 + Duration::from_millis(150));
    assert_eq!(
        bridge.device(device).unwrap().state,
        ConnectionState::Tracking
    );
    // Sequences keep increasing across the loss.
    assert_eq!(bridge.last_sequence(device), published + 1);

    let connects = sink
        .events()
        .iter()
        .filter(|e| matches!(e, BridgeEvent::Connected { .. }))
        .count();
    assert_eq!(connects, 2);
}

#[test]
fn one_failing_device_does_not_stall_the_others() {
    let (mut bridge, script, sink) = scripted_bridge(config());
    script.attach(left_controller("LHR-A"));
    script.attach(left_controller("LHR-B"));
    bridge.refresh();

    for _ in 0..3 {
        script.push_failure("LHR-A", RuntimeError::Timeout);
    }

    let t0 = Instant::now();
    bridge.tick(t0);
    bridge.tick(t0 + Duration::from_millis(30));
    bridge.tick(t0 + Duration::from_millis(90));

    // B published on every tick while A degraded to Lost.
    let b = bridge.devices()[1].id;
    let b_frames = sink.frames().iter().filter(|f| f.device == b).count();
    assert_eq!(b_frames, 3);
    assert_eq!(sink.lost_events().len(), 1);
}
