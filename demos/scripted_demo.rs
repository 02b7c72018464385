//! Minimal scripted-runtime walkthrough: attach a tracker, lose it, watch
//! the events arrive through the `log` facade.
//!
//! Run with `RUST_LOG=debug` to see the per-frame lines too.

use std::time::{Duration, Instant};
use vrbridge::backends::scripted::ScriptedRuntime;
use vrbridge::{
    ActionManifest, Bridge, BridgeConfig, DeviceClass, DeviceDescriptor, LogSink, RuntimeError,
    SinkFilter,
};

fn main() {
    env_logger::init();

    let (runtime, script) = ScriptedRuntime::new();
    script.attach(DeviceDescriptor::new("TRACKER-0", DeviceClass::Tracker).with_pose());

    let manifest = ActionManifest::from_json(r#"{ "actions": [] }"#).expect("empty manifest");
    let mut bridge = Bridge::with_manifest(BridgeConfig::default(), manifest, Box::new(runtime));
    bridge.subscribe(LogSink, SinkFilter::All);
    bridge.refresh();

    let t0 = Instant::now();
    bridge.tick(t0);

    // Three stalls in a row: watch the tracker degrade to Lost.
    for _ in 0..3 {
        script.push_failure("TRACKER-0", RuntimeError::Timeout);
    }
    let mut at = t0;
    for _ in 0..6 {
        at += Duration::from_millis(100);
        bridge.tick(at);
    }
}
