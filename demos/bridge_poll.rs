//! Drives a bridge over the scripted runtime and prints what a consumer
//! would see: connect events, binding resolution, frames, and edges.

use std::time::{Duration, Instant};
use vrbridge::backends::scripted::ScriptedRuntime;
use vrbridge::{
    ActionManifest, Bridge, BridgeConfig, BridgeEvent, DeviceClass, DeviceDescriptor, FrameSink,
    InputFrame, Pose, RawSample, SinkFilter,
};

struct PrintSink;

impl FrameSink for PrintSink {
    fn on_frame(&mut self, frame: &InputFrame) {
        let p = frame.pose.position;
        println!(
            "{} #{:03} pos=({:+.2} {:+.2} {:+.2}) valid={} {:?}",
            frame.device, frame.sequence, p[0], p[1], p[2], frame.pose.valid, frame.actions
        );
        for edge in &frame.edges {
            println!("  edge: {} {:?}", edge.action, edge.kind);
        }
    }

    fn on_event(&mut self, event: &BridgeEvent) {
        println!("* {event:?}");
    }
}

const MANIFEST: &str = r#"{
    "actions": [
        { "name": "grab", "kind": "boolean", "bindings": ["left_hand/grip/click"] },
        { "name": "move", "kind": "axis2",   "bindings": ["left_hand/thumbstick"] }
    ]
}"#;

fn main() {
    env_logger::init();

    let (runtime, script) = ScriptedRuntime::new();
    script.attach(
        DeviceDescriptor::new("LHR-DEMO", DeviceClass::LeftHand)
            .with_model("Demo Controller")
            .with_pose()
            .with_button("grip/click")
            .with_axis("thumbstick"),
    );

    let manifest = ActionManifest::from_json(MANIFEST).expect("demo manifest parses");
    let mut bridge = Bridge::with_manifest(BridgeConfig::default(), manifest, Box::new(runtime));
    bridge.subscribe(PrintSink, SinkFilter::All);
    bridge.refresh();

    // Simulate a hand sweeping while the grip closes halfway through.
    for i in 0..8u32 {
        let x = -0.4 + 0.1 * i as f32;
        script.set_sample(
            "LHR-DEMO",
            RawSample::new()
                .with_pose(Pose::new([x, 1.3, -0.3], [0.0, 0.0, 0.0, 1.0]))
                .with_button("grip/click", i >= 4)
                .with_axis("thumbstick", [x, 0.0]),
        );
        bridge.tick(Instant::now());
        std::thread::sleep(Duration::from_millis(16));
    }
}
