//! Frame publishing and subscriptions.
//!
//! [`FramePublisher`] owns the per-device sequence counters and the set of
//! registered sinks. Delivery is fire-and-forget and synchronous within the
//! host tick: sinks receive shared references in registration order, and a
//! sink cannot block or fail delivery to the others (sinks have no fallible
//! return path).
//!
//! A sink registered after a device has reached sequence N never receives
//! that device's frames ≤ N; the publisher records each subscription's
//! per-device floor at registration time.

use crate::device::DeviceId;
use crate::event::BridgeEvent;
use crate::frame::{ActionEdge, ActionValue, InputFrame, Pose};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Instant;

/// Consumer of frames and events.
///
/// Both methods default to no-ops so a sink can subscribe to only the side
/// it cares about (usually combined with a [`SinkFilter`]). The bridge is
/// single-threaded; sinks run on the host thread inside the tick and should
/// return quickly.
pub trait FrameSink {
    fn on_frame(&mut self, _frame: &InputFrame) {}
    fn on_event(&mut self, _event: &BridgeEvent) {}
}

/// Which deliveries a subscription wants.
#[derive(Clone, Copy)]
pub enum SinkFilter {
    All,
    FramesOnly,
    EventsOnly,
    /// Frames from one device, plus events concerning it. Events that
    /// concern no single device (resolution reports) pass as well.
    Device(DeviceId),
    /// Frame predicate; events always pass.
    Custom(fn(&InputFrame) -> bool),
}

impl fmt::Debug for SinkFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::FramesOnly => f.write_str("FramesOnly"),
            Self::EventsOnly => f.write_str("EventsOnly"),
            Self::Device(id) => write!(f, "Device({id})"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl SinkFilter {
    fn wants_frame(&self, frame: &InputFrame) -> bool {
        match self {
            Self::All | Self::FramesOnly => true,
            Self::EventsOnly => false,
            Self::Device(id) => frame.device == *id,
            Self::Custom(pred) => pred(frame),
        }
    }

    fn wants_event(&self, event: &BridgeEvent) -> bool {
        match self {
            Self::All | Self::EventsOnly | Self::Custom(_) => true,
            Self::FramesOnly => false,
            Self::Device(id) => event.device().map_or(true, |d| d == *id),
        }
    }
}

/// Handle for revoking or muting a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct SinkEntry {
    sink: Box<dyn FrameSink>,
    enabled: bool,
    filter: SinkFilter,
    /// Per-device sequence at registration; frames at or below the floor
    /// are never delivered to this sink.
    floor: HashMap<DeviceId, u64>,
}

/// Sequencer and fan-out point for frames and events.
#[derive(Default)]
pub struct FramePublisher {
    next_id: u64,
    // BTreeMap keeps delivery in registration order.
    sinks: BTreeMap<u64, SinkEntry>,
    sequences: HashMap<DeviceId, u64>,
}

impl FramePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink. Takes effect on the next publish; nothing already
    /// published is replayed.
    pub fn subscribe(
        &mut self,
        sink: impl FrameSink + 'static,
        filter: SinkFilter,
    ) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.sinks.insert(
            id,
            SinkEntry {
                sink: Box::new(sink),
                enabled: true,
                filter,
                floor: self.sequences.clone(),
            },
        );
        SubscriptionId(id)
    }

    /// Mute a subscription without dropping it.
    pub fn disable(&mut self, id: SubscriptionId) {
        if let Some(entry) = self.sinks.get_mut(&id.0) {
            entry.enabled = false;
        }
    }

    pub fn enable(&mut self, id: SubscriptionId) {
        if let Some(entry) = self.sinks.get_mut(&id.0) {
            entry.enabled = true;
        }
    }

    /// Revoke a subscription entirely.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.sinks.remove(&id.0);
    }

    /// Last sequence assigned for a device (0 before its first frame).
    pub fn last_sequence(&self, device: DeviceId) -> u64 {
        self.sequences.get(&device).copied().unwrap_or(0)
    }

    /// Build the frame for this tick, assign the device's next sequence
    /// number, and deliver it.
    pub fn publish(
        &mut self,
        device: DeviceId,
        at: Instant,
        pose: Pose,
        actions: BTreeMap<String, ActionValue>,
        edges: Vec<ActionEdge>,
    ) -> u64 {
        let seq = self.sequences.entry(device).or_insert(0);
        *seq += 1;
        let frame = InputFrame {
            device,
            sequence: *seq,
            at,
            pose,
            actions,
            edges,
        };
        for entry in self.sinks.values_mut() {
            if !entry.enabled || !entry.filter.wants_frame(&frame) {
                continue;
            }
            if let Some(&floor) = entry.floor.get(&device) {
                if frame.sequence <= floor {
                    continue;
                }
            }
            entry.sink.on_frame(&frame);
        }
        frame.sequence
    }

    /// Deliver a discrete event to all matching subscriptions.
    pub fn emit(&mut self, event: &BridgeEvent) {
        for entry in self.sinks.values_mut() {
            if entry.enabled && entry.filter.wants_event(event) {
                entry.sink.on_event(event);
            }
        }
    }
}

/// Sink that forwards traffic to the `log` facade.
///
/// Frames go to `debug!` (they are per-tick noise), events to `info!`,
/// except losses and poll errors which go to `warn!`.
pub struct LogSink;

impl FrameSink for LogSink {
    fn on_frame(&mut self, frame: &InputFrame) {
        log::debug!(
            "{} seq={} valid={} actions={}",
            frame.device,
            frame.sequence,
            frame.pose.valid,
            frame.actions.len()
        );
    }

    fn on_event(&mut self, event: &BridgeEvent) {
        match event {
            BridgeEvent::Lost { device, failures } => {
                log::warn!("{device} lost after {failures} consecutive failures");
            }
            BridgeEvent::PollError { device, error } => {
                log::warn!("{device} poll failed: {error}");
            }
            BridgeEvent::BindingsResolved {
                resolved,
                unresolved,
            } => {
                if unresolved.is_empty() {
                    log::info!("bindings resolved: {resolved} action(s)");
                } else {
                    for u in unresolved {
                        log::warn!("action {:?} unresolved (tried {:?})", u.action, u.tried);
                    }
                }
            }
            other => log::info!("{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records everything it receives; shared handle for assertions.
    #[derive(Clone, Default)]
    struct Recorder {
        frames: Rc<RefCell<Vec<(DeviceId, u64)>>>,
        events: Rc<RefCell<Vec<BridgeEvent>>>,
    }

    impl FrameSink for Recorder {
        fn on_frame(&mut self, frame: &InputFrame) {
            self.frames.borrow_mut().push((frame.device, frame.sequence));
        }

        fn on_event(&mut self, event: &BridgeEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    fn publish(publisher: &mut FramePublisher, device: DeviceId) -> u64 {
        publisher.publish(
            device,
            Instant::now(),
            Pose::invalid(),
            BTreeMap::new(),
            Vec::new(),
        )
    }

    #[test]
    fn sequences_are_strictly_increasing_per_device() {
        let mut publisher = FramePublisher::new();
        let a = DeviceId::new(0);
        let b = DeviceId::new(1);

        assert_eq!(publish(&mut publisher, a), 1);
        assert_eq!(publish(&mut publisher, b), 1);
        assert_eq!(publish(&mut publisher, a), 2);
        assert_eq!(publish(&mut publisher, a), 3);
        assert_eq!(publisher.last_sequence(a), 3);
        assert_eq!(publisher.last_sequence(b), 1);
    }

    #[test]
    fn late_subscriber_never_sees_old_sequences() {
        let mut publisher = FramePublisher::new();
        let device = DeviceId::new(0);
        for _ in 0..10 {
            publish(&mut publisher, device);
        }

        let recorder = Recorder::default();
        publisher.subscribe(recorder.clone(), SinkFilter::All);
        publish(&mut publisher, device);
        publish(&mut publisher, device);

        let frames = recorder.frames.borrow();
        assert_eq!(frames.as_slice(), &[(device, 11), (device, 12)]);
        assert!(frames.iter().all(|&(_, seq)| seq > 10));
    }

    #[test]
    fn disabled_and_revoked_sinks_receive_nothing() {
        let mut publisher = FramePublisher::new();
        let device = DeviceId::new(0);
        let recorder = Recorder::default();
        let id = publisher.subscribe(recorder.clone(), SinkFilter::All);

        publisher.disable(id);
        publish(&mut publisher, device);
        assert!(recorder.frames.borrow().is_empty());

        publisher.enable(id);
        publish(&mut publisher, device);
        assert_eq!(recorder.frames.borrow().len(), 1);

        publisher.unsubscribe(id);
        publish(&mut publisher, device);
        assert_eq!(recorder.frames.borrow().len(), 1);
    }

    #[test]
    fn device_filter_scopes_frames_and_events() {
        let mut publisher = FramePublisher::new();
        let a = DeviceId::new(0);
        let b = DeviceId::new(1);
        let recorder = Recorder::default();
        publisher.subscribe(recorder.clone(), SinkFilter::Device(a));

        publish(&mut publisher, a);
        publish(&mut publisher, b);
        publisher.emit(&BridgeEvent::Disconnected { device: b });
        publisher.emit(&BridgeEvent::BindingsResolved {
            resolved: 0,
            unresolved: Vec::new(),
        });

        assert_eq!(recorder.frames.borrow().as_slice(), &[(a, 1)]);
        // The b-scoped event is filtered out, the global one passes.
        assert_eq!(recorder.events.borrow().len(), 1);
    }

    #[test]
    fn events_only_filter_drops_frames() {
        let mut publisher = FramePublisher::new();
        let recorder = Recorder::default();
        publisher.subscribe(recorder.clone(), SinkFilter::EventsOnly);

        publish(&mut publisher, DeviceId::new(0));
        publisher.emit(&BridgeEvent::Disconnected {
            device: DeviceId::new(0),
        });

        assert!(recorder.frames.borrow().is_empty());
        assert_eq!(recorder.events.borrow().len(), 1);
    }
}
