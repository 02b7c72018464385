//! The bridge: discovery, the poll tick, and frame fan-out in one place.
//!
//! [`Bridge`] is driven entirely by the host: call [`refresh`] from a
//! low-frequency timer to rescan hardware, and [`tick`] from the per-frame
//! callback to sample every pollable device and publish frames. Both take
//! `&mut self`, so a refresh can never interleave with an in-progress tick.
//!
//! The tick never blocks and never fails: native calls run under the
//! configured time budget, failures become [`BridgeEvent`]s plus a retry
//! with exponential backoff, and a device that keeps failing degrades to
//! `Lost` instead of stalling the loop.
//!
//! [`refresh`]: Bridge::refresh
//! [`tick`]: Bridge::tick

use crate::config::BridgeConfig;
use crate::device::{ConnectionState, DeviceId, DeviceRecord};
use crate::enumerator::{DeviceEnumerator, RefreshDelta};
use crate::error::BridgeError;
use crate::event::BridgeEvent;
use crate::frame::Pose;
use crate::manifest::ActionManifest;
use crate::mapper::{BindingTable, EdgeDetector, UnresolvedBinding};
use crate::publisher::{FramePublisher, FrameSink, SinkFilter, SubscriptionId};
use crate::runtime::VrRuntime;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-device failure tracking for the poll tick.
#[derive(Debug, Default)]
struct PollHealth {
    consecutive_failures: u32,
    /// Next allowed sample time while backing off.
    not_before: Option<Instant>,
}

/// Host-driven input/pose bridge over one native runtime.
pub struct Bridge {
    config: BridgeConfig,
    runtime: Box<dyn VrRuntime>,
    enumerator: DeviceEnumerator,
    manifest: ActionManifest,
    /// Current binding table; swapped wholesale on re-resolution so the
    /// tick always reads one consistent table.
    bindings: Arc<BindingTable>,
    unresolved: Vec<UnresolvedBinding>,
    edges: EdgeDetector,
    publisher: FramePublisher,
    health: HashMap<DeviceId, PollHealth>,
    last_tick: Option<Instant>,
}

impl Bridge {
    /// Build a bridge, loading the action manifest from the configured
    /// path. A manifest that fails to load is fatal here; there is no
    /// degraded mode without one.
    pub fn open(config: BridgeConfig, runtime: Box<dyn VrRuntime>) -> Result<Self, BridgeError> {
        let manifest = ActionManifest::load(&config.manifest_path)?;
        Ok(Self::with_manifest(config, manifest, runtime))
    }

    /// Build a bridge around an already-loaded manifest.
    pub fn with_manifest(
        config: BridgeConfig,
        manifest: ActionManifest,
        runtime: Box<dyn VrRuntime>,
    ) -> Self {
        log::info!(
            "bridge up: {} action(s), poll budget {:?}",
            manifest.len(),
            config.poll_budget()
        );
        Self {
            config,
            runtime,
            enumerator: DeviceEnumerator::new(),
            manifest,
            bindings: Arc::new(BindingTable::default()),
            unresolved: Vec::new(),
            edges: EdgeDetector::new(),
            publisher: FramePublisher::new(),
            health: HashMap::new(),
            last_tick: None,
        }
    }

    /// Rescan the runtime for devices, emit connect/disconnect events, and
    /// re-resolve bindings if the table changed.
    pub fn refresh(&mut self) -> RefreshDelta {
        let delta = self.enumerator.refresh(self.runtime.as_mut());

        for &id in &delta.added {
            // resolve() cannot fail for an id the refresh just reported.
            let class = self
                .enumerator
                .resolve(id)
                .map(DeviceRecord::class)
                .unwrap_or(crate::device::DeviceClass::Tracker);
            self.health.remove(&id);
            self.publisher
                .emit(&BridgeEvent::Connected { device: id, class });
        }
        for &id in &delta.removed {
            self.edges.forget(id);
            self.health.remove(&id);
            self.publisher.emit(&BridgeEvent::Disconnected { device: id });
        }

        if delta.affects_bindings() {
            self.resolve_bindings();
        }
        delta
    }

    fn resolve_bindings(&mut self) {
        let resolution = BindingTable::resolve(&self.manifest, self.enumerator.records());
        self.unresolved = resolution.unresolved;
        let resolved = resolution.table.resolved_actions();
        self.bindings = Arc::new(resolution.table);
        self.publisher.emit(&BridgeEvent::BindingsResolved {
            resolved,
            unresolved: self.unresolved.clone(),
        });
    }

    /// Sample every pollable device once and publish the resulting frames.
    ///
    /// Returns the number of frames published. Calls closer together than
    /// the configured poll interval are ignored, so the host can simply
    /// forward its frame callback.
    pub fn tick(&mut self, now: Instant) -> usize {
        if let Some(last) = self.last_tick {
            let interval = self.config.poll_interval();
            if !interval.is_zero() && now.duration_since(last) < interval {
                return 0;
            }
        }
        self.last_tick = Some(now);

        let snapshot = self.enumerator.snapshot();
        let bindings = Arc::clone(&self.bindings);
        let mut published = 0;

        for record in snapshot.iter().filter(|r| r.state.pollable()) {
            let health = self.health.entry(record.id).or_default();
            if health.not_before.is_some_and(|t| now < t) {
                continue;
            }

            match self
                .runtime
                .sample(record.hardware_id(), self.config.poll_budget())
            {
                Ok(raw) => {
                    health.consecutive_failures = 0;
                    health.not_before = None;
                    if record.state == ConnectionState::Connecting {
                        self.enumerator.set_state(record.id, ConnectionState::Tracking);
                    }
                    let actions = bindings.apply(record.id, &raw);
                    let edges = self.edges.detect(record.id, &actions);
                    let pose = raw.pose.unwrap_or_else(Pose::invalid);
                    self.publisher.publish(record.id, now, pose, actions, edges);
                    published += 1;
                }
                Err(error) => {
                    health.consecutive_failures += 1;
                    let failures = health.consecutive_failures;
                    self.publisher.emit(&BridgeEvent::PollError {
                        device: record.id,
                        error,
                    });
                    if failures >= self.config.failure_threshold {
                        self.health.remove(&record.id);
                        self.edges.forget(record.id);
                        self.enumerator.set_state(record.id, ConnectionState::Lost);
                        self.publisher.emit(&BridgeEvent::Lost {
                            device: record.id,
                            failures,
                        });
                    } else {
                        health.not_before = Some(now + Self::backoff(&self.config, failures));
                    }
                }
            }
        }
        published
    }

    /// Retry delay after the n-th consecutive failure: doubles from the
    /// configured initial value, capped.
    fn backoff(config: &BridgeConfig, failures: u32) -> Duration {
        let doubled = config
            .backoff_initial_ms
            .saturating_mul(1u64 << (failures - 1).min(16));
        Duration::from_millis(doubled.min(config.backoff_cap_ms))
    }

    /// Current record for a device.
    pub fn device(&self, id: DeviceId) -> Result<&DeviceRecord, BridgeError> {
        self.enumerator.resolve(id)
    }

    /// All devices seen this session, in id order.
    pub fn devices(&self) -> &[DeviceRecord] {
        self.enumerator.records()
    }

    /// Devices currently connected (Connecting or Tracking).
    pub fn connected_devices(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.enumerator
            .records()
            .iter()
            .filter(|r| r.state.pollable())
    }

    /// Actions the last resolution could not bind anywhere.
    pub fn unresolved_bindings(&self) -> &[UnresolvedBinding] {
        &self.unresolved
    }

    pub fn subscribe(
        &mut self,
        sink: impl FrameSink + 'static,
        filter: SinkFilter,
    ) -> SubscriptionId {
        self.publisher.subscribe(sink, filter)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.publisher.unsubscribe(id);
    }

    pub fn disable_subscription(&mut self, id: SubscriptionId) {
        self.publisher.disable(id);
    }

    pub fn enable_subscription(&mut self, id: SubscriptionId) {
        self.publisher.enable(id);
    }

    /// Last frame sequence published for a device.
    pub fn last_sequence(&self, device: DeviceId) -> u64 {
        self.publisher.last_sequence(device)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::scripted::ScriptedRuntime;
    use crate::device::{DeviceClass, DeviceDescriptor};

    fn bridge_with(config: BridgeConfig) -> (Bridge, crate::backends::scripted::ScriptHandle) {
        let (runtime, script) = ScriptedRuntime::new();
        let manifest = ActionManifest::from_json(r#"{ "actions": [] }"#).unwrap();
        (
            Bridge::with_manifest(config, manifest, Box::new(runtime)),
            script,
        )
    }

    #[test]
    fn tick_respects_the_poll_interval() {
        let config = BridgeConfig {
            poll_interval_ms: 10,
            ..BridgeConfig::default()
        };
        let (mut bridge, script) = bridge_with(config);
        script.attach(DeviceDescriptor::new("X", DeviceClass::Tracker).with_pose());
        bridge.refresh();

        let t0 = Instant::now();
        assert_eq!(bridge.tick(t0), 1);
        // Too soon: gated.
        assert_eq!(bridge.tick(t0 + Duration::from_millis(3)), 0);
        assert_eq!(bridge.tick(t0 + Duration::from_millis(12)), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = BridgeConfig {
            backoff_initial_ms: 25,
            backoff_cap_ms: 80,
            ..BridgeConfig::default()
        };
        assert_eq!(Bridge::backoff(&config, 1), Duration::from_millis(25));
        assert_eq!(Bridge::backoff(&config, 2), Duration::from_millis(50));
        assert_eq!(Bridge::backoff(&config, 3), Duration::from_millis(80));
        assert_eq!(Bridge::backoff(&config, 30), Duration::from_millis(80));
    }
}
