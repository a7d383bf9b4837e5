//! Keeps `reported.toggle` in the cloud shadow in step with the local toggle
//! and applies `delta` requests pushed back by the shadow service.

use tracing::{debug, info, warn};

use crate::{
    context::NodeContext,
    error::CloudError,
    indicator::{Channel, Pattern},
    platform::Platform,
    scheduler::{Schedule, Task},
    topics::{shadow_delta_topic, shadow_update_topic},
    types::{ShadowUpdatePayload, Timestamp, ToggleState},
};

pub const TOGGLE_MARKER: &[u8] = b"\"toggle\":";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowState {
    pub toggle: ToggleState,
    /// Telemetry publishes left that skip the yellow blip after a delta.
    pub hold_count: u8,
}

/// Best-effort delta reader: finds the first `"toggle":` marker and looks at
/// the byte right after it. `'1'` means on, anything else (including a
/// truncated payload) means off. Not a JSON parser; a payload only needs to
/// contain the marker to be accepted.
pub fn scan_toggle_delta(payload: &[u8]) -> Option<ToggleState> {
    let start = payload
        .windows(TOGGLE_MARKER.len())
        .position(|window| window == TOGGLE_MARKER)?;

    match payload.get(start + TOGGLE_MARKER.len()) {
        Some(b'1') => Some(ToggleState::On),
        _ => Some(ToggleState::Off),
    }
}

pub fn reported_payload(toggle: ToggleState) -> Result<String, CloudError> {
    serde_json::to_string(&ShadowUpdatePayload::reported(toggle))
        .map_err(|err| CloudError::Serialize(err.to_string()))
}

impl<P: Platform> NodeContext<P> {
    /// Publishes the reported toggle. Without an AP connection nothing is
    /// sent or queued. Returns whether a publish was attempted.
    pub fn update_device_shadow(&mut self) -> bool {
        if !self.connectivity.have_ap_connection() {
            debug!("shadow update skipped: no AP connection");
            return false;
        }

        let payload = match reported_payload(self.shadow.toggle) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("shadow update not sent: {err}");
                return false;
            }
        };
        let topic = shadow_update_topic(&self.device_id);
        self.publish(&topic, &payload);
        true
    }

    /// Handles an inbound message. Returns the accepted toggle when the
    /// message was a shadow delta carrying a toggle marker.
    pub fn received_from_cloud(&mut self, topic: &str, payload: &[u8]) -> Option<ToggleState> {
        debug!("topic: {topic}");
        debug!("payload: {}", String::from_utf8_lossy(payload));

        let delta_topic = shadow_delta_topic(&self.device_id);
        if !topic.starts_with(&delta_topic) {
            return None;
        }

        let toggle = scan_toggle_delta(payload)?;
        self.shadow.toggle = toggle;
        self.shadow.hold_count = self.config.delta_hold_cycles;

        let pattern = match toggle {
            ToggleState::On => Pattern::On,
            ToggleState::Off => Pattern::Off,
        };
        self.platform.set_pattern(Channel::Yellow, pattern);
        info!("shadow delta accepted: toggle {}", toggle.as_str());

        self.update_device_shadow();
        Some(toggle)
    }
}

/// One-shot initial report. Polls until the cloud has been connected for the
/// configured settling time, reports once, then stops for good.
#[derive(Debug, Default)]
pub struct ShadowInitTask {
    previous_time: Option<Timestamp>,
}

impl<P: Platform> Task<NodeContext<P>> for ShadowInitTask {
    fn name(&self) -> &'static str {
        "shadow-init"
    }

    fn run(&mut self, ctx: &mut NodeContext<P>) -> Schedule {
        if ctx.cloud_connected() {
            let now = ctx.platform.current_time();
            match self.previous_time {
                None => self.previous_time = Some(now),
                Some(previous)
                    if ctx.platform.elapsed(now, previous) >= ctx.config.shadow_buffer_time_s =>
                {
                    ctx.update_device_shadow();
                    return Schedule::Cancel;
                }
                Some(_) => {}
            }
        }

        Schedule::Reschedule(ctx.config.shadow_init_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::NodeConfig, testing::MockPlatform, types::WifiStatus};
    use pretty_assertions::assert_eq;

    const ID: &str = "0123C0FFEE";
    const UPDATE: &str = "$aws/things/0123C0FFEE/shadow/update";
    const DELTA: &str = "$aws/things/0123C0FFEE/shadow/update/delta";

    fn connected_context() -> NodeContext<MockPlatform> {
        let mut ctx = NodeContext::new(
            MockPlatform::default(),
            ID.to_string(),
            NodeConfig::default(),
        );
        ctx.connectivity.apply_wifi_status(WifiStatus::Connected);
        ctx
    }

    #[test]
    fn scan_reads_byte_after_marker() {
        assert_eq!(scan_toggle_delta(br#"{"state":{"toggle":1}}"#), Some(ToggleState::On));
        assert_eq!(scan_toggle_delta(br#"{"state":{"toggle":0}}"#), Some(ToggleState::Off));
        assert_eq!(scan_toggle_delta(br#"{"toggle":"1"}"#), Some(ToggleState::Off));
        assert_eq!(scan_toggle_delta(br#"garbage "toggle":1 trailing"#), Some(ToggleState::On));
        assert_eq!(scan_toggle_delta(br#"{"toggle":"#), Some(ToggleState::Off));
        assert_eq!(scan_toggle_delta(br#"{"state":{"light":1}}"#), None);
    }

    #[test]
    fn update_publishes_reported_toggle() {
        let mut ctx = connected_context();
        ctx.shadow.toggle = ToggleState::On;

        assert!(ctx.update_device_shadow());

        assert_eq!(
            ctx.platform.published,
            vec![(UPDATE.to_string(), r#"{"state":{"reported":{"toggle":1}}}"#.to_string())]
        );
    }

    #[test]
    fn repeated_update_with_same_state_sends_identical_payloads() {
        let mut ctx = connected_context();

        ctx.update_device_shadow();
        ctx.update_device_shadow();

        assert_eq!(ctx.platform.published.len(), 2);
        assert_eq!(ctx.platform.published[0], ctx.platform.published[1]);
    }

    #[test]
    fn update_without_ap_connection_is_dropped() {
        let mut ctx = NodeContext::new(
            MockPlatform::default(),
            ID.to_string(),
            NodeConfig::default(),
        );
        ctx.platform.cloud_connected = true;

        assert!(!ctx.update_device_shadow());
        assert!(ctx.platform.published.is_empty());
    }

    #[test]
    fn delta_on_sets_toggle_and_republishes_once() {
        let mut ctx = connected_context();

        let accepted = ctx.received_from_cloud(DELTA, br#"{"version":7,"state":{"toggle":1}}"#);

        assert_eq!(accepted, Some(ToggleState::On));
        assert_eq!(ctx.shadow.toggle, ToggleState::On);
        assert_eq!(ctx.shadow.hold_count, 2);
        assert_eq!(ctx.platform.pattern(Channel::Yellow), Some(Pattern::On));
        assert_eq!(
            ctx.platform.published,
            vec![(UPDATE.to_string(), r#"{"state":{"reported":{"toggle":1}}}"#.to_string())]
        );
    }

    #[test]
    fn delta_off_clears_toggle() {
        let mut ctx = connected_context();
        ctx.shadow.toggle = ToggleState::On;

        ctx.received_from_cloud(DELTA, br#"{"state":{"toggle":0}}"#);

        assert_eq!(ctx.shadow.toggle, ToggleState::Off);
        assert_eq!(ctx.platform.pattern(Channel::Yellow), Some(Pattern::Off));
        assert_eq!(
            ctx.platform.published,
            vec![(UPDATE.to_string(), r#"{"state":{"reported":{"toggle":0}}}"#.to_string())]
        );
    }

    #[test]
    fn delta_without_marker_is_ignored() {
        let mut ctx = connected_context();
        ctx.shadow.toggle = ToggleState::On;

        assert_eq!(ctx.received_from_cloud(DELTA, br#"{"state":{"color":"red"}}"#), None);

        assert_eq!(ctx.shadow.toggle, ToggleState::On);
        assert_eq!(ctx.shadow.hold_count, 0);
        assert!(ctx.platform.published.is_empty());
    }

    #[test]
    fn mismatched_topic_does_not_touch_toggle() {
        let mut ctx = connected_context();
        let payload = br#"{"state":{"toggle":1}}"#;

        for topic in [
            "$aws/things/0123C0FFEE/shadow/update",
            "$aws/things/0123C0FFEF/shadow/update/delta",
            "$aws/things/0123C0FFEE/shadow/get/delta",
            "0123C0FFEE/sensors",
            "",
        ] {
            assert_eq!(ctx.received_from_cloud(topic, payload), None);
        }

        assert_eq!(ctx.shadow.toggle, ToggleState::Off);
        assert!(ctx.platform.published.is_empty());
    }

    #[test]
    fn init_task_reports_once_after_buffer_time() {
        let mut ctx = connected_context();
        ctx.platform.cloud_connected = true;
        let mut task = ShadowInitTask::default();

        let mut outcomes = Vec::new();
        for second in 10..=12 {
            ctx.platform.now_ms = second * 1_000;
            outcomes.push(task.run(&mut ctx));
        }

        assert_eq!(
            outcomes,
            vec![
                Schedule::Reschedule(1_000),
                Schedule::Reschedule(1_000),
                Schedule::Cancel
            ]
        );
        assert_eq!(ctx.platform.published.len(), 1);
    }

    #[test]
    fn init_task_waits_while_cloud_is_down() {
        let mut ctx = connected_context();
        let mut task = ShadowInitTask::default();

        for second in 0..10 {
            ctx.platform.now_ms = second * 1_000;
            assert_eq!(task.run(&mut ctx), Schedule::Reschedule(1_000));
        }

        assert!(ctx.platform.published.is_empty());
    }
}
