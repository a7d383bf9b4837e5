use tracing::warn;

use crate::{
    config::NodeConfig, connectivity::ConnectivityState, platform::Platform, shadow::ShadowState,
};

/// Everything a scheduled task may read or change. Handed to each task by
/// mutable reference; there is no other path to this state.
#[derive(Debug)]
pub struct NodeContext<P> {
    pub platform: P,
    pub connectivity: ConnectivityState,
    pub shadow: ShadowState,
    pub device_id: String,
    pub config: NodeConfig,
}

impl<P: Platform> NodeContext<P> {
    pub fn new(platform: P, device_id: String, config: NodeConfig) -> Self {
        Self {
            platform,
            connectivity: ConnectivityState::default(),
            shadow: ShadowState::default(),
            device_id,
            config,
        }
    }

    pub fn cloud_connected(&self) -> bool {
        self.platform.is_connected()
    }

    /// Fire-and-forget publish. Transport failures are logged, never retried
    /// here.
    pub(crate) fn publish(&mut self, topic: &str, payload: &str) {
        if let Err(err) = self.platform.publish(topic, payload.as_bytes()) {
            warn!("publish to {topic} failed: {err}");
        }
    }
}
