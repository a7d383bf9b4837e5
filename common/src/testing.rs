use std::collections::HashMap;

use crate::{
    error::{CloudError, IdentityError},
    indicator::{Channel, Pattern, StatusIndicators},
    platform::{
        BootInputs, CloudTransport, CredentialSource, Identity, Sensors, TimeSource, WifiControl,
    },
    types::WifiMode,
};

#[derive(Debug, Default)]
pub struct MockPlatform {
    pub now_ms: u64,
    pub cloud_connected: bool,
    pub reject_publish: bool,
    pub published: Vec<(String, String)>,
    pub subscriptions: Vec<String>,
    pub init_flag_requests: usize,
    pub setup_calls: Vec<String>,
    pub wifi_inits: Vec<(WifiMode, CredentialSource)>,
    pub self_tests: usize,
    pub patterns: HashMap<Channel, Pattern>,
    pub temperature_centi: i32,
    pub light: i32,
}

impl MockPlatform {
    pub fn pattern(&self, channel: Channel) -> Option<Pattern> {
        self.patterns.get(&channel).copied()
    }
}

impl CloudTransport for MockPlatform {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CloudError> {
        if self.reject_publish {
            return Err(CloudError::PublishRejected {
                topic: topic.to_string(),
                reason: "mock rejection".to_string(),
            });
        }
        self.published
            .push((topic.to_string(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }

    fn register_subscription(&mut self, filter: &str) {
        self.subscriptions.push(filter.to_string());
    }

    fn is_connected(&self) -> bool {
        self.cloud_connected
    }

    fn set_init_flag(&mut self) {
        self.init_flag_requests += 1;
    }

    fn setup_task(&mut self, device_id: &str) {
        self.setup_calls.push(device_id.to_string());
    }
}

impl Sensors for MockPlatform {
    fn temperature_centi(&mut self) -> i32 {
        self.temperature_centi
    }

    fn light(&mut self) -> i32 {
        self.light
    }
}

impl StatusIndicators for MockPlatform {
    fn set_pattern(&mut self, channel: Channel, pattern: Pattern) {
        self.patterns.insert(channel, pattern);
    }

    fn self_test(&mut self) {
        self.self_tests += 1;
    }
}

impl TimeSource for MockPlatform {
    fn monotonic_ms(&self) -> u64 {
        self.now_ms
    }
}

impl WifiControl for MockPlatform {
    fn wifi_init(&mut self, mode: WifiMode, credentials: CredentialSource) {
        self.wifi_inits.push((mode, credentials));
    }
}

pub struct FixedIdentity(pub Result<String, IdentityError>);

impl Identity for FixedIdentity {
    fn device_id(&mut self) -> Result<String, IdentityError> {
        self.0.clone()
    }
}

/// Secure element that fails to initialize but still yields its serial.
pub struct UninitializedIdentity(pub String);

impl Identity for UninitializedIdentity {
    fn init(&mut self) -> Result<(), IdentityError> {
        Err(IdentityError::InitFailed)
    }

    fn device_id(&mut self) -> Result<String, IdentityError> {
        Ok(self.0.clone())
    }
}

pub struct FixedInputs {
    pub sw0: bool,
    pub sw1: bool,
}

impl BootInputs for FixedInputs {
    fn sw0(&mut self) -> bool {
        self.sw0
    }

    fn sw1(&mut self) -> bool {
        self.sw1
    }
}
