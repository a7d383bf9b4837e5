use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::OnceLock,
    time::{Duration, Instant},
};

use anyhow::Context;
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::{info, warn};

use sensor_node_common::{
    BootInputs, Channel, CloudError, CloudTransport, CredentialSource, Identity, IdentityError,
    NetworkConfig, Node, Pattern, RuntimeConfig, Sensors, StatusIndicators, TimeSource,
    WifiControl, WifiMode, WifiStatus,
};

use crate::cloud::{HostCloud, InboundMessage};

const SCHEDULER_TICK_MS: u64 = 10;
const PROVISIONING_POLL_MS: u64 = 1_000;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = NodeStore::new();
    let mut runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        RuntimeConfig::default()
    });
    apply_env_overrides(&mut runtime.network);
    runtime.sanitize();

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundMessage>(32);
    let platform = HostPlatform::new(HostCloud::new(&runtime.network, inbound_tx));

    let mut node = Node::boot(
        platform,
        &mut EnvIdentity,
        &mut EnvInputs::from_env(),
        runtime.clone(),
    );

    // The host network is treated as always up: the link is reported once and
    // never lost, so only the node tests exercise the link-loss restart.
    let mut provisioned = node.boot_mode().wifi_mode() != WifiMode::SoftAp;
    if provisioned {
        node.wifi_connection_state_changed(WifiStatus::Connected);
    } else if provisioned_credentials(env_lookup).is_none() {
        warn!("NODE_PROVISION_SSID not set; staying in soft AP mode until it is provided");
    }

    info!("sensor node {} running", node.device_id());

    let mut ticker = tokio::time::interval(Duration::from_millis(SCHEDULER_TICK_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut provisioning_poll = tokio::time::interval(Duration::from_millis(PROVISIONING_POLL_MS));
    provisioning_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = provisioning_poll.tick(), if !provisioned => {
                match provision(&store, &mut runtime, env_lookup).await {
                    Ok(true) => {
                        provisioned = true;
                        node.post_provisioning();
                        node.wifi_connection_state_changed(WifiStatus::Connected);
                    }
                    Ok(false) => {}
                    Err(err) => warn!("soft AP provisioning failed: {err:#}"),
                }
            }
            _ = ticker.tick() => {
                let connecting = node.platform().cloud.is_connecting();
                node.set_connecting_socket(connecting);
                node.run_scheduler();
            }
            Some(message) = inbound_rx.recv() => {
                node.received_from_cloud(&message.topic, &message.payload);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// SSID and passphrase the SoftAP provisioning page would have collected.
/// `None` until an SSID is available.
fn provisioned_credentials<F>(lookup: F) -> Option<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let ssid = lookup("NODE_PROVISION_SSID")?.trim().to_string();
    if ssid.is_empty() {
        return None;
    }
    let pass = lookup("NODE_PROVISION_PASS").unwrap_or_default();
    Some((ssid, pass))
}

/// Stands in for the SoftAP provisioning page: credentials are written to the
/// store once they show up. Returns whether provisioning happened.
async fn provision<F>(
    store: &NodeStore,
    runtime: &mut RuntimeConfig,
    lookup: F,
) -> anyhow::Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some((ssid, pass)) = provisioned_credentials(lookup) else {
        return Ok(false);
    };

    runtime.network.wifi_ssid = ssid;
    runtime.network.wifi_pass = pass;
    runtime.sanitize();
    store.save_runtime_config(runtime).await?;
    info!("stored credentials for {}", runtime.network.wifi_ssid);
    Ok(true)
}

fn apply_env_overrides(network: &mut NetworkConfig) {
    if let Ok(host) = std::env::var("MQTT_HOST") {
        network.mqtt_host = host;
    }
    if let Some(port) = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        network.mqtt_port = port;
    }
    if let Ok(user) = std::env::var("MQTT_USER") {
        network.mqtt_user = user;
    }
    if let Ok(pass) = std::env::var("MQTT_PASS") {
        network.mqtt_pass = pass;
    }
}

pub struct HostPlatform {
    pub cloud: HostCloud,
    indicators: HashMap<Channel, Pattern>,
    sample: u64,
}

impl HostPlatform {
    fn new(cloud: HostCloud) -> Self {
        Self {
            cloud,
            indicators: HashMap::new(),
            sample: 0,
        }
    }
}

impl CloudTransport for HostPlatform {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CloudError> {
        self.cloud.publish(topic, payload)
    }

    fn register_subscription(&mut self, filter: &str) {
        self.cloud.register_subscription(filter);
    }

    fn is_connected(&self) -> bool {
        self.cloud.is_connected()
    }

    fn set_init_flag(&mut self) {
        self.cloud.set_init_flag();
    }

    fn setup_task(&mut self, device_id: &str) {
        self.cloud.setup_task(device_id);
    }
}

// Hardware integration point: simulated readings until real drivers exist.
impl Sensors for HostPlatform {
    fn temperature_centi(&mut self) -> i32 {
        self.sample = self.sample.saturating_add(1);
        2_200 + (self.sample % 8) as i32 * 15
    }

    fn light(&mut self) -> i32 {
        400 + (self.sample % 6) as i32 * 25
    }
}

impl StatusIndicators for HostPlatform {
    fn set_pattern(&mut self, channel: Channel, pattern: Pattern) {
        if self.indicators.insert(channel, pattern) != Some(pattern) {
            info!("indicator {}: {}", channel.as_str(), pattern.as_str());
        }
    }

    fn self_test(&mut self) {
        info!("indicator self test");
        self.indicators.clear();
    }
}

impl TimeSource for HostPlatform {
    fn monotonic_ms(&self) -> u64 {
        monotonic_ms()
    }
}

impl WifiControl for HostPlatform {
    fn wifi_init(&mut self, mode: WifiMode, credentials: CredentialSource) {
        match credentials {
            CredentialSource::Default(creds) => info!(
                "wifi {mode:?} with default credentials for {} ({})",
                creds.ssid,
                creds.auth.as_str()
            ),
            CredentialSource::Stored => info!("wifi {mode:?} with stored credentials"),
        }
    }
}

struct EnvIdentity;

impl Identity for EnvIdentity {
    fn device_id(&mut self) -> Result<String, IdentityError> {
        match std::env::var("NODE_DEVICE_ID") {
            Ok(id) if id.trim().is_empty() => Err(IdentityError::BadParameter),
            Ok(id) => Ok(id.trim().to_string()),
            Err(_) => Err(IdentityError::Unavailable),
        }
    }
}

/// Boot inputs pinned from `NODE_SW0` / `NODE_SW1` (`1`/`true`/`high`).
struct EnvInputs {
    sw0: bool,
    sw1: bool,
}

impl EnvInputs {
    fn from_env() -> Self {
        Self {
            sw0: env_level("NODE_SW0"),
            sw1: env_level("NODE_SW1"),
        }
    }
}

impl BootInputs for EnvInputs {
    fn sw0(&mut self) -> bool {
        self.sw0
    }

    fn sw1(&mut self) -> bool {
        self.sw1
    }
}

fn env_level(key: &str) -> bool {
    std::env::var(key)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "high"))
        .unwrap_or(false)
}

#[derive(Clone)]
struct NodeStore {
    runtime_path: PathBuf,
}

impl NodeStore {
    fn new() -> Self {
        let data_dir = std::env::var("NODE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.sensor-node"));

        Self::at(data_dir)
    }

    fn at(data_dir: PathBuf) -> Self {
        Self {
            runtime_path: data_dir.join("runtime.json"),
        }
    }

    async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read(&self.runtime_path).await {
            Ok(raw) => Ok(serde_json::from_slice::<RuntimeConfig>(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save_runtime_config(&self, runtime: &RuntimeConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.runtime_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(runtime)?;
        tokio::fs::write(&self.runtime_path, payload)
            .await
            .with_context(|| format!("failed to write {}", self.runtime_path.display()))?;
        Ok(())
    }
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(
        pairs: &'static [(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    fn scratch_store(name: &str) -> (PathBuf, NodeStore) {
        let dir = std::env::temp_dir().join(format!("sensor-node-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        (dir.clone(), NodeStore::at(dir))
    }

    #[test]
    fn missing_ssid_leaves_node_unprovisioned() {
        assert_eq!(provisioned_credentials(lookup_from(&[])), None);
        assert_eq!(
            provisioned_credentials(lookup_from(&[("NODE_PROVISION_SSID", "  ")])),
            None
        );
    }

    #[test]
    fn provisioning_pass_is_optional() {
        assert_eq!(
            provisioned_credentials(lookup_from(&[("NODE_PROVISION_SSID", "lab")])),
            Some(("lab".to_string(), String::new()))
        );
    }

    #[tokio::test]
    async fn missing_ssid_does_not_touch_the_store() {
        let (dir, store) = scratch_store("unprovisioned");
        let mut runtime = RuntimeConfig::default();

        let provisioned = provision(&store, &mut runtime, lookup_from(&[])).await.unwrap();

        assert!(!provisioned);
        assert_eq!(runtime, RuntimeConfig::default());
        assert!(!dir.join("runtime.json").exists());
    }

    #[tokio::test]
    async fn provisioned_credentials_persist() {
        let (dir, store) = scratch_store("provisioned");
        let mut runtime = RuntimeConfig::default();
        let lookup = lookup_from(&[
            ("NODE_PROVISION_SSID", "lab"),
            ("NODE_PROVISION_PASS", "hunter22"),
        ]);

        assert!(provision(&store, &mut runtime, lookup).await.unwrap());

        let stored = store.load_runtime_config().await.unwrap();
        assert_eq!(stored.network.wifi_ssid, "lab");
        assert_eq!(stored.network.wifi_pass, "hunter22");
        assert_eq!(stored, runtime);
        let _ = std::fs::remove_dir_all(dir);
    }
}
