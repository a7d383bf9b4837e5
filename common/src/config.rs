use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Minimum spacing between telemetry publishes, in time-source seconds.
    pub send_interval_s: u32,
    pub data_task_interval_ms: u64,
    pub shadow_init_interval_ms: u64,
    /// Settling time after the cloud first reports connected before the
    /// initial shadow report goes out.
    pub shadow_buffer_time_s: u32,
    pub debounce_iterations: u32,
    pub delta_hold_cycles: u8,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            send_interval_s: 1,
            data_task_interval_ms: 100,
            shadow_init_interval_ms: 1_000,
            shadow_buffer_time_s: 2,
            debounce_iterations: 1_460_000,
            delta_hold_cycles: 2,
        }
    }
}

impl NodeConfig {
    pub fn sanitize(&mut self) {
        self.send_interval_s = self.send_interval_s.max(1);
        self.data_task_interval_ms = self.data_task_interval_ms.clamp(10, 10_000);
        self.shadow_init_interval_ms = self.shadow_init_interval_ms.clamp(100, 60_000);
        self.debounce_iterations = self.debounce_iterations.max(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WifiAuth {
    Open,
    Wep,
    Wpa,
}

impl WifiAuth {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Wep => "WEP",
            Self::Wpa => "WPA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: String,
    pub pass: String,
    pub auth: WifiAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub wifi_auth: WifiAuth,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: "MCHP.IOT".to_string(),
            wifi_pass: "microchip".to_string(),
            wifi_auth: WifiAuth::Wpa,
            mqtt_host: "127.0.0.1".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
        }
    }
}

impl NetworkConfig {
    /// Compiled-in credentials used when both boot inputs read low.
    pub fn default_credentials(&self) -> WifiCredentials {
        WifiCredentials {
            ssid: self.wifi_ssid.clone(),
            pass: self.wifi_pass.clone(),
            auth: self.wifi_auth,
        }
    }

    pub fn sanitize(&mut self) {
        if self.mqtt_port == 0 {
            self.mqtt_port = 1883;
        }
        if self.wifi_pass.is_empty() {
            self.wifi_auth = WifiAuth::Open;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.node.sanitize();
        self.network.sanitize();
    }
}
