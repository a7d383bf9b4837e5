//! Power-on mode selection. Runs once, blocking, before any timer is armed.

use crate::{
    config::NetworkConfig,
    connectivity::ConnectivityState,
    indicator::{Channel, Pattern, StatusIndicators},
    platform::{BootInputs, CredentialSource},
    types::WifiMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSample {
    pub sw0_high: bool,
    pub sw1_high: bool,
}

/// Spins `iterations` times summing both inputs; an input reads high when it
/// was high for at least half of the window.
pub fn sample_inputs<I: BootInputs + ?Sized>(inputs: &mut I, iterations: u32) -> InputSample {
    let iterations = iterations.max(1);
    let mut sw0_count: u32 = 0;
    let mut sw1_count: u32 = 0;

    for _ in 0..iterations {
        sw0_count += u32::from(inputs.sw0());
        sw1_count += u32::from(inputs.sw1());
    }

    let threshold = iterations / 2;
    InputSample {
        sw0_high: sw0_count >= threshold,
        sw1_high: sw1_count >= threshold,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    DefaultCredentials,
    SoftAp,
    StoredCredentials,
}

impl BootMode {
    pub fn select(sample: InputSample) -> Self {
        match (sample.sw0_high, sample.sw1_high) {
            (false, false) => Self::DefaultCredentials,
            (false, true) => Self::SoftAp,
            (true, _) => Self::StoredCredentials,
        }
    }

    pub fn wifi_mode(self) -> WifiMode {
        match self {
            Self::SoftAp => WifiMode::SoftAp,
            Self::DefaultCredentials | Self::StoredCredentials => WifiMode::Station,
        }
    }

    pub fn credentials(self, network: &NetworkConfig) -> CredentialSource {
        match self {
            Self::DefaultCredentials => CredentialSource::Default(network.default_credentials()),
            Self::SoftAp | Self::StoredCredentials => CredentialSource::Stored,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefaultCredentials => "DEFAULT_CREDENTIALS",
            Self::SoftAp => "SOFT_AP",
            Self::StoredCredentials => "STORED_CREDENTIALS",
        }
    }

    pub fn apply(self, connectivity: &mut ConnectivityState) {
        match self {
            Self::DefaultCredentials => connectivity.begin_station_connect(true),
            Self::SoftAp => connectivity.enter_soft_ap(),
            Self::StoredCredentials => connectivity.begin_station_connect(false),
        }
    }

    /// Boot indicator pattern: everything off except the mode's own blink.
    pub fn show<S: StatusIndicators + ?Sized>(self, indicators: &mut S) {
        for channel in Channel::ALL {
            indicators.set_pattern(channel, self.boot_pattern(channel));
        }
    }

    fn boot_pattern(self, channel: Channel) -> Pattern {
        match (self, channel) {
            (Self::DefaultCredentials, Channel::Green | Channel::Blue) => Pattern::Blink,
            (Self::SoftAp, Channel::Blue) => Pattern::Blip,
            (Self::StoredCredentials, Channel::Blue) => Pattern::Blink,
            _ => Pattern::Off,
        }
    }
}
