use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    #[default]
    Off,
    On,
}

impl ToggleState {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    Station,
    SoftAp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiStatus {
    Connected,
    Disconnected,
}

/// Seconds reported by the time source. Wraps; compare only through
/// [`Timestamp::elapsed_since`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(pub u32);

impl Timestamp {
    pub fn elapsed_since(self, previous: Timestamp) -> u32 {
        self.0.wrapping_sub(previous.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShadowUpdatePayload {
    pub state: ShadowStateSection,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShadowStateSection {
    pub reported: ReportedState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportedState {
    pub toggle: u8,
}

impl ShadowUpdatePayload {
    pub fn reported(toggle: ToggleState) -> Self {
        Self {
            state: ShadowStateSection {
                reported: ReportedState {
                    toggle: toggle.as_u8(),
                },
            },
        }
    }
}
