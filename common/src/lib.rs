pub mod boot;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod error;
pub mod indicator;
pub mod node;
pub mod platform;
pub mod scheduler;
pub mod shadow;
pub mod telemetry;
pub mod topics;
pub mod types;

#[cfg(test)]
mod testing;

pub use boot::{BootMode, InputSample};
pub use config::{NetworkConfig, NodeConfig, RuntimeConfig, WifiAuth, WifiCredentials};
pub use connectivity::{ConnectionPhase, ConnectivityState};
pub use context::NodeContext;
pub use error::{CloudError, IdentityError, TimerError};
pub use indicator::{Channel, Pattern, StatusIndicators};
pub use node::{Node, PLACEHOLDER_DEVICE_ID, TIMER_CAPACITY};
pub use platform::{
    BootInputs, CloudTransport, CredentialSource, Identity, Platform, Sensors, TimeSource,
    WifiControl,
};
pub use scheduler::{Schedule, Task, TimerId, TimerRegistry};
pub use shadow::{ShadowInitTask, ShadowState};
pub use telemetry::DataTask;
pub use topics::*;
pub use types::{Timestamp, ToggleState, WifiMode, WifiStatus};
