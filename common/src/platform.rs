//! Collaborator interfaces the node drives. Every call is expected to return
//! promptly; the scheduler has no other task to run while one is in flight.

use crate::{
    config::WifiCredentials,
    error::{CloudError, IdentityError},
    indicator::StatusIndicators,
    types::{Timestamp, WifiMode},
};

pub trait CloudTransport {
    /// Hands a message to the transport. Must not wait for delivery.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CloudError>;

    /// Inbound messages matching `filter` are delivered back through
    /// [`crate::Node::received_from_cloud`].
    fn register_subscription(&mut self, filter: &str);

    fn is_connected(&self) -> bool;

    /// Asks the transport to restart its connection attempt.
    fn set_init_flag(&mut self);

    fn setup_task(&mut self, device_id: &str);
}

pub trait Sensors {
    /// Hundredths of a degree.
    fn temperature_centi(&mut self) -> i32;
    fn light(&mut self) -> i32;
}

pub trait TimeSource {
    /// Scheduler clock.
    fn monotonic_ms(&self) -> u64;

    fn current_time(&self) -> Timestamp {
        Timestamp((self.monotonic_ms() / 1_000) as u32)
    }

    fn elapsed(&self, now: Timestamp, previous: Timestamp) -> u32 {
        now.elapsed_since(previous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Default(WifiCredentials),
    Stored,
}

pub trait WifiControl {
    fn wifi_init(&mut self, mode: WifiMode, credentials: CredentialSource);
}

/// Secure element holding the device serial.
pub trait Identity {
    /// Brings the element up. A failure is reported, but the serial is still
    /// read afterwards.
    fn init(&mut self) -> Result<(), IdentityError> {
        Ok(())
    }

    fn device_id(&mut self) -> Result<String, IdentityError>;
}

/// Raw levels of the two boot-mode inputs.
pub trait BootInputs {
    fn sw0(&mut self) -> bool;
    fn sw1(&mut self) -> bool;
}

pub trait Platform:
    CloudTransport + Sensors + StatusIndicators + TimeSource + WifiControl
{
}

impl<T> Platform for T where
    T: CloudTransport + Sensors + StatusIndicators + TimeSource + WifiControl
{
}
