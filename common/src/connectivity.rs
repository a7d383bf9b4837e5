use crate::types::WifiStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    ProvisioningSoftAp,
    ConnectingToAp,
    ConnectedNoCloud,
    ConnectedWithCloud,
    Error,
}

impl ConnectionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProvisioningSoftAp => "PROVISIONING_SOFT_AP",
            Self::ConnectingToAp => "CONNECTING_TO_AP",
            Self::ConnectedNoCloud => "CONNECTED_NO_CLOUD",
            Self::ConnectedWithCloud => "CONNECTED_WITH_CLOUD",
            Self::Error => "ERROR",
        }
    }
}

/// Network flags shared by every task. Mutated only through the methods
/// below so `am_connecting_ap`/`am_soft_ap` stay exclusive and an AP
/// connection always ends the connecting phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityState {
    have_ap_connection: bool,
    am_connecting_ap: bool,
    am_connecting_socket: bool,
    am_soft_ap: bool,
    am_default_cred: bool,
    have_error: bool,
}

impl ConnectivityState {
    pub fn have_ap_connection(&self) -> bool {
        self.have_ap_connection
    }

    pub fn am_connecting_ap(&self) -> bool {
        self.am_connecting_ap
    }

    pub fn am_connecting_socket(&self) -> bool {
        self.am_connecting_socket
    }

    pub fn am_soft_ap(&self) -> bool {
        self.am_soft_ap
    }

    pub fn am_default_cred(&self) -> bool {
        self.am_default_cred
    }

    pub fn have_error(&self) -> bool {
        self.have_error
    }

    pub fn begin_station_connect(&mut self, default_credentials: bool) {
        self.am_connecting_ap = !self.have_ap_connection;
        self.am_soft_ap = false;
        self.am_default_cred = default_credentials;
    }

    pub fn enter_soft_ap(&mut self) {
        self.am_connecting_ap = false;
        self.am_soft_ap = true;
        self.am_default_cred = false;
    }

    /// Applies a WiFi link change. Returns `true` when the link was lost and
    /// the cloud connection needs to be restarted.
    pub fn apply_wifi_status(&mut self, status: WifiStatus) -> bool {
        match status {
            WifiStatus::Connected => {
                self.have_ap_connection = true;
                self.am_connecting_ap = false;
                false
            }
            WifiStatus::Disconnected => {
                self.have_ap_connection = false;
                true
            }
        }
    }

    pub fn set_connecting_socket(&mut self, connecting: bool) {
        self.am_connecting_socket = connecting;
    }

    /// Latches the error flag. Nothing in the node clears it.
    pub fn mark_error(&mut self) {
        self.have_error = true;
    }

    pub fn phase(&self, cloud_connected: bool) -> ConnectionPhase {
        if self.have_error {
            ConnectionPhase::Error
        } else if self.am_soft_ap {
            ConnectionPhase::ProvisioningSoftAp
        } else if !self.have_ap_connection {
            ConnectionPhase::ConnectingToAp
        } else if cloud_connected {
            ConnectionPhase::ConnectedWithCloud
        } else {
            ConnectionPhase::ConnectedNoCloud
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(state: &ConnectivityState) {
        assert!(!(state.am_connecting_ap() && state.am_soft_ap()));
        assert!(!(state.have_ap_connection() && state.am_connecting_ap()));
    }

    #[test]
    fn soft_ap_clears_connecting() {
        let mut state = ConnectivityState::default();
        state.begin_station_connect(true);
        state.enter_soft_ap();

        assert!(state.am_soft_ap());
        assert!(!state.am_connecting_ap());
        assert!(!state.am_default_cred());
        assert_invariants(&state);
    }

    #[test]
    fn link_up_ends_connecting_phase() {
        let mut state = ConnectivityState::default();
        state.begin_station_connect(false);
        assert_eq!(state.phase(false), ConnectionPhase::ConnectingToAp);

        assert!(!state.apply_wifi_status(WifiStatus::Connected));

        assert!(state.have_ap_connection());
        assert!(!state.am_connecting_ap());
        assert_eq!(state.phase(false), ConnectionPhase::ConnectedNoCloud);
        assert_eq!(state.phase(true), ConnectionPhase::ConnectedWithCloud);
        assert_invariants(&state);
    }

    #[test]
    fn link_loss_requests_cloud_restart() {
        let mut state = ConnectivityState::default();
        state.apply_wifi_status(WifiStatus::Connected);

        assert!(state.apply_wifi_status(WifiStatus::Disconnected));
        assert!(!state.have_ap_connection());
        assert_invariants(&state);
    }

    #[test]
    fn error_flag_latches_and_dominates_phase() {
        let mut state = ConnectivityState::default();
        state.mark_error();
        state.apply_wifi_status(WifiStatus::Connected);
        state.apply_wifi_status(WifiStatus::Disconnected);

        assert!(state.have_error());
        assert_eq!(state.phase(true), ConnectionPhase::Error);
    }
}
