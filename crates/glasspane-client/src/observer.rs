//! Notifications for the embedding user interface.

use glasspane_types::{CustomInputAreas, VirtualKeyProfile};
use tracing::{error, info, warn};

use crate::state::ConnectionId;

/// Receives everything the user should see. All methods default to no-ops.
pub trait ClientObserver: Send {
    /// A connection attempt started.
    fn on_connecting(&mut self, _id: ConnectionId) {}

    /// The socket opened and the handshake was sent.
    fn on_connected(&mut self, _id: ConnectionId) {}

    /// The host accepted the configuration.
    fn on_config_ok(&mut self) {}

    /// The connection is gone. The user has to ask for a reconnect.
    fn on_disconnected(&mut self, _reason: &str) {}

    fn on_capturable_list(&mut self, _names: &[String]) {}

    /// The host reported an error.
    fn on_error(&mut self, _message: &str) {}

    /// The host rejected the configuration.
    fn on_config_error(&mut self, _message: &str) {}

    fn on_custom_input_areas(&mut self, _areas: &CustomInputAreas) {}

    fn on_virtual_key_profiles(&mut self, _profiles: &[VirtualKeyProfile]) {}

    /// Measured frame rate.
    fn on_fps(&mut self, _fps: f64) {}

    /// Pointer input closed the settings panel.
    fn on_settings_panel_dismissed(&mut self) {}
}

/// Observer that reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ClientObserver for LogObserver {
    fn on_connecting(&mut self, id: ConnectionId) {
        info!(%id, "connecting");
    }

    fn on_connected(&mut self, id: ConnectionId) {
        info!(%id, "connected");
    }

    fn on_config_ok(&mut self) {
        info!("configuration accepted");
    }

    fn on_disconnected(&mut self, reason: &str) {
        warn!(reason, "disconnected");
    }

    fn on_capturable_list(&mut self, names: &[String]) {
        for (index, name) in names.iter().enumerate() {
            info!(index, name = %name, "capturable");
        }
    }

    fn on_error(&mut self, message: &str) {
        error!(message, "host error");
    }

    fn on_config_error(&mut self, message: &str) {
        error!(message, "host rejected configuration");
    }

    fn on_custom_input_areas(&mut self, areas: &CustomInputAreas) {
        info!(?areas, "custom input areas updated");
    }

    fn on_virtual_key_profiles(&mut self, profiles: &[VirtualKeyProfile]) {
        info!(count = profiles.len(), "virtual key profiles received");
    }

    fn on_fps(&mut self, fps: f64) {
        info!(fps, "frame rate");
    }
}

/// Observer that records every notification, for tests.
#[cfg(any(test, feature = "mock"))]
pub mod recording {
    use std::sync::{Arc, Mutex};

    use super::{ClientObserver, ConnectionId, CustomInputAreas, VirtualKeyProfile};

    /// One recorded notification.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Notification {
        Connecting(ConnectionId),
        Connected(ConnectionId),
        ConfigOk,
        Disconnected(String),
        CapturableList(Vec<String>),
        Error(String),
        ConfigError(String),
        CustomInputAreas(CustomInputAreas),
        VirtualKeyProfiles(Vec<VirtualKeyProfile>),
        Fps(f64),
        SettingsPanelDismissed,
    }

    #[derive(Debug, Clone, Default)]
    pub struct RecordingObserver {
        seen: Arc<Mutex<Vec<Notification>>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.seen.lock().unwrap().clone()
        }

        fn push(&self, n: Notification) {
            self.seen.lock().unwrap().push(n);
        }
    }

    impl ClientObserver for RecordingObserver {
        fn on_connecting(&mut self, id: ConnectionId) {
            self.push(Notification::Connecting(id));
        }

        fn on_connected(&mut self, id: ConnectionId) {
            self.push(Notification::Connected(id));
        }

        fn on_config_ok(&mut self) {
            self.push(Notification::ConfigOk);
        }

        fn on_disconnected(&mut self, reason: &str) {
            self.push(Notification::Disconnected(reason.to_string()));
        }

        fn on_capturable_list(&mut self, names: &[String]) {
            self.push(Notification::CapturableList(names.to_vec()));
        }

        fn on_error(&mut self, message: &str) {
            self.push(Notification::Error(message.to_string()));
        }

        fn on_config_error(&mut self, message: &str) {
            self.push(Notification::ConfigError(message.to_string()));
        }

        fn on_custom_input_areas(&mut self, areas: &CustomInputAreas) {
            self.push(Notification::CustomInputAreas(*areas));
        }

        fn on_virtual_key_profiles(&mut self, profiles: &[VirtualKeyProfile]) {
            self.push(Notification::VirtualKeyProfiles(profiles.to_vec()));
        }

        fn on_fps(&mut self, fps: f64) {
            self.push(Notification::Fps(fps));
        }

        fn on_settings_panel_dismissed(&mut self) {
            self.push(Notification::SettingsPanelDismissed);
        }
    }
}
