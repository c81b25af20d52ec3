//! Wire message envelopes.
//!
//! Every message is JSON. Payload-carrying messages are externally tagged
//! objects (`{"PointerEvent": {...}}`), commands are bare strings
//! (`"GetCapturableList"`). Video chunks travel as binary frames and have no
//! envelope.

use serde::{Deserialize, Serialize};

use crate::event::{KeySample, PointerSample, WheelSample};
use crate::geometry::CustomInputAreas;

/// Capture and encoder parameters requested from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfiguration {
    /// Index into the most recent capturable list.
    pub capturable_id: usize,
    pub uinput_support: bool,
    pub capture_cursor: bool,
    pub max_width: u32,
    pub max_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

/// Client -> host messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundMessage {
    PointerEvent(PointerSample),
    WheelEvent(WheelSample),
    KeyboardEvent(KeySample),
    Config(ClientConfiguration),
    GetCapturableList,
    /// Ask for a frame, but let the host skip it if nothing changed.
    TryGetFrame,
    GetFrame,
    PauseVideo,
    ResumeVideo,
    ChooseCustomInputAreas,
    RequestVirtualKeysProfiles,
    /// JSON-encoded profile array, wrapped as a string.
    SetVirtualKeysProfiles(String),
}

impl OutboundMessage {
    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PointerEvent(_) => "PointerEvent",
            Self::WheelEvent(_) => "WheelEvent",
            Self::KeyboardEvent(_) => "KeyboardEvent",
            Self::Config(_) => "Config",
            Self::GetCapturableList => "GetCapturableList",
            Self::TryGetFrame => "TryGetFrame",
            Self::GetFrame => "GetFrame",
            Self::PauseVideo => "PauseVideo",
            Self::ResumeVideo => "ResumeVideo",
            Self::ChooseCustomInputAreas => "ChooseCustomInputAreas",
            Self::RequestVirtualKeysProfiles => "RequestVirtualKeysProfiles",
            Self::SetVirtualKeysProfiles(_) => "SetVirtualKeysProfiles",
        }
    }
}

/// Host -> client text messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundMessage {
    /// A new elementary stream starts with the next binary frame.
    NewVideo,
    /// The last `Config` was accepted.
    ConfigOk,
    CapturableList(Vec<String>),
    Error(String),
    ConfigError(String),
    CustomInputAreas(CustomInputAreas),
    /// JSON-encoded profile array, wrapped as a string.
    VirtualKeysProfiles(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyEventType, PointerEventType, PointerType};

    fn sample_pointer() -> PointerSample {
        PointerSample {
            event_type: PointerEventType::PointerDown,
            pointer_id: 1,
            timestamp: 1_000,
            is_primary: true,
            pointer_type: PointerType::Pen,
            button: 1,
            buttons: 1,
            x: 0.5,
            y: 0.25,
            movement_x: 0.0,
            movement_y: 0.0,
            pressure: 0.5,
            tilt_x: 0.0,
            tilt_y: 0.0,
            twist: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    #[test]
    fn pointer_event_envelope() {
        let value = serde_json::to_value(OutboundMessage::PointerEvent(sample_pointer())).unwrap();
        let inner = &value["PointerEvent"];
        assert_eq!(inner["event_type"], "pointerdown");
        assert_eq!(inner["pointer_type"], "pen");
        assert_eq!(inner["button"], 1);
    }

    #[test]
    fn sentinel_commands_are_bare_strings() {
        let json = serde_json::to_string(&OutboundMessage::GetCapturableList).unwrap();
        assert_eq!(json, "\"GetCapturableList\"");
        let json = serde_json::to_string(&OutboundMessage::TryGetFrame).unwrap();
        assert_eq!(json, "\"TryGetFrame\"");
    }

    #[test]
    fn config_omits_unset_optionals() {
        let msg = OutboundMessage::Config(ClientConfiguration {
            capturable_id: 2,
            uinput_support: true,
            capture_cursor: false,
            max_width: 1920,
            max_height: 1080,
            frame_rate: None,
            client_name: None,
        });
        let value = serde_json::to_value(&msg).unwrap();
        let config = value["Config"].as_object().unwrap();
        assert_eq!(config["capturable_id"], 2);
        assert!(!config.contains_key("frame_rate"));
        assert!(!config.contains_key("client_name"));
    }

    #[test]
    fn keyboard_event_envelope() {
        let msg = OutboundMessage::KeyboardEvent(KeySample {
            event_type: KeyEventType::Repeat,
            code: "KeyA".to_string(),
            key: "a".to_string(),
            location: 0,
            alt: false,
            ctrl: true,
            shift: false,
            meta: false,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["KeyboardEvent"]["event_type"], "repeat");
        assert_eq!(value["KeyboardEvent"]["ctrl"], true);
    }

    #[test]
    fn set_profiles_is_double_encoded() {
        let msg = OutboundMessage::SetVirtualKeysProfiles("[]".to_string());
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"SetVirtualKeysProfiles":"[]"}"#
        );
    }

    #[test]
    fn inbound_sentinels_and_objects() {
        let msg: InboundMessage = serde_json::from_str("\"NewVideo\"").unwrap();
        assert_eq!(msg, InboundMessage::NewVideo);

        let msg: InboundMessage =
            serde_json::from_str(r#"{"CapturableList":["Desktop","Terminal"]}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::CapturableList(vec!["Desktop".to_string(), "Terminal".to_string()])
        );

        let msg: InboundMessage = serde_json::from_str(r#"{"ConfigError":"bad"}"#).unwrap();
        assert_eq!(msg, InboundMessage::ConfigError("bad".to_string()));
    }

    #[test]
    fn outbound_kind_names() {
        assert_eq!(OutboundMessage::PauseVideo.kind(), "PauseVideo");
        assert_eq!(
            OutboundMessage::SetVirtualKeysProfiles(String::new()).kind(),
            "SetVirtualKeysProfiles"
        );
    }
}
