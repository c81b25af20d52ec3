//! Raw platform input events.
//!
//! Field-for-field copies of what the platform hands the listener, before
//! any normalisation. They (de)serialize as snake_case JSON so recorded
//! sessions can be replayed from JSON lines.

use glasspane_types::{DeltaMode, PointerEventType, PointerType};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A platform pointer event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPointerEvent {
    pub pointer_id: i64,
    /// Milliseconds on the platform's event clock.
    pub time_stamp: f64,
    #[serde(default)]
    pub is_primary: bool,
    pub pointer_type: PointerType,
    /// Singular changed button, -1 when none.
    #[serde(default = "no_button")]
    pub button: i16,
    #[serde(default)]
    pub buttons: u8,
    pub client_x: f64,
    pub client_y: f64,
    #[serde(default)]
    pub movement_x: Option<f64>,
    #[serde(default)]
    pub movement_y: Option<f64>,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub tilt_x: f64,
    #[serde(default)]
    pub tilt_y: f64,
    #[serde(default)]
    pub twist: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// High-frequency samples folded into this event, when the platform
    /// exposes them.
    #[serde(default)]
    pub coalesced: Option<Vec<RawPointerEvent>>,
}

fn no_button() -> i16 {
    -1
}

/// A platform wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawWheelEvent {
    pub delta_x: f64,
    pub delta_y: f64,
    #[serde(default)]
    pub delta_mode: DeltaMode,
    pub time_stamp: f64,
}

/// A platform keyboard event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeyEvent {
    pub code: String,
    pub key: String,
    #[serde(default)]
    pub location: u32,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub meta_key: bool,
}

/// One line of a recorded input session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedEvent {
    Pointer {
        event_type: PointerEventType,
        #[serde(flatten)]
        event: RawPointerEvent,
    },
    Wheel {
        #[serde(flatten)]
        event: RawWheelEvent,
    },
    KeyDown {
        #[serde(flatten)]
        event: RawKeyEvent,
    },
    KeyUp {
        #[serde(flatten)]
        event: RawKeyEvent,
    },
}

impl RecordedEvent {
    /// Parse one JSON line.
    pub fn from_json_line(line: &str) -> Result<Self, InputError> {
        serde_json::from_str(line).map_err(|e| InputError::InvalidEvent(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_event_defaults() {
        let raw: RawPointerEvent = serde_json::from_str(
            r#"{"pointer_id":1,"time_stamp":10.5,"pointer_type":"touch","client_x":5,"client_y":6}"#,
        )
        .unwrap();
        assert_eq!(raw.button, -1);
        assert_eq!(raw.movement_x, None);
        assert_eq!(raw.coalesced, None);
        assert_eq!(raw.pointer_type, PointerType::Touch);
    }

    #[test]
    fn wheel_event_default_mode_is_pixels() {
        let raw: RawWheelEvent =
            serde_json::from_str(r#"{"delta_x":1,"delta_y":2,"time_stamp":0}"#).unwrap();
        assert_eq!(raw.delta_mode, DeltaMode::Pixel);
    }

    #[test]
    fn recorded_lines_parse() {
        let line = r#"{"kind":"pointer","event_type":"pointerdown","pointer_id":1,"time_stamp":3,"pointer_type":"mouse","button":0,"client_x":1,"client_y":2}"#;
        match RecordedEvent::from_json_line(line).unwrap() {
            RecordedEvent::Pointer { event_type, event } => {
                assert_eq!(event_type, PointerEventType::PointerDown);
                assert_eq!(event.button, 0);
            }
            other => panic!("unexpected {other:?}"),
        }

        let line = r#"{"kind":"key_down","code":"KeyA","key":"a","repeat":true}"#;
        assert!(matches!(
            RecordedEvent::from_json_line(line).unwrap(),
            RecordedEvent::KeyDown { event } if event.repeat
        ));
    }

    #[test]
    fn garbage_line_is_rejected() {
        assert!(matches!(
            RecordedEvent::from_json_line("{not json"),
            Err(InputError::InvalidEvent(_))
        ));
    }
}
