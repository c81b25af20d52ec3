//! Canonical input samples.
//!
//! These are the payloads of the `PointerEvent`, `WheelEvent` and
//! `KeyboardEvent` wire messages. Coordinates and contact sizes are
//! unit-less ratios so the host can rescale them to its own surface.

use serde::{Deserialize, Serialize};

/// Pointer event kind, serialised with its DOM event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEventType {
    PointerDown,
    PointerUp,
    PointerCancel,
    PointerMove,
    PointerEnter,
    PointerLeave,
    PointerOver,
    PointerOut,
}

impl PointerEventType {
    /// DOM event name, e.g. `"pointerdown"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::PointerUp => "pointerup",
            Self::PointerCancel => "pointercancel",
            Self::PointerMove => "pointermove",
            Self::PointerEnter => "pointerenter",
            Self::PointerLeave => "pointerleave",
            Self::PointerOver => "pointerover",
            Self::PointerOut => "pointerout",
        }
    }
}

impl std::fmt::Display for PointerEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of device behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PointerType {
    #[serde(rename = "mouse")]
    Mouse,
    #[serde(rename = "pen")]
    Pen,
    #[serde(rename = "touch")]
    Touch,
    /// Anything the platform reports that we don't recognise.
    #[serde(rename = "")]
    Unknown,
}

impl<'de> Deserialize<'de> for PointerType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_dom(&s))
    }
}

impl PointerType {
    /// Parse a DOM `pointerType` string.
    #[must_use]
    pub fn from_dom(s: &str) -> Self {
        match s {
            "mouse" => Self::Mouse,
            "pen" => Self::Pen,
            "touch" => Self::Touch,
            _ => Self::Unknown,
        }
    }
}

/// One normalised pointer observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub event_type: PointerEventType,
    pub pointer_id: i64,
    /// Microseconds on the platform's event clock.
    pub timestamp: u64,
    pub is_primary: bool,
    pub pointer_type: PointerType,
    /// Single changed button as a bitmask (see [`remap_button`]).
    pub button: u8,
    /// Raw pressed-buttons bitmask, passed through unchanged.
    pub buttons: u8,
    pub x: f64,
    pub y: f64,
    pub movement_x: f64,
    pub movement_y: f64,
    pub pressure: f64,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub twist: f64,
    /// Contact width divided by the reference rectangle's diagonal.
    pub width: f64,
    /// Contact height divided by the reference rectangle's diagonal.
    pub height: f64,
}

/// Convert the platform's singular `button` value into a wire bitmask.
///
/// The singular field orders the auxiliary (1) and secondary (2) buttons
/// the other way round from the `buttons` bitmask, so those two are swapped
/// before shifting. Negative values (no button changed) map to 0.
#[must_use]
pub fn remap_button(raw: i16) -> u8 {
    let remapped = match raw {
        1 => 2,
        2 => 1,
        other => other,
    };
    match u32::try_from(remapped) {
        Ok(shift) => 1u8.checked_shl(shift).unwrap_or(0),
        Err(_) => 0,
    }
}

/// Unit of a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    /// Map the DOM `deltaMode` constant; unknown values are treated as pixels.
    #[must_use]
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            0x01 => Self::Line,
            0x02 => Self::Page,
            _ => Self::Pixel,
        }
    }

    /// Guesstimated pixels per unit.
    #[must_use]
    pub fn scale(self) -> f64 {
        match self {
            Self::Pixel => 1.0,
            Self::Line => 10.0,
            Self::Page => 1000.0,
        }
    }
}

/// One wheel observation in pixel-equivalent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelSample {
    pub dx: i32,
    pub dy: i32,
    pub timestamp: u64,
}

/// Keyboard event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventType {
    Down,
    Up,
    Repeat,
}

impl KeyEventType {
    /// Pick `Down` or `Repeat` for a keydown based on the platform repeat flag.
    #[must_use]
    pub fn from_keydown(repeat: bool) -> Self {
        if repeat {
            Self::Repeat
        } else {
            Self::Down
        }
    }
}

/// One keyboard observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySample {
    pub event_type: KeyEventType,
    /// Physical key identifier, e.g. `"KeyA"`.
    pub code: String,
    /// Logical key value, e.g. `"a"`.
    pub key: String,
    pub location: u32,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Convert a platform timestamp in milliseconds to wire microseconds.
#[must_use]
pub fn timestamp_us(time_stamp_ms: f64) -> u64 {
    let us = (time_stamp_ms * 1000.0).round();
    if us.is_finite() && us > 0.0 {
        us as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_remap_swaps_secondary_and_auxiliary() {
        assert_eq!(remap_button(0), 0b0000_0001);
        assert_eq!(remap_button(1), 0b0000_0100);
        assert_eq!(remap_button(2), 0b0000_0010);
        assert_eq!(remap_button(3), 0b0000_1000);
        assert_eq!(remap_button(4), 0b0001_0000);
    }

    #[test]
    fn button_remap_no_button() {
        assert_eq!(remap_button(-1), 0);
        assert_eq!(remap_button(i16::MIN), 0);
    }

    #[test]
    fn button_remap_out_of_range_is_zero() {
        assert_eq!(remap_button(8), 0);
        assert_eq!(remap_button(7), 0b1000_0000);
    }

    #[test]
    fn pointer_event_type_serializes_as_dom_name() {
        let json = serde_json::to_string(&PointerEventType::PointerCancel).unwrap();
        assert_eq!(json, "\"pointercancel\"");
        assert_eq!(PointerEventType::PointerOver.to_string(), "pointerover");
    }

    #[test]
    fn unknown_pointer_type() {
        assert_eq!(PointerType::from_dom("stylus"), PointerType::Unknown);
        let parsed: PointerType = serde_json::from_str("\"eraser\"").unwrap();
        assert_eq!(parsed, PointerType::Unknown);
        assert_eq!(serde_json::to_string(&PointerType::Unknown).unwrap(), "\"\"");
    }

    #[test]
    fn delta_mode_scale() {
        assert_eq!(DeltaMode::from_dom(0).scale(), 1.0);
        assert_eq!(DeltaMode::from_dom(1).scale(), 10.0);
        assert_eq!(DeltaMode::from_dom(2).scale(), 1000.0);
        assert_eq!(DeltaMode::from_dom(9), DeltaMode::Pixel);
    }

    #[test]
    fn keydown_repeat_flag() {
        assert_eq!(KeyEventType::from_keydown(false), KeyEventType::Down);
        assert_eq!(KeyEventType::from_keydown(true), KeyEventType::Repeat);
    }

    #[test]
    fn timestamp_conversion() {
        assert_eq!(timestamp_us(12.3456), 12_346);
        assert_eq!(timestamp_us(-1.0), 0);
        assert_eq!(timestamp_us(f64::NAN), 0);
    }
}
