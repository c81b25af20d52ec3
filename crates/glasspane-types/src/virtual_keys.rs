//! Virtual on-screen key profiles.
//!
//! Profiles are edited elsewhere; the client only stores them on the host
//! and fetches them back. On the wire they travel as a JSON string inside
//! the JSON envelope.

use serde::{Deserialize, Serialize};

use crate::event::KeySample;

/// One on-screen key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualKey {
    /// Horizontal position, percent of the viewport.
    pub x: f64,
    /// Vertical position, percent of the viewport.
    pub y: f64,
    /// Pixels.
    pub width: f64,
    /// Pixels.
    pub height: f64,
    /// Key sent when pressed; `event_type` is ignored.
    #[serde(default)]
    pub key: Option<KeySample>,
}

/// A named set of on-screen keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualKeyProfile {
    pub name: String,
    #[serde(default)]
    pub keys: Vec<VirtualKey>,
}

/// Encode profiles as the inner JSON string.
pub fn encode_profiles(profiles: &[VirtualKeyProfile]) -> Result<String, serde_json::Error> {
    serde_json::to_string(profiles)
}

/// Decode the inner JSON string of a `VirtualKeysProfiles` message.
pub fn decode_profiles(raw: &str) -> Result<Vec<VirtualKeyProfile>, serde_json::Error> {
    serde_json::from_str(raw)
}
