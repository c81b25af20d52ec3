//! Shared types for glasspane.
//!
//! This crate contains all types shared across the glasspane workspace:
//! canonical input samples, reference geometry, wire message envelopes,
//! the settings contract, and virtual key profiles.

pub mod event;
pub mod geometry;
pub mod message;
pub mod settings;
pub mod virtual_keys;

pub use event::{
    remap_button, timestamp_us, DeltaMode, KeyEventType, KeySample, PointerEventType,
    PointerSample, PointerType, WheelSample,
};
pub use geometry::{ClientRect, CustomInputAreas, InputArea};
pub use message::{ClientConfiguration, InboundMessage, OutboundMessage};
pub use settings::{Settings, SettingsProvider, SharedSettings};
pub use virtual_keys::{decode_profiles, encode_profiles, VirtualKey, VirtualKeyProfile};
