//! The settings contract shared by the input and playback pipelines.
//!
//! The settings UI owns and mutates the values; the pipelines only read
//! them, once per event or frame, through [`SettingsProvider`].

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::PointerType;
use crate::geometry::{CustomInputAreas, InputArea};

/// Read-only view of the client settings.
pub trait SettingsProvider: Send + Sync {
    /// Whether events from this kind of pointer are forwarded.
    fn is_pointer_type_enabled(&self, pointer_type: PointerType) -> bool;

    /// Floor applied to reported pressure.
    fn min_pressure(&self) -> f64;

    /// Seek to live as soon as the element has current data (instead of
    /// waiting for enough data to play through).
    fn aggressive_seek(&self) -> bool;

    /// Custom input area for a pointer type, if remapping is enabled for it.
    fn custom_input_area(&self, pointer_type: PointerType) -> Option<InputArea>;

    /// Delay between frame requests.
    fn frame_update_interval(&self) -> Duration;

    /// Whether frames should be requested at all.
    fn video_enabled(&self) -> bool;

    /// While the settings panel is open keyboard input stays local.
    fn settings_panel_open(&self) -> bool;
}

/// A snapshot of every setting the pipelines read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enable_mouse: bool,
    #[serde(default = "default_true")]
    pub enable_stylus: bool,
    #[serde(default = "default_true")]
    pub enable_touch: bool,
    #[serde(default)]
    pub min_pressure: f64,
    #[serde(default)]
    pub aggressive_seeking: bool,
    #[serde(default)]
    pub enable_custom_input_areas: bool,
    #[serde(default)]
    pub custom_input_areas: CustomInputAreas,
    /// Milliseconds between frame requests.
    #[serde(default = "default_frame_update_limit")]
    pub frame_update_limit: f64,
    #[serde(default = "default_true")]
    pub enable_video: bool,
    #[serde(skip)]
    pub settings_panel_open: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_mouse: true,
            enable_stylus: true,
            enable_touch: true,
            min_pressure: 0.0,
            aggressive_seeking: false,
            enable_custom_input_areas: false,
            custom_input_areas: CustomInputAreas::default(),
            frame_update_limit: default_frame_update_limit(),
            enable_video: true,
            settings_panel_open: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_frame_update_limit() -> f64 {
    33.0
}

/// Range of frame request intervals, in ms.
pub const MIN_FRAME_UPDATE_LIMIT: f64 = 1.0;
pub const MAX_FRAME_UPDATE_LIMIT: f64 = 1000.0;

impl SettingsProvider for Settings {
    fn is_pointer_type_enabled(&self, pointer_type: PointerType) -> bool {
        match pointer_type {
            PointerType::Mouse => self.enable_mouse,
            PointerType::Pen => self.enable_stylus,
            PointerType::Touch => self.enable_touch,
            PointerType::Unknown => false,
        }
    }

    fn min_pressure(&self) -> f64 {
        self.min_pressure
    }

    fn aggressive_seek(&self) -> bool {
        self.aggressive_seeking
    }

    fn custom_input_area(&self, pointer_type: PointerType) -> Option<InputArea> {
        if self.enable_custom_input_areas {
            self.custom_input_areas.for_pointer(pointer_type)
        } else {
            None
        }
    }

    /// Clamped to the slider range; a non-finite limit means the default.
    fn frame_update_interval(&self) -> Duration {
        let ms = if self.frame_update_limit.is_finite() {
            self.frame_update_limit
                .clamp(MIN_FRAME_UPDATE_LIMIT, MAX_FRAME_UPDATE_LIMIT)
        } else {
            default_frame_update_limit()
        };
        Duration::from_micros((ms * 1000.0).round() as u64)
    }

    fn video_enabled(&self) -> bool {
        self.enable_video
    }

    fn settings_panel_open(&self) -> bool {
        self.settings_panel_open
    }
}

/// Clonable handle to settings shared between the UI and the pipelines.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current values.
    #[must_use]
    pub fn snapshot(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the settings in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn read<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

impl SettingsProvider for SharedSettings {
    fn is_pointer_type_enabled(&self, pointer_type: PointerType) -> bool {
        self.read(|s| s.is_pointer_type_enabled(pointer_type))
    }

    fn min_pressure(&self) -> f64 {
        self.read(SettingsProvider::min_pressure)
    }

    fn aggressive_seek(&self) -> bool {
        self.read(SettingsProvider::aggressive_seek)
    }

    fn custom_input_area(&self, pointer_type: PointerType) -> Option<InputArea> {
        self.read(|s| s.custom_input_area(pointer_type))
    }

    fn frame_update_interval(&self) -> Duration {
        self.read(SettingsProvider::frame_update_interval)
    }

    fn video_enabled(&self) -> bool {
        self.read(SettingsProvider::video_enabled)
    }

    fn settings_panel_open(&self) -> bool {
        self.read(SettingsProvider::settings_panel_open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pointer_types_are_disabled() {
        let settings = Settings::default();
        assert!(settings.is_pointer_type_enabled(PointerType::Mouse));
        assert!(!settings.is_pointer_type_enabled(PointerType::Unknown));
    }

    #[test]
    fn custom_area_requires_global_toggle() {
        let area = InputArea {
            x: 0.5,
            y: 0.0,
            w: 0.5,
            h: 1.0,
        };
        let mut settings = Settings::default();
        settings.custom_input_areas.pen = Some(area);
        assert_eq!(settings.custom_input_area(PointerType::Pen), None);

        settings.enable_custom_input_areas = true;
        assert_eq!(settings.custom_input_area(PointerType::Pen), Some(area));
        assert_eq!(settings.custom_input_area(PointerType::Touch), None);
    }

    #[test]
    fn frame_update_interval_from_millis() {
        let settings = Settings {
            frame_update_limit: 250.0,
            ..Settings::default()
        };
        assert_eq!(settings.frame_update_interval(), Duration::from_millis(250));
    }

    #[test]
    fn frame_update_interval_is_clamped() {
        let interval = |limit: f64| {
            Settings {
                frame_update_limit: limit,
                ..Settings::default()
            }
            .frame_update_interval()
        };
        assert_eq!(interval(0.0), Duration::from_millis(1));
        assert_eq!(interval(-20.0), Duration::from_millis(1));
        assert_eq!(interval(0.5), Duration::from_millis(1));
        assert_eq!(interval(5000.0), Duration::from_secs(1));
        assert_eq!(interval(f64::INFINITY), Duration::from_millis(33));
        assert_eq!(interval(f64::NEG_INFINITY), Duration::from_millis(33));
        assert_eq!(interval(f64::NAN), Duration::from_millis(33));
        assert_eq!(interval(12.5), Duration::from_micros(12_500));
    }

    #[test]
    fn shared_settings_see_updates() {
        let shared = SharedSettings::default();
        let reader = shared.clone();
        assert!(!reader.aggressive_seek());
        shared.update(|s| s.aggressive_seeking = true);
        assert!(reader.aggressive_seek());
        assert!(reader.snapshot().aggressive_seeking);
    }

    #[test]
    fn settings_panel_state_is_not_persisted() {
        let settings = Settings {
            settings_panel_open: true,
            ..Settings::default()
        };
        let toml_like = serde_json::to_value(&settings).unwrap();
        assert!(toml_like.get("settings_panel_open").is_none());
    }
}
