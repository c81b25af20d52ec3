//! Client configuration loaded from TOML.

use glasspane_types::{ClientConfiguration, CustomInputAreas, Settings};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

/// Client identity and runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name reported to the host.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Where the host is and how to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Use `wss://`.
    #[serde(default)]
    pub secure: bool,
    /// Sent verbatim as the first frame after connecting.
    #[serde(default)]
    pub access_code: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure: false,
            access_code: None,
        }
    }
}

/// What the host captures and how large the stream may be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Index into the host's capturable list.
    #[serde(default)]
    pub capturable_id: usize,
    #[serde(default = "default_true")]
    pub uinput_support: bool,
    #[serde(default = "default_true")]
    pub capture_cursor: bool,
    /// Fraction of the viewport resolution to request.
    #[serde(default = "default_scale_video")]
    pub scale_video: f64,
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capturable_id: 0,
            uinput_support: true,
            capture_cursor: true,
            scale_video: default_scale_video(),
            frame_rate: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            device_pixel_ratio: default_device_pixel_ratio(),
        }
    }
}

/// Input forwarding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_true")]
    pub enable_mouse: bool,
    #[serde(default = "default_true")]
    pub enable_stylus: bool,
    #[serde(default = "default_true")]
    pub enable_touch: bool,
    /// Floor for reported pressure, for devices that always report 0.
    #[serde(default)]
    pub min_pressure: f64,
    #[serde(default)]
    pub enable_custom_input_areas: bool,
    #[serde(default)]
    pub custom_input_areas: CustomInputAreas,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            enable_mouse: true,
            enable_stylus: true,
            enable_touch: true,
            min_pressure: 0.0,
            enable_custom_input_areas: false,
            custom_input_areas: CustomInputAreas::default(),
        }
    }
}

/// Playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Jump to live as soon as some future data is buffered.
    #[serde(default)]
    pub aggressive_seeking: bool,
    /// Milliseconds between frame requests.
    #[serde(default = "default_frame_update_limit")]
    pub frame_update_limit: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            aggressive_seeking: false,
            frame_update_limit: default_frame_update_limit(),
        }
    }
}

impl Config {
    /// Settings snapshot the pipelines read.
    pub fn settings(&self) -> Settings {
        Settings {
            enable_mouse: self.input.enable_mouse,
            enable_stylus: self.input.enable_stylus,
            enable_touch: self.input.enable_touch,
            min_pressure: self.input.min_pressure,
            aggressive_seeking: self.video.aggressive_seeking,
            enable_custom_input_areas: self.input.enable_custom_input_areas,
            custom_input_areas: self.input.custom_input_areas,
            frame_update_limit: self.video.frame_update_limit,
            enable_video: self.video.enabled,
            settings_panel_open: false,
        }
    }

    /// Fold a settings snapshot back into the configuration.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.input.enable_mouse = settings.enable_mouse;
        self.input.enable_stylus = settings.enable_stylus;
        self.input.enable_touch = settings.enable_touch;
        self.input.min_pressure = settings.min_pressure;
        self.input.enable_custom_input_areas = settings.enable_custom_input_areas;
        self.input.custom_input_areas = settings.custom_input_areas;
        self.video.aggressive_seeking = settings.aggressive_seeking;
        self.video.frame_update_limit = settings.frame_update_limit;
        self.video.enabled = settings.enable_video;
    }

    /// Largest stream resolution worth requesting for the current viewport.
    pub fn max_video_resolution(&self) -> (u32, u32) {
        let c = &self.capture;
        let scale = c.scale_video * c.device_pixel_ratio;
        (
            (scale * c.viewport_width).round().max(0.0) as u32,
            (scale * c.viewport_height).round().max(0.0) as u32,
        )
    }

    /// The `Config` message for the host.
    pub fn client_configuration(&self) -> ClientConfiguration {
        let (max_width, max_height) = self.max_video_resolution();
        ClientConfiguration {
            capturable_id: self.capture.capturable_id,
            uinput_support: self.capture.uinput_support,
            capture_cursor: self.capture.capture_cursor,
            max_width,
            max_height,
            frame_rate: self.capture.frame_rate,
            client_name: Some(self.client.name.clone()).filter(|n| !n.is_empty()),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_default()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9001
}

fn default_scale_video() -> f64 {
    1.0
}

fn default_viewport_width() -> f64 {
    1920.0
}

fn default_viewport_height() -> f64 {
    1080.0
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

fn default_frame_update_limit() -> f64 {
    33.0
}
