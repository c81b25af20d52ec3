//! Config loading and saving.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::ClientError;

/// Load configuration from the given path, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ClientError> {
    let config_path = path.map_or_else(default_config_path, Path::to_path_buf);

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ClientError::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ClientError::Config(format!("failed to parse config: {e}")))?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        info!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Write configuration to the given path, or the default location.
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<PathBuf, ClientError> {
    let config_path = path.map_or_else(default_config_path, Path::to_path_buf);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ClientError::Config(format!("failed to create config dir: {e}")))?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {e}")))?;
    std::fs::write(&config_path, content)
        .map_err(|e| ClientError::Config(format!("failed to write config: {e}")))?;

    info!(path = %config_path.display(), "saved config");
    Ok(config_path)
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("glasspane")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}
