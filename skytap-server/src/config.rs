use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

/// Title shown above the launch controls when none is configured
pub const DEFAULT_DISPLAY_NAME: &str = "Skytap XBlock";

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key cannot be empty")]
    EmptyApiKey,

    #[error("Display name cannot be empty")]
    EmptyDisplayName,

    #[error("Settings file does not exist: '{0}'")]
    SettingsNotFound(PathBuf),
}

/// Configuration for the server
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub display_name: String,
    pub settings_path: PathBuf,
    pub params: HashMap<String, String>,
}

impl Config {
    /// Create a new config with validation
    pub fn try_new(
        api_key: String,
        display_name: String,
        settings_path: PathBuf,
        params: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }

        if display_name.trim().is_empty() {
            return Err(ConfigError::EmptyDisplayName);
        }

        if !settings_path.is_file() {
            return Err(ConfigError::SettingsNotFound(settings_path));
        }

        Ok(Self {
            api_key,
            display_name,
            settings_path,
            params,
        })
    }
}
