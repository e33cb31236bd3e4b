//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the texnote.yml schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the conversion backend API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout for backend calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Quiescence window for live-typing conversion, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Quiescence window for editor autosave, in milliseconds.
    #[serde(default = "default_autosave_ms")]
    pub autosave_ms: u64,

    /// Color used for inline error indicators on malformed math.
    #[serde(default = "default_error_color")]
    pub error_color: String,
}

fn default_endpoint() -> String {
    String::from("http://localhost:8000/api")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_autosave_ms() -> u64 {
    2000
}

fn default_error_color() -> String {
    String::from("#cc0000")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            debounce_ms: default_debounce_ms(),
            autosave_ms: default_autosave_ms(),
            error_color: default_error_color(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn autosave(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }
}
