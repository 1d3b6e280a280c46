//! Configuration management for padcast
//!
//! Handles loading and validating the YAML configuration file. Validation is
//! fail-fast: zero channels, inverted slider thresholds, or an unparseable
//! hotkey abort startup before any routing loop runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ConfigError;
use crate::keys::KeyCombo;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Index of the local gamepad to read
    #[serde(default)]
    pub local_gamepad_index: usize,
    /// Remote receivers, in declaration order. The order is semantically
    /// meaningful: it fixes channel indices for slider sections and hotkeys.
    pub channels: Vec<ChannelConfig>,
    /// Slider/push-button peripheral bridge; optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<HardwareConfig>,
    /// Hotkey poll period in milliseconds
    #[serde(default = "default_hotkey_poll_ms")]
    pub hotkey_poll_ms: u64,
    /// Upper bound for one transport send
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

/// One remote receiver of broadcast gamepad state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_host")]
    pub host: String,
    #[serde(default = "default_channel_port")]
    pub port: u16,
    /// Logical sub-device on the remote end
    #[serde(default)]
    pub remote_index: u8,
    /// Opaque credentials handed to the transport
    #[serde(default)]
    pub encryption_key: String,
    #[serde(default = "default_encryption_mode")]
    pub encryption_mode: String,
    /// Toggle hotkey; empty string means this channel has no hotkey binding
    #[serde(default)]
    pub hotkey: String,
    /// Physical indicator reflecting this channel's active state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<IndicatorConfig>,
}

/// Indicator binding: which lamp, and its on/off colors
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicatorConfig {
    pub uid: String,
    #[serde(default = "default_color_on")]
    pub color_on: [u8; 3],
    #[serde(default = "default_color_off")]
    pub color_off: [u8; 3],
}

/// Hardware bridge connection plus slider identity and thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    #[serde(default = "default_hardware_host")]
    pub host: String,
    #[serde(default = "default_hardware_port")]
    pub port: u16,
    pub slider: SliderConfig,
}

/// Linear slider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SliderConfig {
    pub uid: String,
    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: i32,
    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: i32,
}

impl Config {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        Ok(config)
    }

    /// Validate the settings that must hold before any loop starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }

        for channel in &self.channels {
            if !channel.hotkey.is_empty() {
                KeyCombo::parse(&channel.hotkey)?;
            }
        }

        if let Some(hardware) = &self.hardware {
            let slider = &hardware.slider;
            if slider.lower_threshold >= slider.upper_threshold {
                return Err(ConfigError::InvertedThresholds {
                    lower: slider.lower_threshold,
                    upper: slider.upper_threshold,
                });
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_channel_host() -> String {
    "localhost".to_string()
}
fn default_channel_port() -> u16 {
    33010
}
fn default_encryption_mode() -> String {
    "aes-gcm".to_string()
}
fn default_color_on() -> [u8; 3] {
    [15, 15, 15]
}
fn default_color_off() -> [u8; 3] {
    [1, 1, 1]
}
fn default_hardware_host() -> String {
    "localhost".to_string()
}
fn default_hardware_port() -> u16 {
    4223
}
fn default_lower_threshold() -> i32 {
    5
}
fn default_upper_threshold() -> i32 {
    95
}
fn default_hotkey_poll_ms() -> u64 {
    5
}
fn default_send_timeout_ms() -> u64 {
    50
}
