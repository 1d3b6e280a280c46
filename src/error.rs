//! Error taxonomy for padcast
//!
//! Configuration problems are fatal and reported before any loop starts.
//! Transport and hardware errors are recovered where they occur so that one
//! failing collaborator cannot take down the rest of the gateway.

use thiserror::Error;

/// Fatal configuration problems, detected before any routing starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config must contain at least one channel")]
    NoChannels,

    #[error("slider thresholds inverted: lower_threshold {lower} must be below upper_threshold {upper}")]
    InvertedThresholds { lower: i32, upper: i32 },

    #[error("invalid hotkey {hotkey:?}: {reason}")]
    InvalidHotkey { hotkey: String, reason: String },
}

/// Programmer error: an internal channel index that validated configuration
/// can never produce.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("channel index {index} out of range (registry has {len} channels)")]
    OutOfRange { index: usize, len: usize },
}

/// A channel transport failed. Recovered per send attempt; never stops the
/// broadcast loop or other channels.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected to {addr}")]
    NotConnected { addr: String },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("send to {addr} failed: {source}")]
    Send {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The slider/button peripheral bridge failed. Fatal for that subsystem only.
#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("failed to reach hardware bridge at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bridge write failed: {0}")]
    Write(#[from] std::io::Error),
}
