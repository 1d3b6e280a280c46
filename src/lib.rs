//! Padcast - local gamepad broadcast with channel routing
//!
//! Reads one local gamepad, normalizes its state, and broadcasts it to every
//! currently-active remote channel. Channels are toggled three ways: global
//! hotkeys, a hardware slider whose travel is split into per-channel
//! sections, and push-buttons that move whole channel groups at once. RGB
//! indicators on the hardware reflect the active-set with additive color
//! mixing for shared lamps.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod hardware;
pub mod input;
pub mod keys;
pub mod registry;
pub mod report;
pub mod router;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use broadcast::Broadcaster;
pub use config::Config;
pub use registry::{ChannelDescriptor, ChannelRegistry, IndicatorBinding};
pub use router::Router;
