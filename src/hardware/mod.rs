//! Slider/push-button peripheral boundary
//!
//! The peripheral driver delivers its samples as messages on a channel rather
//! than invoking router code on its own threads; the router consumes the
//! stream at its own pace and tests inject synthetic events.

pub mod bridge;

pub use bridge::BridgeDriver;

use async_trait::async_trait;

use crate::error::HardwareError;

/// One event from the hardware bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareEvent {
    /// New slider position, roughly 0-100
    Position(i32),
    /// Push-button edge. The sensor reports on release, not press-down.
    Button { uid: String, released: bool },
}

/// Indicator output capability of the peripheral.
#[async_trait]
pub trait PeripheralDriver: Send + Sync {
    /// Push a color to one indicator. Components may exceed 255 after
    /// additive mixing; the hardware saturates.
    async fn set_indicator_color(
        &self,
        uid: &str,
        r: u16,
        g: u16,
        b: u16,
    ) -> Result<(), HardwareError>;

    /// Disconnect, blanking every known indicator first.
    async fn close(&self) -> Result<(), HardwareError>;
}
