//! Channel transport boundary
//!
//! A transport delivers [`PadReport`]s to one remote receiver. The wire
//! protocol, encryption, and retry policy are the transport's own business;
//! the broadcast loop only requires that `submit` returns promptly and that a
//! failure affects no other channel.

pub mod tcp;

pub use tcp::TcpTransport;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::report::PadReport;

/// Opaque credentials handed to a transport at connect time.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub key: String,
    pub mode: String,
}

/// Delivery capability for one remote channel.
///
/// All methods take `&self`; implementations use interior mutability for
/// their connection state.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Human-readable endpoint for logs.
    fn describe(&self) -> String;

    /// Establish the connection. Called once at startup.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Deliver one state record to the given remote sub-device.
    /// Must return promptly; callers treat errors as recoverable.
    async fn submit(&self, remote_index: u8, report: &PadReport) -> Result<(), TransportError>;

    /// Release the connection.
    async fn close(&self) -> Result<(), TransportError>;
}
