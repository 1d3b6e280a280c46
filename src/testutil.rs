//! Shared test fixtures: inert transports, recording doubles, and registry
//! builders used across the unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{HardwareError, TransportError};
use crate::hardware::PeripheralDriver;
use crate::registry::{ChannelDescriptor, ChannelRegistry, IndicatorBinding};
use crate::report::PadReport;
use crate::transport::ChannelTransport;

/// Transport that accepts everything and does nothing.
pub(crate) struct NullTransport;

#[async_trait]
impl ChannelTransport for NullTransport {
    fn describe(&self) -> String {
        "null".to_string()
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn submit(&self, _remote_index: u8, _report: &PadReport) -> Result<(), TransportError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Transport that records every submission for later assertions.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    pub submissions: Mutex<Vec<(u8, PadReport)>>,
}

#[async_trait]
impl ChannelTransport for RecordingTransport {
    fn describe(&self) -> String {
        "recording".to_string()
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn submit(&self, remote_index: u8, report: &PadReport) -> Result<(), TransportError> {
        self.submissions.lock().push((remote_index, report.clone()));
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Indicator driver that records every color push.
#[derive(Default)]
pub(crate) struct RecordingIndicators {
    pub pushes: Mutex<Vec<(String, u16, u16, u16)>>,
}

#[async_trait]
impl PeripheralDriver for RecordingIndicators {
    async fn set_indicator_color(
        &self,
        uid: &str,
        r: u16,
        g: u16,
        b: u16,
    ) -> Result<(), HardwareError> {
        self.pushes.lock().push((uid.to_string(), r, g, b));
        Ok(())
    }

    async fn close(&self) -> Result<(), HardwareError> {
        Ok(())
    }
}

/// A channel with a null transport and no indicator binding.
pub(crate) fn null_channel() -> ChannelDescriptor {
    ChannelDescriptor {
        transport: Arc::new(NullTransport),
        remote_index: 0,
        indicator: None,
    }
}

/// `n` null channels with remote indices `0..n`.
pub(crate) fn null_channels(n: usize) -> Vec<ChannelDescriptor> {
    (0..n)
        .map(|i| ChannelDescriptor {
            transport: Arc::new(NullTransport),
            remote_index: i as u8,
            indicator: None,
        })
        .collect()
}

/// A channel bound to the named indicator with the given colors.
pub(crate) fn channel_with_indicator(
    uid: &str,
    color_on: [u8; 3],
    color_off: [u8; 3],
) -> ChannelDescriptor {
    ChannelDescriptor {
        transport: Arc::new(NullTransport),
        remote_index: 0,
        indicator: Some(IndicatorBinding {
            uid: uid.to_string(),
            color_on,
            color_off,
        }),
    }
}

pub(crate) fn registry_with(n: usize) -> ChannelRegistry {
    ChannelRegistry::new(null_channels(n))
}

pub(crate) fn registry_arc(n: usize) -> Arc<ChannelRegistry> {
    Arc::new(registry_with(n))
}
