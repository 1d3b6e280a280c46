//! Channel registry - the shared routing state
//!
//! Holds the ordered channel descriptors and their active flags. Channel
//! metadata is immutable after construction; the flags are the only mutable
//! state and live behind a single mutex so that every toggle, set, and
//! snapshot is serialized against the others. Registry operations never touch
//! indicators; callers request an indicator refresh afterwards, keeping the
//! broadcast hot path free of indicator I/O.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RegistryError;
use crate::transport::ChannelTransport;

/// Indicator binding for one channel: which lamp, and its on/off colors.
#[derive(Debug, Clone)]
pub struct IndicatorBinding {
    pub uid: String,
    pub color_on: [u8; 3],
    pub color_off: [u8; 3],
}

/// One remote receiver. Created once at startup, never destroyed during a run.
pub struct ChannelDescriptor {
    pub transport: Arc<dyn ChannelTransport>,
    /// Logical sub-device on the remote end
    pub remote_index: u8,
    pub indicator: Option<IndicatorBinding>,
}

/// Ordered channel set with serialized active-flag mutation.
///
/// Indices are stable for the process lifetime and match configuration
/// declaration order.
pub struct ChannelRegistry {
    channels: Vec<ChannelDescriptor>,
    active: Mutex<Vec<bool>>,
}

impl ChannelRegistry {
    /// Create a registry with every channel inactive.
    pub fn new(channels: Vec<ChannelDescriptor>) -> Self {
        let active = vec![false; channels.len()];
        Self {
            channels,
            active: Mutex::new(active),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channels(&self) -> &[ChannelDescriptor] {
        &self.channels
    }

    /// Consistent read of all active flags at one instant.
    pub fn snapshot(&self) -> Vec<bool> {
        self.active.lock().clone()
    }

    /// Set one channel's active flag.
    pub fn set_active(&self, index: usize, value: bool) -> Result<(), RegistryError> {
        let mut active = self.active.lock();
        let slot = active
            .get_mut(index)
            .ok_or(RegistryError::OutOfRange {
                index,
                len: self.channels.len(),
            })?;
        *slot = value;
        Ok(())
    }

    /// Flip one channel's active flag, returning the new value.
    pub fn toggle_active(&self, index: usize) -> Result<bool, RegistryError> {
        let mut active = self.active.lock();
        let slot = active
            .get_mut(index)
            .ok_or(RegistryError::OutOfRange {
                index,
                len: self.channels.len(),
            })?;
        *slot = !*slot;
        Ok(*slot)
    }

    /// Set every channel to the same flag. Readers never observe a partial
    /// update.
    pub fn set_all(&self, value: bool) {
        let mut active = self.active.lock();
        for slot in active.iter_mut() {
            *slot = value;
        }
    }
}
