//! Router module - channel routing orchestration
//!
//! The [`Router`] is the context object shared by every routing loop: it owns
//! the channel registry, the indicator refresh handle, and the global
//! shutdown flag, and it spawns the three event loops (hotkey polling, the
//! hardware event consumer, and indicator reflection). Each loop mutates the
//! registry through its serialized operations and then requests an indicator
//! refresh; none of them ever performs indicator I/O itself.

mod buttons;
mod hotkeys;
mod indicators;
mod position;

pub use buttons::ButtonRouter;
pub use hotkeys::{HotkeyBinding, HotkeyRouter};
pub use indicators::{compose_colors, refresh_channel, render_status, RefreshHandle};
pub use position::PositionRouter;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::config::Config;
use crate::error::ConfigError;
use crate::hardware::{HardwareEvent, PeripheralDriver};
use crate::keys::{GlobalKeys, KeyCombo};
use crate::registry::ChannelRegistry;

/// Shared context for all routing loops.
pub struct Router {
    registry: Arc<ChannelRegistry>,
    refresh: RefreshHandle,
    shutdown: watch::Receiver<bool>,
}

impl Router {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        refresh: RefreshHandle,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            registry,
            refresh,
            shutdown,
        }
    }

    pub fn registry(&self) -> Arc<ChannelRegistry> {
        self.registry.clone()
    }

    pub fn refresh(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// Build hotkey bindings from configuration. Channels with an empty
    /// hotkey string are skipped; an unparseable hotkey is a fatal
    /// configuration error (validation reports it before any loop starts).
    pub fn hotkey_bindings(config: &Config) -> Result<Vec<HotkeyBinding>, ConfigError> {
        let mut bindings = Vec::new();
        for (channel, channel_config) in config.channels.iter().enumerate() {
            if channel_config.hotkey.is_empty() {
                continue;
            }
            bindings.push(HotkeyBinding {
                channel,
                combo: KeyCombo::parse(&channel_config.hotkey)?,
            });
        }
        Ok(bindings)
    }

    /// Spawn the hotkey poll loop on a blocking thread.
    ///
    /// The keyboard checker is constructed on that thread; it is not
    /// Send-safe.
    pub fn spawn_hotkeys(
        &self,
        bindings: Vec<HotkeyBinding>,
        poll_period: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let router = HotkeyRouter::new(self.registry.clone(), self.refresh.clone(), bindings);
        let shutdown = self.shutdown.clone();
        tokio::task::spawn_blocking(move || {
            let keys = GlobalKeys::new();
            router.run_blocking(&keys, poll_period, shutdown);
        })
    }

    /// Spawn the consumer of hardware bridge events, feeding the position
    /// and button routers.
    pub fn spawn_hardware(
        &self,
        mut events: mpsc::Receiver<HardwareEvent>,
        lower_threshold: i32,
        upper_threshold: i32,
    ) -> tokio::task::JoinHandle<()> {
        let mut position = PositionRouter::new(
            self.registry.clone(),
            self.refresh.clone(),
            lower_threshold,
            upper_threshold,
        );
        position.log_sections();
        let mut buttons = ButtonRouter::new(self.registry.clone(), self.refresh.clone());
        let mut shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    event = events.recv() => match event {
                        None => {
                            debug!("Hardware event stream ended");
                            break;
                        }
                        Some(HardwareEvent::Position(position_value)) => {
                            position.handle(position_value);
                        }
                        Some(HardwareEvent::Button { uid, released }) => {
                            buttons.handle(&uid, released);
                        }
                    }
                }
            }
        })
    }

    /// Spawn the indicator reflector task.
    pub fn spawn_reflector(
        &self,
        driver: Option<Arc<dyn PeripheralDriver>>,
        refresh_rx: watch::Receiver<u64>,
    ) -> tokio::task::JoinHandle<()> {
        let registry = self.registry.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(indicators::run_reflector(
            registry, driver, refresh_rx, shutdown,
        ))
    }
}
