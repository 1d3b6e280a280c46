//! Position router - slider sections to active-set
//!
//! The slider's 0-100 travel is divided into N equal sections between the
//! configured thresholds. Below the lower threshold no channel is active,
//! above the upper threshold all are, and section `k` in between activates
//! exactly channel `k`.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::indicators::RefreshHandle;
use crate::registry::ChannelRegistry;

/// Slider samples within this distance of the last processed position are
/// treated as noise.
const DEBOUNCE_UNITS: i32 = 2;

pub struct PositionRouter {
    registry: Arc<ChannelRegistry>,
    refresh: RefreshHandle,
    lower_threshold: i32,
    section_width: f64,
    last_position: i32,
    last_section: i32,
}

impl PositionRouter {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        refresh: RefreshHandle,
        lower_threshold: i32,
        upper_threshold: i32,
    ) -> Self {
        let sections = registry.len().max(1);
        let section_width = f64::from(upper_threshold - lower_threshold) / sections as f64;

        Self {
            registry,
            refresh,
            lower_threshold,
            section_width,
            // Sentinels far outside the slider's travel so the first real
            // sample is always processed.
            last_position: -100,
            last_section: -100,
        }
    }

    /// Log the slider travel table: which positions activate which channel.
    pub fn log_sections(&self) {
        info!("   <{:>3} : no channels active", self.lower_threshold);
        for (index, channel) in self.registry.channels().iter().enumerate() {
            let lower = self.lower_threshold as f64 + (index as f64 * self.section_width).ceil();
            let upper =
                self.lower_threshold as f64 + ((index as f64 + 0.9999) * self.section_width).floor();
            info!(
                "{:>3} to {:>3} : channel {} (remote {}) active",
                lower, upper, index, channel.remote_index
            );
        }
        info!(
            "  >={:>3} : all channels active",
            self.lower_threshold + (self.section_width * self.registry.len() as f64) as i32
        );
    }

    /// Process one position sample.
    pub fn handle(&mut self, position: i32) {
        if (position - self.last_position).abs() <= DEBOUNCE_UNITS {
            return;
        }

        let section =
            (f64::from(position - self.lower_threshold) / self.section_width).floor() as i32;
        if section == self.last_section {
            return;
        }

        let count = self.registry.len() as i32;
        if section < 0 {
            self.registry.set_all(false);
            info!("No channels active");
        } else if section >= count {
            self.registry.set_all(true);
            info!("All channels active");
        } else {
            self.registry.set_all(false);
            let index = section as usize;
            if let Err(e) = self.registry.set_active(index, true) {
                error!("Position router hit an invalid channel index: {}", e);
                return;
            }
            let remote = self.registry.channels()[index].remote_index;
            info!("Channel {} (remote {}) active", index, remote);
        }

        debug!(
            "Slider position {} -> section {} (was {})",
            position, section, self.last_section
        );
        self.last_section = section;
        self.last_position = position;
        self.refresh.request();
    }
}
