//! Indicator reflection and the live status line
//!
//! Routers never talk to the indicator hardware directly: after a routing
//! decision they bump a watch channel, and the reflector task recomputes the
//! desired color of every indicator from the registry's current active-set.
//! The watch channel is latest-wins, so a burst of routing decisions
//! coalesces into one reflection and slow indicator I/O can never stall a
//! router or the broadcast loop.
//!
//! An indicator shared by several channels shows the component-wise sum of
//! their on/off colors, so the blend tells how many of its channels are on.
//! The sum is deliberately not clamped here; the hardware saturates.

use std::io::Write as _;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::watch;
use tracing::warn;

use crate::hardware::PeripheralDriver;
use crate::registry::{ChannelDescriptor, ChannelRegistry};

/// Requests an indicator refresh. Cheap to clone; safe to call from any
/// router context.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: Arc<watch::Sender<u64>>,
}

impl RefreshHandle {
    pub fn request(&self) {
        self.tx.send_modify(|n| *n = n.wrapping_add(1));
    }
}

/// Create the refresh handle and the receiver the reflector task waits on.
pub fn refresh_channel() -> (RefreshHandle, watch::Receiver<u64>) {
    let (tx, rx) = watch::channel(0u64);
    (RefreshHandle { tx: Arc::new(tx) }, rx)
}

/// Desired color of every indicator, given the active flags.
///
/// Indicators appear in first-binding order; each channel bound to an
/// indicator contributes its on-color when active, off-color otherwise.
pub fn compose_colors(
    channels: &[ChannelDescriptor],
    active: &[bool],
) -> Vec<(String, (u16, u16, u16))> {
    let mut colors: Vec<(String, (u16, u16, u16))> = Vec::new();

    for (channel, &on) in channels.iter().zip(active) {
        let Some(binding) = &channel.indicator else {
            continue;
        };
        let add = if on {
            binding.color_on
        } else {
            binding.color_off
        };

        match colors.iter_mut().find(|(uid, _)| *uid == binding.uid) {
            Some((_, color)) => {
                color.0 += add[0] as u16;
                color.1 += add[1] as u16;
                color.2 += add[2] as u16;
            }
            None => colors.push((
                binding.uid.clone(),
                (add[0] as u16, add[1] as u16, add[2] as u16),
            )),
        }
    }

    colors
}

/// One bracketed cell per channel: active cells cyan, inactive red.
pub fn render_status(channels: &[ChannelDescriptor], active: &[bool]) -> String {
    let cells: Vec<String> = channels
        .iter()
        .zip(active)
        .map(|(channel, &on)| {
            let cell = format!("[{}]", channel.remote_index);
            if on {
                cell.black().on_bright_cyan().to_string()
            } else {
                cell.white().on_red().to_string()
            }
        })
        .collect();
    cells.join(" ")
}

/// Reflector task: waits for refresh requests, then reprints the status line
/// and pushes recomputed colors to the indicator driver.
pub async fn run_reflector(
    registry: Arc<ChannelRegistry>,
    driver: Option<Arc<dyn PeripheralDriver>>,
    mut refresh_rx: watch::Receiver<u64>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            changed = refresh_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                reflect(&registry, driver.as_deref()).await;
            }
        }
    }
    // Leave the status line on its own row before shutdown logging resumes.
    println!();
}

async fn reflect(registry: &ChannelRegistry, driver: Option<&dyn PeripheralDriver>) {
    let active = registry.snapshot();

    print!("\r{}", render_status(registry.channels(), &active));
    let _ = std::io::stdout().flush();

    let Some(driver) = driver else {
        return;
    };
    for (uid, (r, g, b)) in compose_colors(registry.channels(), &active) {
        if let Err(e) = driver.set_indicator_color(&uid, r, g, b).await {
            warn!("Failed to set indicator {}: {}", uid, e);
        }
    }
}
