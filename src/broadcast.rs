//! Broadcast loop - local input state to every active channel
//!
//! One task owns the normalized input state. Each wakeup it drains every
//! queued input event, folds them into the state, then sends one report to
//! each channel that is active at that instant. The active-set snapshot is
//! taken before any network I/O, so a toggle landing mid-broadcast applies
//! from the next cycle and a cycle never mixes two routing decisions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::input::{InputEvent, NormalizedInputState};
use crate::registry::ChannelRegistry;
use crate::report::ReportBuilder;

pub struct Broadcaster {
    registry: Arc<ChannelRegistry>,
    builder: Box<dyn ReportBuilder>,
    state: NormalizedInputState,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        builder: Box<dyn ReportBuilder>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            builder,
            state: NormalizedInputState::default(),
            send_timeout,
        }
    }

    /// Run until the input stream closes or shutdown flips.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<InputEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("Input event stream ended");
                        break;
                    };
                    self.state.apply(event);
                    // Coalesce whatever else is already queued into this cycle.
                    while let Ok(event) = events.try_recv() {
                        self.state.apply(event);
                    }
                    self.dispatch().await;
                }
            }
        }
        debug!("Broadcast loop stopped");
    }

    /// Send the current state to every active channel.
    ///
    /// A failed or timed-out send is logged and skipped; the remaining
    /// channels still receive this cycle's report.
    async fn dispatch(&self) {
        let active = self.registry.snapshot();
        let report = self.builder.build(&self.state);

        for (channel, _) in self
            .registry
            .channels()
            .iter()
            .zip(&active)
            .filter(|(_, &on)| on)
        {
            let send = channel.transport.submit(channel.remote_index, &report);
            match tokio::time::timeout(self.send_timeout, send).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Send to {} failed: {}", channel.transport.describe(), e),
                Err(_) => warn!(
                    "Send to {} timed out after {:?}",
                    channel.transport.describe(),
                    self.send_timeout
                ),
            }
        }
    }
}
