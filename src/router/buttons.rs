//! Button router - push-button groups to active-set
//!
//! Every push-button identity owns one combined toggle state, tracked
//! separately from the per-channel flags: hotkeys and the slider can leave a
//! button's channels in a partial state, and the next press must still move
//! the whole group cleanly between all-on and all-off rather than to the
//! opposite partial state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::indicators::RefreshHandle;
use crate::registry::ChannelRegistry;

pub struct ButtonRouter {
    registry: Arc<ChannelRegistry>,
    refresh: RefreshHandle,
    /// Button identity -> channel indices bound to it
    groups: HashMap<String, Vec<usize>>,
    /// Combined toggle memory per identity; first press turns the group on
    group_state: HashMap<String, bool>,
}

impl ButtonRouter {
    /// Build the router, deriving button groups from the registry's
    /// indicator bindings: channels sharing an indicator identity move as
    /// one unit.
    pub fn new(registry: Arc<ChannelRegistry>, refresh: RefreshHandle) -> Self {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, channel) in registry.channels().iter().enumerate() {
            if let Some(binding) = &channel.indicator {
                groups.entry(binding.uid.clone()).or_default().push(index);
            }
        }

        Self {
            registry,
            refresh,
            groups,
            group_state: HashMap::new(),
        }
    }

    /// Process one button edge. The sensor reports on release; press-down
    /// edges carry no action.
    pub fn handle(&mut self, uid: &str, released: bool) {
        if !released {
            return;
        }

        let Some(indices) = self.groups.get(uid) else {
            warn!("Button event for unknown identity {:?}", uid);
            return;
        };

        let next = !self.group_state.get(uid).copied().unwrap_or(false);
        self.group_state.insert(uid.to_string(), next);

        for &index in indices {
            if let Err(e) = self.registry.set_active(index, next) {
                error!("Button router hit an invalid channel index: {}", e);
            }
        }

        debug!("Button {:?} -> group {}", uid, if next { "on" } else { "off" });
        self.refresh.request();
    }
}
