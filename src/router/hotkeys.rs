//! Hotkey router - edge-detected keyboard toggles
//!
//! Polls the global keyboard at a short, tunable period and toggles a bound
//! channel on each released-to-pressed transition. Holding a combination
//! produces exactly one toggle; the poll loop runs on its own blocking
//! thread and shares nothing with the broadcast loop but the registry mutex.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error};

use super::indicators::RefreshHandle;
use crate::keys::{KeyChecker, KeyCombo};
use crate::registry::ChannelRegistry;

/// One hotkey bound to one channel.
pub struct HotkeyBinding {
    pub channel: usize,
    pub combo: KeyCombo,
}

pub struct HotkeyRouter {
    registry: Arc<ChannelRegistry>,
    refresh: RefreshHandle,
    bindings: Vec<HotkeyBinding>,
    /// Per-binding press state for edge detection
    pressed: Vec<bool>,
}

impl HotkeyRouter {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        refresh: RefreshHandle,
        bindings: Vec<HotkeyBinding>,
    ) -> Self {
        let pressed = vec![false; bindings.len()];
        Self {
            registry,
            refresh,
            bindings,
            pressed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// One poll pass over all bindings against the currently-held key set.
    pub fn tick(&mut self, held: &[device_query::Keycode]) {
        for (i, binding) in self.bindings.iter().enumerate() {
            let down = binding.combo.is_satisfied(held);
            if down && !self.pressed[i] {
                match self.registry.toggle_active(binding.channel) {
                    Ok(now_active) => {
                        debug!(
                            "Hotkey {:?} toggled channel {} -> {}",
                            binding.combo.raw(),
                            binding.channel,
                            if now_active { "active" } else { "inactive" }
                        );
                        self.refresh.request();
                    }
                    Err(e) => error!("Hotkey router hit an invalid channel index: {}", e),
                }
            }
            self.pressed[i] = down;
        }
    }

    /// Poll loop; runs until the shutdown flag flips.
    pub fn run_blocking(
        mut self,
        checker: &dyn KeyChecker,
        period: Duration,
        shutdown: watch::Receiver<bool>,
    ) {
        while !*shutdown.borrow() {
            let held = checker.held();
            self.tick(&held);
            std::thread::sleep(period);
        }
        debug!("Hotkey router stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::indicators::refresh_channel;
    use crate::testutil::registry_arc;
    use device_query::Keycode;

    fn router_with_bindings(registry: &Arc<ChannelRegistry>) -> HotkeyRouter {
        let (refresh, _rx) = refresh_channel();
        let bindings = vec![
            HotkeyBinding {
                channel: 0,
                combo: KeyCombo::parse("ctrl+1").unwrap(),
            },
            HotkeyBinding {
                channel: 1,
                combo: KeyCombo::parse("ctrl+2").unwrap(),
            },
        ];
        HotkeyRouter::new(registry.clone(), refresh, bindings)
    }

    #[test]
    fn press_and_hold_toggles_exactly_once() {
        let registry = registry_arc(2);
        let mut router = router_with_bindings(&registry);

        let held = [Keycode::LControl, Keycode::Key1];
        for _ in 0..10 {
            router.tick(&held);
        }
        assert_eq!(registry.snapshot(), vec![true, false]);
    }

    #[test]
    fn release_then_press_toggles_again() {
        let registry = registry_arc(2);
        let mut router = router_with_bindings(&registry);

        router.tick(&[Keycode::LControl, Keycode::Key1]);
        router.tick(&[]);
        router.tick(&[Keycode::LControl, Keycode::Key1]);
        assert_eq!(registry.snapshot(), vec![false, false]);

        router.tick(&[]);
        router.tick(&[Keycode::LControl, Keycode::Key1]);
        assert_eq!(registry.snapshot(), vec![true, false]);
    }

    #[test]
    fn bindings_are_independent() {
        let registry = registry_arc(2);
        let mut router = router_with_bindings(&registry);

        // Both combos held in one poll: both channels toggle.
        router.tick(&[Keycode::LControl, Keycode::Key1, Keycode::Key2]);
        assert_eq!(registry.snapshot(), vec![true, true]);

        // Releasing only one of them re-arms only that binding.
        router.tick(&[Keycode::LControl, Keycode::Key2]);
        router.tick(&[Keycode::LControl, Keycode::Key1, Keycode::Key2]);
        assert_eq!(registry.snapshot(), vec![false, true]);
    }

    #[test]
    fn partial_combo_is_not_a_press() {
        let registry = registry_arc(2);
        let mut router = router_with_bindings(&registry);

        router.tick(&[Keycode::Key1]);
        router.tick(&[Keycode::LControl]);
        assert_eq!(registry.snapshot(), vec![false, false]);
    }

    #[test]
    fn toggle_requests_an_indicator_refresh() {
        let registry = registry_arc(2);
        let (refresh, rx) = refresh_channel();
        let bindings = vec![HotkeyBinding {
            channel: 0,
            combo: KeyCombo::parse("f5").unwrap(),
        }];
        let mut router = HotkeyRouter::new(registry, refresh, bindings);

        let before = *rx.borrow();
        router.tick(&[Keycode::F5]);
        assert_eq!(*rx.borrow(), before + 1);

        // Held: no further refresh.
        router.tick(&[Keycode::F5]);
        assert_eq!(*rx.borrow(), before + 1);
    }
}
