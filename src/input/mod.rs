//! Local input device boundary
//!
//! The local gamepad is exposed as a stream of [`InputEvent`]s; the broadcast
//! loop folds them into a [`NormalizedInputState`], the canonical button/axis
//! representation independent of any wire format.

pub mod gamepad;

use std::collections::HashMap;

/// One event from the local input device, keyed by logical ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ButtonDown(u8),
    ButtonUp(u8),
    /// Axis motion with the raw value in [-1, 1]
    AxisMotion(u8, f32),
}

/// Canonical local-device state: single writer (the broadcast loop),
/// read once per broadcast cycle.
#[derive(Debug, Clone, Default)]
pub struct NormalizedInputState {
    pub buttons: HashMap<u8, bool>,
    pub axes: HashMap<u8, f32>,
}

impl NormalizedInputState {
    /// Fold one event into the state.
    ///
    /// Axis values are rounded to four decimals so sub-resolution jitter does
    /// not flood the transports with no-op updates.
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::ButtonDown(id) => {
                self.buttons.insert(id, true);
            }
            InputEvent::ButtonUp(id) => {
                self.buttons.insert(id, false);
            }
            InputEvent::AxisMotion(id, value) => {
                self.axes.insert(id, round4(value));
            }
        }
    }

    pub fn button(&self, id: u8) -> bool {
        self.buttons.get(&id).copied().unwrap_or(false)
    }

    pub fn axis(&self, id: u8) -> f32 {
        self.axes.get(&id).copied().unwrap_or(0.0)
    }
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
