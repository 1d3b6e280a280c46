//! Outward controller report building
//!
//! [`ReportBuilder`] is the capability that turns a [`NormalizedInputState`]
//! into the [`PadReport`] handed to channel transports. The real builder
//! packs the XInput layout; [`NullReportBuilder`] produces a default report
//! and exists for tests and dry runs.

use serde::{Deserialize, Serialize};

use crate::input::NormalizedInputState;

// XUSB button bits, as the remote virtual-gamepad layer expects them.
const XUSB_DPAD_UP: u16 = 0x0001;
const XUSB_DPAD_DOWN: u16 = 0x0002;
const XUSB_DPAD_LEFT: u16 = 0x0004;
const XUSB_DPAD_RIGHT: u16 = 0x0008;
const XUSB_START: u16 = 0x0010;
const XUSB_BACK: u16 = 0x0020;
const XUSB_LEFT_THUMB: u16 = 0x0040;
const XUSB_RIGHT_THUMB: u16 = 0x0080;
const XUSB_LEFT_SHOULDER: u16 = 0x0100;
const XUSB_RIGHT_SHOULDER: u16 = 0x0200;
const XUSB_GUIDE: u16 = 0x0400;
const XUSB_A: u16 = 0x1000;
const XUSB_B: u16 = 0x2000;
const XUSB_X: u16 = 0x4000;
const XUSB_Y: u16 = 0x8000;

/// Logical-button-id to XUSB bit. Mirrors the local device's button numbering.
const BUTTON_BITS: [(u8, u16); 15] = [
    (0, XUSB_A),
    (1, XUSB_B),
    (2, XUSB_X),
    (3, XUSB_Y),
    (4, XUSB_BACK),
    (5, XUSB_GUIDE),
    (6, XUSB_START),
    (7, XUSB_LEFT_THUMB),
    (8, XUSB_RIGHT_THUMB),
    (9, XUSB_LEFT_SHOULDER),
    (10, XUSB_RIGHT_SHOULDER),
    (11, XUSB_DPAD_UP),
    (12, XUSB_DPAD_DOWN),
    (13, XUSB_DPAD_LEFT),
    (14, XUSB_DPAD_RIGHT),
];

/// The controller state record delivered to every active channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PadReport {
    pub buttons: u16,
    pub thumb_lx: f32,
    pub thumb_ly: f32,
    pub thumb_rx: f32,
    pub thumb_ry: f32,
    /// Trigger travel in [0, 1]
    pub trigger_l: f32,
    pub trigger_r: f32,
}

/// Capability for building outward reports from normalized input state.
pub trait ReportBuilder: Send + Sync {
    fn build(&self, state: &NormalizedInputState) -> PadReport;
}

/// Packs the XInput report layout: button bitmask, sticks with inverted Y,
/// triggers rescaled from the shared [-1, 1] axis range to [0, 1].
#[derive(Debug, Default)]
pub struct XInputReportBuilder;

impl ReportBuilder for XInputReportBuilder {
    fn build(&self, state: &NormalizedInputState) -> PadReport {
        let mut buttons = 0u16;
        for (id, bit) in BUTTON_BITS {
            if state.button(id) {
                buttons |= bit;
            }
        }

        PadReport {
            buttons,
            thumb_lx: state.axis(0),
            thumb_ly: -state.axis(1),
            thumb_rx: state.axis(2),
            thumb_ry: -state.axis(3),
            trigger_l: (state.axis(4) + 1.0) / 2.0,
            trigger_r: (state.axis(5) + 1.0) / 2.0,
        }
    }
}

/// Builds an empty default report regardless of input.
#[derive(Debug, Default)]
pub struct NullReportBuilder;

impl ReportBuilder for NullReportBuilder {
    fn build(&self, _state: &NormalizedInputState) -> PadReport {
        PadReport::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;

    #[test]
    fn buttons_pack_into_xusb_bitmask() {
        let mut state = NormalizedInputState::default();
        state.apply(InputEvent::ButtonDown(0)); // A
        state.apply(InputEvent::ButtonDown(6)); // Start
        state.apply(InputEvent::ButtonDown(11)); // DPad up

        let report = XInputReportBuilder.build(&state);
        assert_eq!(report.buttons, XUSB_A | XUSB_START | XUSB_DPAD_UP);
    }

    #[test]
    fn released_buttons_clear_their_bit() {
        let mut state = NormalizedInputState::default();
        state.apply(InputEvent::ButtonDown(1));
        state.apply(InputEvent::ButtonUp(1));

        let report = XInputReportBuilder.build(&state);
        assert_eq!(report.buttons, 0);
    }

    #[test]
    fn stick_y_axes_are_inverted() {
        let mut state = NormalizedInputState::default();
        state.apply(InputEvent::AxisMotion(0, 0.5));
        state.apply(InputEvent::AxisMotion(1, 0.25));
        state.apply(InputEvent::AxisMotion(3, -1.0));

        let report = XInputReportBuilder.build(&state);
        assert_eq!(report.thumb_lx, 0.5);
        assert_eq!(report.thumb_ly, -0.25);
        assert_eq!(report.thumb_ry, 1.0);
    }

    #[test]
    fn triggers_rescale_to_unit_range() {
        let mut state = NormalizedInputState::default();
        state.apply(InputEvent::AxisMotion(4, -1.0)); // released
        state.apply(InputEvent::AxisMotion(5, 1.0)); // fully pulled

        let report = XInputReportBuilder.build(&state);
        assert_eq!(report.trigger_l, 0.0);
        assert_eq!(report.trigger_r, 1.0);
    }

    #[test]
    fn null_builder_ignores_input() {
        let mut state = NormalizedInputState::default();
        state.apply(InputEvent::ButtonDown(0));
        assert_eq!(NullReportBuilder.build(&state), PadReport::default());
    }
}
