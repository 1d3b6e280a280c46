//! GilRs gamepad source
//!
//! Runs gilrs on a dedicated blocking thread (it is not Send-safe) and
//! forwards [`InputEvent`]s over an unbounded channel into the async world.

use std::time::Duration;

use gilrs::{Axis, Button, Event, EventType, Gilrs};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::InputEvent;

/// Logical button ids, matching the order the remote end expects.
pub mod button_id {
    pub const A: u8 = 0;
    pub const B: u8 = 1;
    pub const X: u8 = 2;
    pub const Y: u8 = 3;
    pub const BACK: u8 = 4;
    pub const GUIDE: u8 = 5;
    pub const START: u8 = 6;
    pub const LEFT_THUMB: u8 = 7;
    pub const RIGHT_THUMB: u8 = 8;
    pub const LEFT_SHOULDER: u8 = 9;
    pub const RIGHT_SHOULDER: u8 = 10;
    pub const DPAD_UP: u8 = 11;
    pub const DPAD_DOWN: u8 = 12;
    pub const DPAD_LEFT: u8 = 13;
    pub const DPAD_RIGHT: u8 = 14;
}

/// Logical axis ids: 0/1 left stick, 2/3 right stick, 4/5 triggers.
pub mod axis_id {
    pub const LEFT_X: u8 = 0;
    pub const LEFT_Y: u8 = 1;
    pub const RIGHT_X: u8 = 2;
    pub const RIGHT_Y: u8 = 3;
    pub const TRIGGER_L: u8 = 4;
    pub const TRIGGER_R: u8 = 5;
}

/// Local gamepad source. Dropping it stops the polling thread.
pub struct GamepadSource {
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl GamepadSource {
    /// Start polling the gamepad at `device_index` (position in the connected
    /// gamepad list).
    ///
    /// Returns the source handle and the event receiver. If no gamepad is
    /// present at that index the thread logs a warning and exits; the
    /// receiver then simply never yields.
    pub fn start(device_index: usize) -> (Self, mpsc::UnboundedReceiver<InputEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<InputEvent>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        std::thread::spawn(move || {
            Self::event_loop_blocking(device_index, event_tx, shutdown_rx);
        });

        (
            Self {
                shutdown_tx: Some(shutdown_tx),
            },
            event_rx,
        )
    }

    /// Main event loop (runs in a dedicated blocking thread)
    fn event_loop_blocking(
        device_index: usize,
        event_tx: mpsc::UnboundedSender<InputEvent>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("GilRs initialized");
                g
            }
            Err(e) => {
                warn!("Failed to initialize GilRs: {:?}", e);
                return;
            }
        };

        let connected: Vec<_> = gilrs
            .gamepads()
            .filter(|(_, gp)| gp.is_connected())
            .map(|(id, gp)| (id, gp.name().to_string()))
            .collect();

        for (id, name) in &connected {
            info!("  - {:?}: \"{}\"", id, name);
        }

        let Some((selected, name)) = connected.get(device_index).cloned() else {
            warn!(
                "No gamepad at index {} ({} connected); broadcasting will idle",
                device_index,
                connected.len()
            );
            return;
        };
        info!("Reading local gamepad {}: \"{}\"", device_index, name);

        loop {
            match shutdown_rx.try_recv() {
                Ok(_) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("Gamepad source shutting down");
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            while let Some(Event { id, event, .. }) = gilrs.next_event() {
                if id != selected {
                    continue;
                }
                if let Some(input_event) = convert_event(event) {
                    debug!("Gamepad event: {:?}", input_event);
                    if event_tx.send(input_event).is_err() {
                        warn!("Event receiver dropped, shutting down gamepad loop");
                        return;
                    }
                }
            }

            // Sleep briefly to avoid busy-waiting
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Drop for GamepadSource {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
    }
}

/// Convert a GilRs event to a logical input event.
///
/// Triggers arrive as `ButtonChanged` with a value in [0, 1]; they are
/// remapped to [-1, 1] so every axis shares one scale. The press/release
/// edges gilrs also emits for triggers are dropped to avoid double-reporting.
fn convert_event(event: EventType) -> Option<InputEvent> {
    match event {
        EventType::ButtonPressed(button, _) => button_to_id(button).map(InputEvent::ButtonDown),
        EventType::ButtonReleased(button, _) => button_to_id(button).map(InputEvent::ButtonUp),
        EventType::ButtonChanged(button, value, _) => trigger_axis(button)
            .map(|id| InputEvent::AxisMotion(id, rescale_trigger(value))),
        EventType::AxisChanged(axis, value, _) => {
            axis_to_id(axis).map(|id| InputEvent::AxisMotion(id, value))
        }
        _ => None,
    }
}

/// Map trigger travel in [0, 1] onto the shared [-1, 1] axis scale.
fn rescale_trigger(value: f32) -> f32 {
    value * 2.0 - 1.0
}

fn trigger_axis(button: Button) -> Option<u8> {
    match button {
        Button::LeftTrigger2 => Some(axis_id::TRIGGER_L),
        Button::RightTrigger2 => Some(axis_id::TRIGGER_R),
        _ => None,
    }
}

fn axis_to_id(axis: Axis) -> Option<u8> {
    let id = match axis {
        Axis::LeftStickX => axis_id::LEFT_X,
        Axis::LeftStickY => axis_id::LEFT_Y,
        Axis::RightStickX => axis_id::RIGHT_X,
        Axis::RightStickY => axis_id::RIGHT_Y,
        Axis::LeftZ => axis_id::TRIGGER_L,
        Axis::RightZ => axis_id::TRIGGER_R,
        _ => return None,
    };
    Some(id)
}

fn button_to_id(button: Button) -> Option<u8> {
    use button_id::*;

    let id = match button {
        Button::South => A,
        Button::East => B,
        Button::West => X,
        Button::North => Y,
        Button::Select => BACK,
        Button::Mode => GUIDE,
        Button::Start => START,
        Button::LeftThumb => LEFT_THUMB,
        Button::RightThumb => RIGHT_THUMB,
        Button::LeftTrigger => LEFT_SHOULDER,
        Button::RightTrigger => RIGHT_SHOULDER,
        Button::DPadUp => DPAD_UP,
        Button::DPadDown => DPAD_DOWN,
        Button::DPadLeft => DPAD_LEFT,
        Button::DPadRight => DPAD_RIGHT,
        // Analog trigger travel is reported separately as ButtonChanged
        Button::LeftTrigger2 | Button::RightTrigger2 => return None,
        _ => return None,
    };

    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_buttons_map_to_logical_ids() {
        assert_eq!(button_to_id(Button::South), Some(0));
        assert_eq!(button_to_id(Button::East), Some(1));
        assert_eq!(button_to_id(Button::West), Some(2));
        assert_eq!(button_to_id(Button::North), Some(3));
        assert_eq!(button_to_id(Button::DPadRight), Some(14));
    }

    #[test]
    fn analog_triggers_are_not_buttons() {
        assert_eq!(button_to_id(Button::LeftTrigger2), None);
        assert_eq!(button_to_id(Button::RightTrigger2), None);
    }

    #[test]
    fn trigger_travel_is_rescaled_to_signed_range() {
        assert_eq!(rescale_trigger(0.0), -1.0);
        assert_eq!(rescale_trigger(0.5), 0.0);
        assert_eq!(rescale_trigger(1.0), 1.0);
        assert_eq!(trigger_axis(Button::LeftTrigger2), Some(4));
        assert_eq!(trigger_axis(Button::RightTrigger2), Some(5));
        assert_eq!(trigger_axis(Button::South), None);
    }

    #[test]
    fn stick_axes_map_to_logical_ids() {
        assert_eq!(axis_to_id(Axis::LeftStickX), Some(0));
        assert_eq!(axis_to_id(Axis::LeftStickY), Some(1));
        assert_eq!(axis_to_id(Axis::RightStickX), Some(2));
        assert_eq!(axis_to_id(Axis::RightStickY), Some(3));
        assert_eq!(axis_to_id(Axis::LeftZ), Some(4));
        assert_eq!(axis_to_id(Axis::RightZ), Some(5));
    }
}
