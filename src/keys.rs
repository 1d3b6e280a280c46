//! Key-combination parsing and the global keyboard checker
//!
//! A hotkey string like `"ctrl+shift+1"` is parsed once at startup into a
//! [`KeyCombo`]; an unparseable string is a fatal configuration error. At
//! runtime the hotkey router samples the set of held keys and asks each combo
//! whether it is satisfied.

use device_query::{DeviceQuery, DeviceState, Keycode};

use crate::error::ConfigError;

/// One element of a key combination.
///
/// Modifiers match either side of the keyboard (`Ctrl` is satisfied by left
/// or right control).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboKey {
    Ctrl,
    Shift,
    Alt,
    Plain(Keycode),
}

/// A parsed key combination. All listed keys must be held simultaneously.
#[derive(Debug, Clone)]
pub struct KeyCombo {
    keys: Vec<ComboKey>,
    raw: String,
}

impl KeyCombo {
    /// Parse a `+`-separated hotkey string.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidHotkey {
            hotkey: raw.to_string(),
            reason,
        };

        if raw.trim().is_empty() {
            return Err(invalid("empty hotkey string".to_string()));
        }

        let mut keys = Vec::new();
        for token in raw.split('+') {
            let token = token.trim().to_ascii_lowercase();
            if token.is_empty() {
                return Err(invalid("empty key token".to_string()));
            }
            let key = combo_key(&token)
                .ok_or_else(|| invalid(format!("unknown key {token:?}")))?;
            keys.push(key);
        }

        Ok(Self {
            keys,
            raw: raw.to_string(),
        })
    }

    /// The original hotkey string, for logs.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True when every key of the combination is in the held set.
    pub fn is_satisfied(&self, held: &[Keycode]) -> bool {
        self.keys.iter().all(|key| match key {
            ComboKey::Ctrl => {
                held.contains(&Keycode::LControl) || held.contains(&Keycode::RControl)
            }
            ComboKey::Shift => {
                held.contains(&Keycode::LShift) || held.contains(&Keycode::RShift)
            }
            ComboKey::Alt => held.contains(&Keycode::LAlt) || held.contains(&Keycode::RAlt),
            ComboKey::Plain(code) => held.contains(code),
        })
    }
}

/// Source of the currently-held key set.
///
/// The production implementation polls the OS keyboard state; tests script
/// the held set directly.
pub trait KeyChecker {
    fn held(&self) -> Vec<Keycode>;
}

/// Global keyboard state via `device_query`.
///
/// `DeviceState` is not `Send`; construct this on the thread that polls it.
pub struct GlobalKeys {
    state: DeviceState,
}

impl GlobalKeys {
    pub fn new() -> Self {
        Self {
            state: DeviceState::new(),
        }
    }
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyChecker for GlobalKeys {
    fn held(&self) -> Vec<Keycode> {
        self.state.get_keys()
    }
}

fn combo_key(token: &str) -> Option<ComboKey> {
    use Keycode::*;

    let key = match token {
        "ctrl" | "control" => return Some(ComboKey::Ctrl),
        "shift" => return Some(ComboKey::Shift),
        "alt" => return Some(ComboKey::Alt),

        "a" => A,
        "b" => B,
        "c" => C,
        "d" => D,
        "e" => E,
        "f" => F,
        "g" => G,
        "h" => H,
        "i" => I,
        "j" => J,
        "k" => K,
        "l" => L,
        "m" => M,
        "n" => N,
        "o" => O,
        "p" => P,
        "q" => Q,
        "r" => R,
        "s" => S,
        "t" => T,
        "u" => U,
        "v" => V,
        "w" => W,
        "x" => X,
        "y" => Y,
        "z" => Z,

        "0" => Key0,
        "1" => Key1,
        "2" => Key2,
        "3" => Key3,
        "4" => Key4,
        "5" => Key5,
        "6" => Key6,
        "7" => Key7,
        "8" => Key8,
        "9" => Key9,

        "f1" => F1,
        "f2" => F2,
        "f3" => F3,
        "f4" => F4,
        "f5" => F5,
        "f6" => F6,
        "f7" => F7,
        "f8" => F8,
        "f9" => F9,
        "f10" => F10,
        "f11" => F11,
        "f12" => F12,

        "space" => Space,
        "enter" | "return" => Enter,
        "esc" | "escape" => Escape,
        "tab" => Tab,
        "backspace" => Backspace,
        "up" => Up,
        "down" => Down,
        "left" => Left,
        "right" => Right,
        "home" => Home,
        "end" => End,
        "insert" => Insert,
        "delete" => Delete,

        _ => return None,
    };

    Some(ComboKey::Plain(key))
}
