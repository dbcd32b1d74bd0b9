//! evdev keycode constants
//!
//! Key codes the numpad can emit. These are Linux input event codes
//! from <linux/input-event-codes.h>, wrapped in `KeyCode` so layouts and
//! the interpreter stay independent of the evdev crate.

use std::fmt;

/// Linux input key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// Raw evdev code
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Look up a key by its evdev name ("KEY_KP7", "KP7" and "kp7" all work)
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let wanted = upper.strip_prefix("KEY_").unwrap_or(&upper);
        KEY_NAMES
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, key)| *key)
    }

    /// Numeric code ("40") or key name ("KEY_APOSTROPHE")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().parse::<u16>() {
            Ok(code) => Some(KeyCode(code)),
            Err(_) => Self::from_name(s),
        }
    }

    /// evdev name without the KEY_ prefix, if known
    pub fn name(self) -> Option<&'static str> {
        KEY_NAMES
            .iter()
            .find(|(_, key)| *key == self)
            .map(|(n, _)| *n)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "KEY_{}", name),
            None => write!(f, "{}", self.0),
        }
    }
}

// ============================================================================
// Modifier / Lock Keys
// ============================================================================

/// Left Shift key
pub const KEY_LEFTSHIFT: KeyCode = KeyCode(42);

/// Num Lock key
pub const KEY_NUMLOCK: KeyCode = KeyCode(69);

// ============================================================================
// Main Block Keys
// ============================================================================

/// "5" on the main block; Shift+5 is "%" on US layouts
pub const KEY_5: KeyCode = KeyCode(6);

/// Minus key
pub const KEY_MINUS: KeyCode = KeyCode(12);

/// Equal key
pub const KEY_EQUAL: KeyCode = KeyCode(13);

/// Backspace key
pub const KEY_BACKSPACE: KeyCode = KeyCode(14);

/// Apostrophe key (percent sign on some European layouts)
pub const KEY_APOSTROPHE: KeyCode = KeyCode(40);

/// Delete key
pub const KEY_DELETE: KeyCode = KeyCode(111);

// ============================================================================
// Keypad Keys
// ============================================================================

/// Keypad 7
pub const KEY_KP7: KeyCode = KeyCode(71);
/// Keypad 8
pub const KEY_KP8: KeyCode = KeyCode(72);
/// Keypad 9
pub const KEY_KP9: KeyCode = KeyCode(73);
/// Keypad minus
pub const KEY_KPMINUS: KeyCode = KeyCode(74);
/// Keypad 4
pub const KEY_KP4: KeyCode = KeyCode(75);
/// Keypad 5
pub const KEY_KP5: KeyCode = KeyCode(76);
/// Keypad 6
pub const KEY_KP6: KeyCode = KeyCode(77);
/// Keypad plus
pub const KEY_KPPLUS: KeyCode = KeyCode(78);
/// Keypad 1
pub const KEY_KP1: KeyCode = KeyCode(79);
/// Keypad 2
pub const KEY_KP2: KeyCode = KeyCode(80);
/// Keypad 3
pub const KEY_KP3: KeyCode = KeyCode(81);
/// Keypad 0
pub const KEY_KP0: KeyCode = KeyCode(82);
/// Keypad decimal point
pub const KEY_KPDOT: KeyCode = KeyCode(83);
/// Keypad asterisk
pub const KEY_KPASTERISK: KeyCode = KeyCode(55);
/// Keypad enter
pub const KEY_KPENTER: KeyCode = KeyCode(96);
/// Keypad slash
pub const KEY_KPSLASH: KeyCode = KeyCode(98);
/// Keypad equal
pub const KEY_KPEQUAL: KeyCode = KeyCode(117);
/// Keypad left parenthesis
pub const KEY_KPLEFTPAREN: KeyCode = KeyCode(179);
/// Keypad right parenthesis
pub const KEY_KPRIGHTPAREN: KeyCode = KeyCode(180);

// ============================================================================
// Media / Application Keys
// ============================================================================

/// Volume down
pub const KEY_VOLUMEDOWN: KeyCode = KeyCode(114);

/// Volume up
pub const KEY_VOLUMEUP: KeyCode = KeyCode(115);

/// Calculator launch key
pub const KEY_CALC: KeyCode = KeyCode(140);

/// Name table used by config-defined layouts and log output
const KEY_NAMES: &[(&str, KeyCode)] = &[
    ("LEFTSHIFT", KEY_LEFTSHIFT),
    ("NUMLOCK", KEY_NUMLOCK),
    ("5", KEY_5),
    ("MINUS", KEY_MINUS),
    ("EQUAL", KEY_EQUAL),
    ("BACKSPACE", KEY_BACKSPACE),
    ("APOSTROPHE", KEY_APOSTROPHE),
    ("DELETE", KEY_DELETE),
    ("KP7", KEY_KP7),
    ("KP8", KEY_KP8),
    ("KP9", KEY_KP9),
    ("KPMINUS", KEY_KPMINUS),
    ("KP4", KEY_KP4),
    ("KP5", KEY_KP5),
    ("KP6", KEY_KP6),
    ("KPPLUS", KEY_KPPLUS),
    ("KP1", KEY_KP1),
    ("KP2", KEY_KP2),
    ("KP3", KEY_KP3),
    ("KP0", KEY_KP0),
    ("KPDOT", KEY_KPDOT),
    ("KPASTERISK", KEY_KPASTERISK),
    ("KPENTER", KEY_KPENTER),
    ("KPSLASH", KEY_KPSLASH),
    ("KPEQUAL", KEY_KPEQUAL),
    ("KPLEFTPAREN", KEY_KPLEFTPAREN),
    ("KPRIGHTPAREN", KEY_KPRIGHTPAREN),
    ("VOLUMEDOWN", KEY_VOLUMEDOWN),
    ("VOLUMEUP", KEY_VOLUMEUP),
    ("CALC", KEY_CALC),
];
