//! Input handling
//!
//! Raw touchpad events in, synthetic key events out.
//! - `RawEventSource`: non-blocking touch stream from the physical touchpad
//! - `VirtualKeyboard`: uinput keyboard the numpad types into
//! - `NumLockLed`: host NumLock state, read from the physical keyboard
//! - evdev/uinput backed implementations live in `evdev`

pub mod evdev;
pub mod keycodes;

use std::collections::BTreeSet;

use anyhow::Result;

use crate::error::NumpadError;
pub use keycodes::KeyCode;

/// Tool state reported by BTN_TOOL_FINGER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerState {
    /// Finger lifted (value 0)
    Up,
    /// Finger landed (value 1)
    Down,
    /// Finger still on the surface (value 2, sent while dragging)
    Held,
}

impl FingerState {
    pub fn from_value(value: i32) -> Self {
        match value {
            0 => FingerState::Up,
            1 => FingerState::Down,
            _ => FingerState::Held,
        }
    }
}

/// Touch event the interpreter cares about, decoupled from evdev types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    PositionX(i32),
    PositionY(i32),
    Finger(FingerState),
}

/// Key state inside an output batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// One key transition sent to the virtual keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn press(key: KeyCode) -> Self {
        Self {
            key,
            state: KeyState::Pressed,
        }
    }

    pub fn release(key: KeyCode) -> Self {
        Self {
            key,
            state: KeyState::Released,
        }
    }

    /// evdev value (1 = press, 0 = release)
    pub fn value(&self) -> i32 {
        match self.state {
            KeyState::Pressed => 1,
            KeyState::Released => 0,
        }
    }
}

/// Absolute coordinate range of the touch surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

/// Exclusive access to the touchpad (suspends the OS pointer path)
pub trait ExclusiveGrab {
    fn grab(&mut self) -> Result<()>;
    fn ungrab(&mut self) -> Result<()>;
}

/// Non-blocking stream of touch events from one physical device
pub trait RawEventSource: ExclusiveGrab {
    /// Drain every queued event. An empty vec means "nothing right now".
    fn fetch(&mut self) -> Result<Vec<TouchEvent>>;

    /// Coordinate range reported by the device
    fn bounds(&self) -> TouchBounds;
}

/// NumLock LED of the host keyboard
pub trait NumLockLed {
    fn numlock_on(&mut self) -> Result<bool>;
}

/// Touchpad grab and keyboard LED handed to the interpreter together
pub struct HostDevices<'a, G, L> {
    pub touchpad: &'a mut G,
    pub keyboard: &'a mut L,
}

impl<G: ExclusiveGrab, L> ExclusiveGrab for HostDevices<'_, G, L> {
    fn grab(&mut self) -> Result<()> {
        self.touchpad.grab()
    }

    fn ungrab(&mut self) -> Result<()> {
        self.touchpad.ungrab()
    }
}

impl<G, L: NumLockLed> NumLockLed for HostDevices<'_, G, L> {
    fn numlock_on(&mut self) -> Result<bool> {
        self.keyboard.numlock_on()
    }
}

/// Synthetic keyboard device
pub trait VirtualKeyboard {
    /// Emit one ordered batch, terminated by a synchronization marker
    fn emit(&mut self, batch: &[KeyEvent]) -> Result<(), NumpadError>;

    /// Keys this device was created with
    fn supported_keys(&self) -> &BTreeSet<KeyCode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finger_state_from_value() {
        assert_eq!(FingerState::from_value(0), FingerState::Up);
        assert_eq!(FingerState::from_value(1), FingerState::Down);
        assert_eq!(FingerState::from_value(2), FingerState::Held);
    }

    #[test]
    fn test_key_event_value() {
        assert_eq!(KeyEvent::press(keycodes::KEY_KP1).value(), 1);
        assert_eq!(KeyEvent::release(keycodes::KEY_KP1).value(), 0);
    }

    struct Pad(Vec<&'static str>);

    impl ExclusiveGrab for Pad {
        fn grab(&mut self) -> Result<()> {
            self.0.push("grab");
            Ok(())
        }

        fn ungrab(&mut self) -> Result<()> {
            self.0.push("ungrab");
            Ok(())
        }
    }

    struct Led(bool);

    impl NumLockLed for Led {
        fn numlock_on(&mut self) -> Result<bool> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_host_devices_delegate() {
        let mut pad = Pad(Vec::new());
        let mut led = Led(true);
        let mut host = HostDevices {
            touchpad: &mut pad,
            keyboard: &mut led,
        };
        host.grab().unwrap();
        host.ungrab().unwrap();
        assert!(host.numlock_on().unwrap());
        assert_eq!(pad.0, vec!["grab", "ungrab"]);
    }
}
