//! Touch interpreter
//!
//! Mode state machine over the raw touchpad stream. Each event updates
//! the current position or finger state and, depending on the mode,
//! becomes a numpad key, a dial rotation, a mode switch or nothing.
//!
//! ```text
//!   toggle corner      toggle corner      toggle corner
//! Disabled ───────▶ Numpad ───────▶ Dial ───────▶ (first mode)
//! ```
//!
//! The cycle follows the configured mode list, which may skip modes.

pub mod dial;
pub mod mapper;

use std::collections::BTreeSet;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::bus::{Brightness, BusCommand, BusCommandSender};
use crate::input::keycodes::{
    KEY_5, KEY_CALC, KEY_LEFTSHIFT, KEY_NUMLOCK, KEY_VOLUMEDOWN, KEY_VOLUMEUP,
};
use crate::input::{
    ExclusiveGrab, FingerState, KeyCode, KeyEvent, NumLockLed, TouchBounds, TouchEvent,
    VirtualKeyboard,
};
use crate::layout::Layout;
use dial::DialPivot;
use mapper::Region;

/// Touchpad behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Plain pointer, nothing intercepted
    Disabled,
    Numpad,
    Dial,
}

impl Mode {
    /// Parse "0"/"1"/"2" or "disabled"/"numpad"/"dial"
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "disabled" | "off" => Some(Mode::Disabled),
            "1" | "numpad" => Some(Mode::Numpad),
            "2" | "dial" => Some(Mode::Dial),
            _ => None,
        }
    }
}

/// What dial rotation turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialAction {
    /// Only track and log the rotation
    None,
    /// Volume up/down taps per step of rotation
    Volume,
}

/// Key held down by the current contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressedKey {
    pub key: KeyCode,
    /// Left-Shift was pressed with it
    pub shifted: bool,
}

/// Per-contact state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchGesture {
    pub active: bool,
    pub pressed: Option<PressedKey>,
    pub start: Option<(i32, i32)>,
}

/// Drag state while in dial mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialState {
    pub active: bool,
    pub pivot: DialPivot,
    pub start_angle: Option<f64>,
    /// Net rotation since the drag began, in [0, 2π)
    pub delta: f64,
    /// Angle of the previous drag sample
    last_angle: Option<f64>,
    /// Signed rotation not yet turned into action steps
    pending: f64,
}

impl DialState {
    fn new(pivot: DialPivot) -> Self {
        Self {
            active: false,
            pivot,
            start_angle: None,
            delta: 0.0,
            last_angle: None,
            pending: 0.0,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.pivot);
    }
}

/// Everything the polling loop mutates
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterState {
    pub mode: Mode,
    /// Index into the configured mode list
    pub mode_index: usize,
    pub gesture: TouchGesture,
    pub dial: DialState,
    pub brightness: Brightness,
    /// Touchpad currently grabbed
    pub grabbed: bool,
    /// NumLock was off on numpad entry and we switched it on
    pub numlock_set: bool,
    /// Last reported position
    pub x: i32,
    pub y: i32,
}

impl InterpreterState {
    /// Invariants that must hold between events
    pub fn is_consistent(&self) -> bool {
        let grab_ok = !self.grabbed || self.mode != Mode::Disabled;
        let dial_ok = !self.dial.active || self.mode == Mode::Dial;
        let key_ok = self.gesture.pressed.is_none() || self.mode == Mode::Numpad;
        let numlock_ok = !self.numlock_set || self.mode == Mode::Numpad;
        grab_ok && dial_ok && key_ok && numlock_ok
    }
}

/// Runtime settings outside the layout
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterSettings {
    /// Ordered mode cycle, never empty
    pub modes: Vec<Mode>,
    /// Replaces the KEY_5 slot of a layout and is sent with Shift
    pub percentage_key: KeyCode,
    pub pivot: DialPivot,
    pub dial_action: DialAction,
    /// Rotation per dial action step, in radians
    pub dial_step: f64,
    /// Backlight level used when the numpad is first switched on
    pub brightness: Brightness,
}

/// Keys the virtual keyboard must be able to send
pub fn capability_set(layout: &Layout, settings: &InterpreterSettings) -> BTreeSet<KeyCode> {
    let mut keys: BTreeSet<KeyCode> = layout.all_keys().collect();
    keys.extend([KEY_LEFTSHIFT, KEY_NUMLOCK, KEY_CALC, settings.percentage_key]);
    if settings.dial_action == DialAction::Volume {
        keys.extend([KEY_VOLUMEUP, KEY_VOLUMEDOWN]);
    }
    keys
}

/// The mode state machine
pub struct Interpreter<K: VirtualKeyboard, B: BusCommandSender> {
    layout: Layout,
    bounds: TouchBounds,
    settings: InterpreterSettings,
    keyboard: K,
    bus: B,
    state: InterpreterState,
}

impl<K: VirtualKeyboard, B: BusCommandSender> Interpreter<K, B> {
    pub fn new(
        layout: Layout,
        bounds: TouchBounds,
        mut settings: InterpreterSettings,
        keyboard: K,
        bus: B,
    ) -> Self {
        if settings.modes.is_empty() {
            settings.modes.push(Mode::Disabled);
        }
        let state = InterpreterState {
            mode: Mode::Disabled,
            mode_index: 0,
            gesture: TouchGesture::default(),
            dial: DialState::new(settings.pivot),
            brightness: settings.brightness,
            grabbed: false,
            numlock_set: false,
            x: 0,
            y: 0,
        };
        Self {
            layout,
            bounds,
            settings,
            keyboard,
            bus,
            state,
        }
    }

    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// Enter the first configured mode
    pub fn start<G: ExclusiveGrab + NumLockLed>(&mut self, host: &mut G) {
        let first = self.settings.modes[0];
        info!("Starting in {:?} mode", first);
        self.enter_mode(first, host);
    }

    /// Release anything held and drop back to plain pointer behavior
    pub fn shutdown<G: ExclusiveGrab + NumLockLed>(&mut self, host: &mut G) {
        self.finger_up();
        let current = self.state.mode;
        self.leave_mode(current, host);
        self.state.mode = Mode::Disabled;
        info!("Interpreter stopped");
    }

    /// Process one touch event
    pub fn handle<G: ExclusiveGrab + NumLockLed>(&mut self, event: TouchEvent, host: &mut G) {
        match event {
            TouchEvent::PositionX(x) => {
                self.state.x = x;
                self.drag();
            }
            TouchEvent::PositionY(y) => {
                self.state.y = y;
                self.drag();
            }
            TouchEvent::Finger(FingerState::Down) => self.finger_down(host),
            TouchEvent::Finger(FingerState::Held) => self.drag(),
            TouchEvent::Finger(FingerState::Up) => self.finger_up(),
        }
        debug_assert!(self.state.is_consistent(), "{:?}", self.state);
    }

    fn finger_down<G: ExclusiveGrab + NumLockLed>(&mut self, host: &mut G) {
        let (x, y) = (self.state.x, self.state.y);

        if self.state.gesture.pressed.is_some() {
            debug!("finger down at x {} y {} while a key is held, ignored", x, y);
            return;
        }

        debug!(
            "finger down at x {} y {} xr {:.3} yr {:.3}",
            x,
            y,
            x as f64 / self.bounds.max_x as f64,
            y as f64 / self.bounds.max_y as f64
        );

        match mapper::region_at(x, y, &self.bounds) {
            Some(Region::Toggle) => {
                self.state.gesture = TouchGesture::default();
                self.advance_mode(host);
                return;
            }
            Some(Region::Secondary) => {
                if self.state.mode == Mode::Numpad {
                    self.cycle_brightness();
                } else {
                    self.tap(KEY_CALC);
                }
                return;
            }
            None => {}
        }

        match self.state.mode {
            Mode::Disabled => {}
            Mode::Numpad => self.press_key(x, y),
            Mode::Dial => self.start_dial(x, y),
        }
    }

    fn finger_up(&mut self) {
        if let Some(pressed) = self.state.gesture.pressed.take() {
            debug!("send key up event {}", pressed.key);
            let mut batch = vec![KeyEvent::release(pressed.key)];
            if pressed.shifted {
                batch.push(KeyEvent::release(KEY_LEFTSHIFT));
            }
            // Not retried: a repeated release could loop on a broken device
            if let Err(e) = self.keyboard.emit(&batch) {
                error!("Cannot send release event for {}: {}", pressed.key, e);
            }
        }
        self.state.gesture = TouchGesture::default();
        self.state.dial.reset();
    }

    fn press_key(&mut self, x: i32, y: i32) {
        let Some(mut key) = mapper::key_at(x, y, &self.layout, &self.bounds) else {
            let (row, col) = mapper::cell_at(x, y, &self.layout, &self.bounds);
            debug!("Unhandled col/row {}/{} for position {}-{}", col, row, x, y);
            return;
        };

        if key == KEY_5 {
            key = self.settings.percentage_key;
        }
        let shifted = key == self.settings.percentage_key;

        debug!("send press key event {}", key);
        let batch = if shifted {
            vec![KeyEvent::press(KEY_LEFTSHIFT), KeyEvent::press(key)]
        } else {
            vec![KeyEvent::press(key)]
        };
        if let Err(e) = self.keyboard.emit(&batch) {
            warn!("Cannot send press event for {}: {}", key, e);
        }

        // Recorded even if the press failed so the release is still sent
        self.state.gesture = TouchGesture {
            active: true,
            pressed: Some(PressedKey { key, shifted }),
            start: Some((x, y)),
        };
    }

    fn start_dial(&mut self, x: i32, y: i32) {
        let pivot = self.settings.pivot;
        if !pivot.contains(x, y) {
            debug!("dial drag starts outside the dial face at x {} y {}", x, y);
        }
        let angle = dial::get_angle(pivot.x, pivot.y, x, y);
        self.state.gesture = TouchGesture {
            active: true,
            pressed: None,
            start: Some((x, y)),
        };
        let dial_state = &mut self.state.dial;
        dial_state.reset();
        dial_state.active = true;
        dial_state.start_angle = angle;
        dial_state.last_angle = angle;
    }

    fn drag(&mut self) {
        if self.state.mode != Mode::Dial || !self.state.gesture.active || !self.state.dial.active {
            return;
        }
        let pivot = self.settings.pivot;
        let current = dial::get_angle(pivot.x, pivot.y, self.state.x, self.state.y);

        let dial_state = &mut self.state.dial;
        dial_state.delta = dial::angle_delta(dial_state.start_angle, current);
        debug!(
            "dial {:?} start {:?} at ({}, {}) angle {:?} delta {:.3}",
            pivot, self.state.gesture.start, self.state.x, self.state.y, current, dial_state.delta
        );

        let Some(current) = current else {
            return;
        };
        if let Some(last) = dial_state.last_angle {
            dial_state.pending += dial::signed_step(last, current);
        }
        dial_state.last_angle = Some(current);

        if self.settings.dial_action == DialAction::Volume {
            self.apply_volume_steps();
        }
    }

    fn apply_volume_steps(&mut self) {
        let step = self.settings.dial_step;
        if step <= 0.0 {
            return;
        }
        while self.state.dial.pending >= step {
            self.state.dial.pending -= step;
            self.tap(KEY_VOLUMEUP);
        }
        while self.state.dial.pending <= -step {
            self.state.dial.pending += step;
            self.tap(KEY_VOLUMEDOWN);
        }
    }

    fn advance_mode<G: ExclusiveGrab + NumLockLed>(&mut self, host: &mut G) {
        let old = self.state.mode;
        self.state.mode_index = (self.state.mode_index + 1) % self.settings.modes.len();
        let new = self.settings.modes[self.state.mode_index];

        self.leave_mode(old, host);
        self.enter_mode(new, host);
        info!("Mode {:?} -> {:?}", old, new);
    }

    fn enter_mode<G: ExclusiveGrab + NumLockLed>(&mut self, mode: Mode, host: &mut G) {
        self.state.mode = mode;
        match mode {
            Mode::Disabled => {}
            Mode::Numpad => {
                self.switch_numlock_on(host);
                self.send_bus(BusCommand::NumpadOn(self.state.brightness));
                self.set_grab(true, host);
                debug!("numpad activated");
            }
            Mode::Dial => {
                self.send_bus(BusCommand::DialOn);
                self.set_grab(true, host);
                debug!("dial activated");
            }
        }
    }

    fn leave_mode<G: ExclusiveGrab + NumLockLed>(&mut self, mode: Mode, host: &mut G) {
        match mode {
            Mode::Disabled => {}
            Mode::Numpad => {
                self.numlock_restore();
                self.send_bus(BusCommand::NumpadOff);
                self.set_grab(false, host);
                debug!("numpad deactivated");
            }
            Mode::Dial => {
                self.state.dial.reset();
                self.send_bus(BusCommand::DialOff);
                self.set_grab(false, host);
                debug!("dial deactivated");
            }
        }
        self.state.mode = Mode::Disabled;
    }

    /// Switch NumLock on unless the host already has it on
    fn switch_numlock_on<G: NumLockLed>(&mut self, host: &mut G) {
        let already_on = match host.numlock_on() {
            Ok(on) => on,
            Err(e) => {
                warn!("{:#}, assuming NumLock is off", e);
                false
            }
        };
        if already_on {
            debug!("NumLock already on");
            return;
        }
        self.state.numlock_set = self.tap(KEY_NUMLOCK);
    }

    /// Switch NumLock back off, only if numpad entry switched it on
    fn numlock_restore(&mut self) {
        if std::mem::take(&mut self.state.numlock_set) {
            self.tap(KEY_NUMLOCK);
        }
    }

    fn cycle_brightness(&mut self) {
        self.state.brightness = self.state.brightness.next();
        debug!("numpad brightness {:?}", self.state.brightness);
        self.send_bus(BusCommand::NumpadOn(self.state.brightness));
    }

    /// Press and release one key, as two synchronized batches.
    /// False if the press could not be sent.
    fn tap(&mut self, key: KeyCode) -> bool {
        if let Err(e) = self.keyboard.emit(&[KeyEvent::press(key)]) {
            warn!("Cannot send {}: {}", key, e);
            return false;
        }
        if let Err(e) = self.keyboard.emit(&[KeyEvent::release(key)]) {
            error!("Cannot send release event for {}: {}", key, e);
        }
        true
    }

    fn send_bus(&mut self, command: BusCommand) {
        if let Err(e) = self.bus.send(command) {
            warn!("{}", e);
        }
    }

    fn set_grab<G: ExclusiveGrab>(&mut self, want: bool, grab: &mut G) {
        if want == self.state.grabbed {
            return;
        }
        if want {
            match grab.grab() {
                Ok(()) => self.state.grabbed = true,
                Err(e) => warn!("{:#}", e),
            }
        } else {
            // Our claim ends even if the kernel call fails
            self.state.grabbed = false;
            if let Err(e) = grab.ungrab() {
                warn!("{:#}", e);
            }
        }
    }
}
