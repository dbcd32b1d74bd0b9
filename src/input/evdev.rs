//! evdev input handling
//!
//! Read the touchpad and keyboard directly from /dev/input/eventN and
//! create the uinput keyboard the numpad types into.

use std::collections::BTreeSet;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use ::evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use ::evdev::{
    AbsoluteAxisType, AttributeSet, Device, EventType, InputEvent, InputEventKind, Key, LedType,
};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use nix::fcntl::{fcntl, FcntlArg, OFlag};

use super::{
    ExclusiveGrab, FingerState, KeyCode, KeyEvent, NumLockLed, RawEventSource, TouchBounds,
    TouchEvent, VirtualKeyboard,
};
use crate::constants::MAX_DRAIN_BATCHES;
use crate::error::NumpadError;

/// Name the virtual keyboard is registered under
pub const VIRTUAL_DEVICE_NAME: &str = "Asus Touchpad/Numpad";

/// Path of an event node number
pub fn event_node_path(node: u32) -> PathBuf {
    PathBuf::from(format!("/dev/input/event{}", node))
}

/// Set a device fd to non-blocking
fn set_nonblocking(fd: RawFd) -> Result<()> {
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| anyhow!("F_GETFL failed: {}", e))?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.insert(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| anyhow!("F_SETFL failed: {}", e))?;
    Ok(())
}

fn open_nonblocking(path: &Path) -> Result<Device> {
    let device = Device::open(path)
        .with_context(|| format!("Cannot open input device {}", path.display()))?;
    set_nonblocking(device.as_raw_fd())
        .with_context(|| format!("Cannot set {} non-blocking", path.display()))?;
    Ok(device)
}

/// Read batches until the fd reports WouldBlock.
/// A single `fetch_events` call returns at most one kernel read.
fn drain_queue<T>(mut fetch: impl FnMut() -> io::Result<Vec<T>>) -> io::Result<Vec<T>> {
    let mut queued = Vec::new();
    for _ in 0..MAX_DRAIN_BATCHES {
        match fetch() {
            Ok(batch) if batch.is_empty() => break,
            Ok(batch) => queued.extend(batch),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(e),
        }
    }
    Ok(queued)
}

/// Drain a source until its first read error, then leave it alone
fn drain_until_failure<T>(
    failed: &mut bool,
    name: &str,
    fetch: impl FnMut() -> io::Result<Vec<T>>,
) -> Vec<T> {
    if *failed {
        return Vec::new();
    }
    match drain_queue(fetch) {
        Ok(events) => events,
        Err(e) => {
            warn!("{} read error, no longer reading it: {}", name, e);
            *failed = true;
            Vec::new()
        }
    }
}

/// Classify a raw evdev event. Returns None for events the numpad ignores.
pub fn classify_event(event: &InputEvent) -> Option<TouchEvent> {
    match event.kind() {
        InputEventKind::AbsAxis(AbsoluteAxisType::ABS_MT_POSITION_X) => {
            Some(TouchEvent::PositionX(event.value()))
        }
        InputEventKind::AbsAxis(AbsoluteAxisType::ABS_MT_POSITION_Y) => {
            Some(TouchEvent::PositionY(event.value()))
        }
        InputEventKind::Key(Key::BTN_TOOL_FINGER) => {
            Some(TouchEvent::Finger(FingerState::from_value(event.value())))
        }
        _ => None,
    }
}

/// Physical touchpad opened for raw reads
pub struct EvdevTouchpad {
    device: Device,
    bounds: TouchBounds,
}

impl EvdevTouchpad {
    /// Open /dev/input/eventN non-blocking and read its X/Y ranges
    pub fn open(path: &Path) -> Result<Self> {
        let device = open_nonblocking(path)?;

        let abs = device
            .get_abs_state()
            .with_context(|| format!("Cannot read axis ranges of {}", path.display()))?;
        let x = abs[AbsoluteAxisType::ABS_X.0 as usize];
        let y = abs[AbsoluteAxisType::ABS_Y.0 as usize];
        let bounds = TouchBounds {
            min_x: x.minimum,
            max_x: x.maximum,
            min_y: y.minimum,
            max_y: y.maximum,
        };
        if bounds.max_x <= 0 || bounds.max_y <= 0 {
            return Err(anyhow!(
                "Touchpad {} reports no usable range (max x {}, max y {})",
                path.display(),
                bounds.max_x,
                bounds.max_y
            ));
        }

        info!(
            "Touchpad {} ({}) min-max: x {}-{}, y {}-{}",
            path.display(),
            device.name().unwrap_or("?"),
            bounds.min_x,
            bounds.max_x,
            bounds.min_y,
            bounds.max_y
        );

        Ok(Self { device, bounds })
    }
}

impl ExclusiveGrab for EvdevTouchpad {
    fn grab(&mut self) -> Result<()> {
        self.device.grab().context("Touchpad grab failed")
    }

    fn ungrab(&mut self) -> Result<()> {
        self.device.ungrab().context("Touchpad ungrab failed")
    }
}

impl RawEventSource for EvdevTouchpad {
    fn fetch(&mut self) -> Result<Vec<TouchEvent>> {
        let device = &mut self.device;
        let events = drain_queue(|| device.fetch_events().map(|batch| batch.collect::<Vec<_>>()))
            .context("Touchpad read error")?;
        Ok(events.iter().filter_map(classify_event).collect())
    }

    fn bounds(&self) -> TouchBounds {
        self.bounds
    }
}

/// Physical keyboard, drained every tick so its queue never backs up
pub struct KeyboardMonitor {
    device: Device,
    failed: bool,
}

impl KeyboardMonitor {
    pub fn open(path: &Path) -> Result<Self> {
        let device = open_nonblocking(path)?;
        info!(
            "Keyboard {} ({}) opened",
            path.display(),
            device.name().unwrap_or("?")
        );
        Ok(Self {
            device,
            failed: false,
        })
    }

    /// Drain queued events, returning how many NumLock presses were seen.
    /// After the first read error (e.g. the keyboard was unplugged) the
    /// device is no longer read.
    // TODO: switch into/out of numpad mode when the physical NumLock LED changes
    pub fn drain(&mut self) -> usize {
        let device = &mut self.device;
        let events = drain_until_failure(&mut self.failed, "Keyboard", || {
            device.fetch_events().map(|batch| batch.collect::<Vec<_>>())
        });
        let presses = events
            .iter()
            .filter(|e| matches!(e.kind(), InputEventKind::Key(Key::KEY_NUMLOCK)) && e.value() == 1)
            .count();
        if presses > 0 {
            debug!("Physical NumLock pressed ({}x)", presses);
        }
        presses
    }
}

impl NumLockLed for KeyboardMonitor {
    fn numlock_on(&mut self) -> Result<bool> {
        let leds = self
            .device
            .get_led_state()
            .context("Cannot read keyboard LEDs")?;
        Ok(leds.contains(LedType::LED_NUML))
    }
}

/// uinput keyboard the numpad emits into
pub struct UinputKeyboard {
    device: VirtualDevice,
    keys: BTreeSet<KeyCode>,
}

impl UinputKeyboard {
    pub fn create(keys: BTreeSet<KeyCode>) -> Result<Self> {
        let mut attrs = AttributeSet::<Key>::new();
        for key in &keys {
            attrs.insert(Key::new(key.code()));
        }

        let device = VirtualDeviceBuilder::new()
            .context("Failed to create uinput builder")?
            .name(VIRTUAL_DEVICE_NAME)
            .with_keys(&attrs)
            .context("Failed to set key capabilities")?
            .build()
            .context("Failed to build uinput device")?;

        info!(
            "Virtual keyboard '{}' created with {} keys",
            VIRTUAL_DEVICE_NAME,
            keys.len()
        );

        Ok(Self { device, keys })
    }
}

impl VirtualKeyboard for UinputKeyboard {
    fn emit(&mut self, batch: &[KeyEvent]) -> Result<(), NumpadError> {
        let events: Vec<InputEvent> = batch
            .iter()
            .map(|k| InputEvent::new(EventType::KEY, k.key.code(), k.value()))
            .collect();
        // VirtualDevice::emit terminates the batch with SYN_REPORT
        self.device
            .emit(&events)
            .map_err(NumpadError::EventEmissionFailed)
    }

    fn supported_keys(&self) -> &BTreeSet<KeyCode> {
        &self.keys
    }
}
