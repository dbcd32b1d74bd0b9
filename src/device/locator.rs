//! Touchpad / keyboard discovery
//!
//! Scans the kernel's input device listing (/proc/bus/input/devices) for
//! the Asus/ELAN touchpad and the keyboard that owns NumLock, retrying a
//! bounded number of times while the devices settle after boot.

use std::io;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::error::{MissingDevice, NumpadError};

/// Kernel listing of input devices
pub const PROC_INPUT_DEVICES: &str = "/proc/bus/input/devices";

/// Touchpad name prefixes (inside `N: Name="...`)
const TOUCHPAD_VENDORS: &[&str] = &["ASUE", "ELAN"];

/// Keyboards that carry the NumLock LED
const KEYBOARD_NAMES: &[&str] = &["AT Translated Set 2 keyboard", "Asus Keyboard"];

/// Source of the device listing, re-read on every attempt
pub trait DeviceListing {
    fn read_listing(&mut self) -> io::Result<String>;
}

/// Reads /proc/bus/input/devices
pub struct ProcDevices;

impl DeviceListing for ProcDevices {
    fn read_listing(&mut self) -> io::Result<String> {
        std::fs::read_to_string(PROC_INPUT_DEVICES)
    }
}

/// One `I:`..blank-line block of the listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    pub name: String,
    /// `S: Sysfs=` path
    pub sysfs: String,
    /// `H: Handlers=` tokens
    pub handlers: Vec<String>,
}

impl DeviceRecord {
    /// N of the `eventN` handler
    pub fn event_node(&self) -> Option<u32> {
        self.handlers
            .iter()
            .find_map(|h| h.strip_prefix("event").and_then(|n| n.parse().ok()))
    }

    /// N of the `i2c-N/` component of the sysfs path
    pub fn i2c_bus(&self) -> Option<u32> {
        let start = self.sysfs.find("i2c-")? + "i2c-".len();
        let rest = &self.sysfs[start..];
        let end = rest.find('/')?;
        rest[..end].parse().ok()
    }

    fn is_touchpad(&self) -> bool {
        TOUCHPAD_VENDORS.iter().any(|v| self.name.starts_with(v)) && self.name.contains("Touchpad")
    }

    fn is_keyboard(&self) -> bool {
        KEYBOARD_NAMES.iter().any(|k| self.name.starts_with(k))
    }
}

/// Split the listing into per-device records
pub fn parse_listing(listing: &str) -> Vec<DeviceRecord> {
    let mut records = Vec::new();
    let mut current: Option<DeviceRecord> = None;

    for line in listing.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            records.extend(current.take());
            continue;
        }

        let record = current.get_or_insert_with(DeviceRecord::default);
        if let Some(rest) = line.strip_prefix("N: Name=") {
            record.name = rest.trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("S: Sysfs=") {
            record.sysfs = rest.to_string();
        } else if let Some(rest) = line.strip_prefix("H: Handlers=") {
            record.handlers = rest.split_whitespace().map(str::to_string).collect();
        }
    }
    records.extend(current);
    records
}

/// Event nodes and bus address found by the locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedDevices {
    pub touchpad_event: u32,
    pub keyboard_event: u32,
    pub i2c_bus: u32,
}

/// Result of scanning one listing
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ScanResult {
    touchpad_event: Option<u32>,
    keyboard_event: Option<u32>,
    i2c_bus: Option<u32>,
}

impl ScanResult {
    fn located(&self) -> Option<LocatedDevices> {
        Some(LocatedDevices {
            touchpad_event: self.touchpad_event?,
            keyboard_event: self.keyboard_event?,
            i2c_bus: self.i2c_bus?,
        })
    }

    fn missing(&self) -> Vec<MissingDevice> {
        let mut missing = Vec::new();
        if self.touchpad_event.is_none() {
            missing.push(MissingDevice::Touchpad);
        }
        if self.keyboard_event.is_none() {
            missing.push(MissingDevice::Keyboard);
        }
        if self.touchpad_event.is_some() && self.i2c_bus.is_none() {
            missing.push(MissingDevice::BusAddress);
        }
        missing
    }
}

/// One linear pass; the first matching touchpad and keyboard win
fn scan(records: &[DeviceRecord]) -> ScanResult {
    let mut result = ScanResult::default();
    let mut touchpad_seen = false;
    let mut keyboard_seen = false;

    for record in records {
        if !touchpad_seen && record.is_touchpad() {
            touchpad_seen = true;
            debug!("Detect touchpad from {:?} ({})", record.name, record.sysfs);
            result.touchpad_event = record.event_node();
            result.i2c_bus = record.i2c_bus();
        }

        if !keyboard_seen && record.is_keyboard() {
            keyboard_seen = true;
            debug!("Detect keyboard from {:?}", record.name);
            result.keyboard_event = record.event_node();
        }

        if result.located().is_some() {
            break;
        }
    }
    result
}

/// Retry tuning (taken from the layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

/// Scan until both devices resolve or the attempts run out.
/// `sleep` is called between attempts, never after the last one.
/// `stop` is checked before every attempt and gives up with `Interrupted`.
pub fn locate(
    listing: &mut impl DeviceListing,
    policy: RetryPolicy,
    mut sleep: impl FnMut(Duration),
    mut stop: impl FnMut() -> bool,
) -> Result<LocatedDevices, NumpadError> {
    let attempts = policy.attempts.max(1);
    let mut last = ScanResult::default();

    for attempt in 1..=attempts {
        if stop() {
            info!("Device discovery stopped after {} attempts", attempt - 1);
            return Err(NumpadError::Interrupted);
        }
        match listing.read_listing() {
            Ok(text) => {
                last = scan(&parse_listing(&text));
                if let Some(found) = last.located() {
                    info!(
                        "Devices found: touchpad event{}, keyboard event{}, i2c bus {}",
                        found.touchpad_event, found.keyboard_event, found.i2c_bus
                    );
                    return Ok(found);
                }
                debug!(
                    "Attempt {}/{}: missing {:?}",
                    attempt,
                    attempts,
                    last.missing()
                );
            }
            Err(e) => {
                warn!("Attempt {}/{}: cannot read device listing: {}", attempt, attempts, e);
                last = ScanResult::default();
            }
        }

        if attempt < attempts {
            sleep(policy.interval);
        }
    }

    let missing = last.missing();
    for part in &missing {
        error!("Can't find {}", part);
    }
    Err(NumpadError::DeviceNotFound { attempts, missing })
}
