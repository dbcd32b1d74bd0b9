//! Device discovery and binding

pub mod locator;

pub use locator::{locate, LocatedDevices, ProcDevices, RetryPolicy};

use crate::input::TouchBounds;

/// Handles resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceBinding {
    pub touchpad_event: u32,
    pub keyboard_event: u32,
    pub i2c_bus: u32,
    pub bounds: TouchBounds,
}

impl DeviceBinding {
    pub fn new(located: LocatedDevices, bounds: TouchBounds) -> Self {
        Self {
            touchpad_event: located.touchpad_event,
            keyboard_event: located.keyboard_event,
            i2c_bus: located.i2c_bus,
            bounds,
        }
    }
}
