//! Global constants for asus-numpad
//!
//! Consolidates timing, touch-region and hardware constants
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Timing Constants
// ============================================================================

/// Default pause between polling cycles in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Upper bound on reads per device per cycle (evdev reads 32 events at a time)
pub const MAX_DRAIN_BATCHES: usize = 64;

// ============================================================================
// Touch Regions (fractions of the touchpad's max coordinates)
// ============================================================================

/// Mode toggle corner (top-right): x above this fraction of max_x
pub const TOGGLE_REGION_MIN_X: f64 = 0.95;

/// Mode toggle corner (top-right): y below this fraction of max_y
pub const TOGGLE_REGION_MAX_Y: f64 = 0.09;

/// Secondary corner (top-left): x below this fraction of max_x
pub const SECONDARY_REGION_MAX_X: f64 = 0.06;

/// Secondary corner (top-left): y below this fraction of max_y
pub const SECONDARY_REGION_MAX_Y: f64 = 0.07;

// ============================================================================
// Dial Defaults
// ============================================================================

/// Default dial pivot X
pub const DEFAULT_DIAL_X: i32 = 750;

/// Default dial pivot Y
pub const DEFAULT_DIAL_Y: i32 = 850;

/// Default dial radius
pub const DEFAULT_DIAL_RADIUS: i32 = 450;

/// Default rotation per volume step in degrees
pub const DEFAULT_DIAL_STEP_DEGREES: f64 = 30.0;

// ============================================================================
// Touchpad Controller (i2c)
// ============================================================================

/// i2c device address of the numpad controller
pub const NUMPAD_I2C_ADDRESS: u8 = 0x15;

/// Bytes preceding the value byte of every numpad/dial command
pub const BUS_COMMAND_PREFIX: [u8; 11] = [
    0x05, 0x00, 0x3d, 0x03, 0x06, 0x00, 0x07, 0x00, 0x0d, 0x14, 0x03,
];

/// Byte terminating every numpad/dial command
pub const BUS_COMMAND_SUFFIX: u8 = 0xad;

/// Value byte that switches the backlight / dial firmware off
pub const BUS_VALUE_OFF: u8 = 0x00;

/// Value byte that switches the dial firmware on
pub const BUS_VALUE_DIAL_ON: u8 = 0x01;

/// Backlight value bytes: low, half, full
pub const BACKLIGHT_VALUES: [u8; 3] = [31, 24, 1];
