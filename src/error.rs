//! Domain errors
//!
//! Application boundaries use `anyhow`; these are the failures the
//! state machine and the device locator need to tell apart.

use std::fmt;
use std::io;

use thiserror::Error;

/// Part of the device binding that discovery could not resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingDevice {
    Touchpad,
    Keyboard,
    BusAddress,
}

impl fmt::Display for MissingDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingDevice::Touchpad => write!(f, "touchpad"),
            MissingDevice::Keyboard => write!(f, "keyboard"),
            MissingDevice::BusAddress => write!(f, "touchpad i2c bus address"),
        }
    }
}

#[derive(Debug, Error)]
pub enum NumpadError {
    #[error("device not found after {attempts} attempts: missing {}", join_missing(.missing))]
    DeviceNotFound {
        attempts: u32,
        missing: Vec<MissingDevice>,
    },

    #[error("interrupted by shutdown request")]
    Interrupted,

    #[error("failed to emit key events: {0}")]
    EventEmissionFailed(#[source] io::Error),

    #[error("bus command {command} failed: {reason}")]
    BusCommandFailed { command: String, reason: String },

    #[error("invalid layout '{model}': {reason}")]
    InvalidLayout { model: String, reason: String },

    #[error("unknown model '{0}' (see --list-models)")]
    UnknownModel(String),

    #[error("unknown key name '{0}'")]
    UnknownKey(String),
}

fn join_missing(missing: &[MissingDevice]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_lists_every_missing_part() {
        let err = NumpadError::DeviceNotFound {
            attempts: 3,
            missing: vec![MissingDevice::Keyboard, MissingDevice::BusAddress],
        };
        assert_eq!(
            err.to_string(),
            "device not found after 3 attempts: missing keyboard, touchpad i2c bus address"
        );
    }
}
