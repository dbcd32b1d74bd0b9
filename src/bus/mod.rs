//! Touchpad controller commands
//!
//! Numpad backlight and dial firmware are switched by writing a short
//! i2c message to the touchpad controller. The interpreter only sees
//! `BusCommandSender`; the real sender shells out to `i2ctransfer`.

use std::fmt;
use std::process::Command;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BACKLIGHT_VALUES, BUS_COMMAND_PREFIX, BUS_COMMAND_SUFFIX, BUS_VALUE_DIAL_ON, BUS_VALUE_OFF,
};
use crate::error::NumpadError;

/// Numpad backlight level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brightness {
    Low,
    Half,
    Full,
}

impl Brightness {
    /// Next level, wrapping from Full back to Low
    pub fn next(self) -> Self {
        match self {
            Brightness::Low => Brightness::Half,
            Brightness::Half => Brightness::Full,
            Brightness::Full => Brightness::Low,
        }
    }

    fn value(self) -> u8 {
        match self {
            Brightness::Low => BACKLIGHT_VALUES[0],
            Brightness::Half => BACKLIGHT_VALUES[1],
            Brightness::Full => BACKLIGHT_VALUES[2],
        }
    }
}

/// Command understood by the touchpad controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCommand {
    /// Numpad on with backlight at the given level (also used to change level)
    NumpadOn(Brightness),
    NumpadOff,
    DialOn,
    DialOff,
}

impl BusCommand {
    /// Raw bytes written to the controller
    pub fn encode(self) -> Vec<u8> {
        let value = match self {
            BusCommand::NumpadOn(level) => level.value(),
            BusCommand::NumpadOff | BusCommand::DialOff => BUS_VALUE_OFF,
            BusCommand::DialOn => BUS_VALUE_DIAL_ON,
        };
        let mut bytes = BUS_COMMAND_PREFIX.to_vec();
        bytes.push(value);
        bytes.push(BUS_COMMAND_SUFFIX);
        bytes
    }
}

impl fmt::Display for BusCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusCommand::NumpadOn(level) => write!(f, "numpad-on({:?})", level),
            BusCommand::NumpadOff => write!(f, "numpad-off"),
            BusCommand::DialOn => write!(f, "dial-on"),
            BusCommand::DialOff => write!(f, "dial-off"),
        }
    }
}

/// Sends controller commands to the bus resolved at discovery time
pub trait BusCommandSender {
    fn send(&mut self, command: BusCommand) -> Result<(), NumpadError>;
}

/// Sender that runs `i2ctransfer -f -y <bus> w<len>@<addr> <bytes...>`
pub struct I2cTransfer {
    program: String,
    bus: u32,
    address: u8,
}

impl I2cTransfer {
    pub fn new(program: &str, bus: u32, address: u8) -> Self {
        Self {
            program: program.to_string(),
            bus,
            address,
        }
    }

    /// Argument list for one command
    pub fn args(&self, command: BusCommand) -> Vec<String> {
        let bytes = command.encode();
        let mut args = vec![
            "-f".to_string(),
            "-y".to_string(),
            self.bus.to_string(),
            format!("w{}@0x{:02x}", bytes.len(), self.address),
        ];
        args.extend(bytes.iter().map(|b| format!("0x{:02x}", b)));
        args
    }
}

impl BusCommandSender for I2cTransfer {
    fn send(&mut self, command: BusCommand) -> Result<(), NumpadError> {
        let args = self.args(command);
        debug!("bus: {} {}", self.program, args.join(" "));

        let failed = |reason: String| NumpadError::BusCommandFailed {
            command: command.to_string(),
            reason,
        };

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| failed(format!("cannot run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{} ({})", output.status, stderr.trim())));
        }
        Ok(())
    }
}

/// Sender used when bus control is disabled in the config
pub struct NoBus;

impl BusCommandSender for NoBus {
    fn send(&mut self, command: BusCommand) -> Result<(), NumpadError> {
        debug!("bus disabled, skipping {}", command);
        Ok(())
    }
}
