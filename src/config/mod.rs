//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/asus-numpad/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::bus::Brightness;
use crate::constants::{
    DEFAULT_DIAL_RADIUS, DEFAULT_DIAL_STEP_DEGREES, DEFAULT_DIAL_X, DEFAULT_DIAL_Y,
    DEFAULT_POLL_INTERVAL_MS, NUMPAD_I2C_ADDRESS,
};
use crate::error::NumpadError;
use crate::input::KeyCode;
use crate::interpreter::dial::DialPivot;
use crate::interpreter::{DialAction, InterpreterSettings, Mode};
use crate::layout::DEFAULT_MODEL;

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Numpad model (built-in name or one of `layouts`)
    pub model: String,
    /// Key sent with Shift for the percent slot: evdev code ("6") or name ("KEY_APOSTROPHE")
    pub percentage_key: String,
    /// Mode cycle advanced by the top-right corner; the first entry is active at startup
    pub modes: Vec<Mode>,
    /// Backlight level when the numpad is first switched on
    pub brightness: Brightness,
    /// Dial settings
    pub dial: DialConfig,
    /// Touchpad controller settings
    pub bus: BusConfig,
    /// Event loop settings
    pub poll: PollConfig,
    /// Extra model layouts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub layouts: Vec<LayoutConfig>,
}

/// Dial settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialConfig {
    /// Pivot X in touchpad coordinates
    pub x: i32,
    /// Pivot Y in touchpad coordinates
    pub y: i32,
    /// Dial face radius
    pub radius: i32,
    /// "none" (log rotation only) or "volume"
    pub action: DialAction,
    /// Degrees of rotation per action step
    pub step_degrees: f64,
}

/// Touchpad controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Send backlight / dial commands at all
    pub enabled: bool,
    /// i2c-tools transfer program
    pub program: String,
    /// Controller address on the touchpad's i2c bus
    pub address: u8,
}

/// Event loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Pause between polling cycles in milliseconds
    pub interval_ms: u64,
}

/// Custom model layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Name used on the command line / in `model`
    pub model: String,
    /// Reserved band above the first row, in row heights
    pub top_offset: f64,
    /// Key names, one inner list per row ("KEY_5" is the percent slot)
    pub keys: Vec<Vec<String>>,
    /// Device search attempts
    pub try_times: u32,
    /// Pause between device searches in milliseconds
    pub try_sleep_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            percentage_key: "KEY_5".to_string(),
            modes: vec![Mode::Disabled, Mode::Numpad, Mode::Dial],
            brightness: Brightness::Full,
            dial: DialConfig::default(),
            bus: BusConfig::default(),
            poll: PollConfig::default(),
            layouts: Vec::new(),
        }
    }
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            x: DEFAULT_DIAL_X,
            y: DEFAULT_DIAL_Y,
            radius: DEFAULT_DIAL_RADIUS,
            action: DialAction::None,
            step_degrees: DEFAULT_DIAL_STEP_DEGREES,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "i2ctransfer".to_string(),
            address: NUMPAD_I2C_ADDRESS,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            top_offset: 0.0,
            keys: Vec::new(),
            try_times: 5,
            try_sleep_ms: 100,
        }
    }
}

impl Config {
    /// System config file path
    pub const SYSTEM_CONFIG_PATH: &'static str = "/etc/asus-numpad/config.toml";

    /// Environment variable overriding the config path
    pub const CONFIG_ENV: &'static str = "ASUS_NUMPAD_CONFIG";

    /// Get config file path (for display)
    pub fn config_path() -> Option<PathBuf> {
        // 1. ASUS_NUMPAD_CONFIG environment variable
        if let Ok(path) = std::env::var(Self::CONFIG_ENV) {
            let p = std::path::Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/asus-numpad/config.toml
        if let Some(path) = user_config_path() {
            if path.exists() {
                return Some(path);
            }
        }

        // 3. System config: /etc/asus-numpad/config.toml
        let system_config = std::path::Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. ASUS_NUMPAD_CONFIG environment variable
    /// 2. ~/.config/asus-numpad/config.toml (user config)
    /// 3. /etc/asus-numpad/config.toml (system config)
    /// 4. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(path.to_string_lossy().as_ref()) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolved percentage key
    pub fn percentage_key_code(&self) -> Result<KeyCode, NumpadError> {
        KeyCode::parse(&self.percentage_key)
            .ok_or_else(|| NumpadError::UnknownKey(self.percentage_key.clone()))
    }

    /// Settings handed to the interpreter
    pub fn interpreter_settings(&self) -> Result<InterpreterSettings> {
        if self.modes.is_empty() {
            anyhow::bail!("modes must list at least one mode");
        }
        if self.dial.step_degrees.is_nan() || self.dial.step_degrees <= 0.0 {
            anyhow::bail!("dial.step_degrees must be positive");
        }
        Ok(InterpreterSettings {
            modes: self.modes.clone(),
            percentage_key: self.percentage_key_code()?,
            pivot: DialPivot {
                x: self.dial.x,
                y: self.dial.y,
                radius: self.dial.radius,
            },
            dial_action: self.dial.action,
            dial_step: self.dial.step_degrees.to_radians(),
            brightness: self.brightness,
        })
    }

    /// Write the default config as a template
    ///
    /// `system` writes to /etc/asus-numpad/config.toml instead of the user config.
    /// An existing file is only replaced with `force`.
    pub fn write_default(system: bool, force: bool) -> Result<PathBuf> {
        let config_path = Self::template_path(system)?;
        if config_path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            );
        }
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let content = Self::template()?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(config_path)
    }

    /// Get config file path for a template (without writing)
    pub fn template_path(system: bool) -> Result<PathBuf> {
        if system {
            Ok(PathBuf::from(Self::SYSTEM_CONFIG_PATH))
        } else {
            user_config_path().ok_or_else(|| anyhow::anyhow!("Config directory not found"))
        }
    }

    /// Default settings plus a commented custom layout example
    fn template() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())?;
        Ok(format!(
            "# asus-numpad configuration\n\
             # modes: disabled, numpad, dial (first entry is active at startup)\n\
             # dial.action: none, volume\n\n\
             {}\n\
             # Custom model (select with model = \"my-model\"):\n\
             # [[layouts]]\n\
             # model = \"my-model\"\n\
             # top_offset = 0.3\n\
             # keys = [\n\
             #     [\"KP7\", \"KP8\", \"KP9\", \"KPSLASH\"],\n\
             #     [\"KP4\", \"KP5\", \"KP6\", \"KPASTERISK\"],\n\
             #     [\"KP1\", \"KP2\", \"KP3\", \"KPMINUS\"],\n\
             #     [\"KP0\", \"KPDOT\", \"KPENTER\", \"KPPLUS\"],\n\
             # ]\n",
            body
        ))
    }
}

/// Default user config path
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("asus-numpad").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keycodes::{KEY_5, KEY_APOSTROPHE};

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::from_toml(
            r#"
model = "ux581l"
modes = ["numpad", "disabled"]

[dial]
action = "volume"
"#,
        )
        .unwrap();
        assert_eq!(config.model, "ux581l");
        assert_eq!(config.modes, vec![Mode::Numpad, Mode::Disabled]);
        assert_eq!(config.dial.action, DialAction::Volume);
        assert_eq!(config.dial.x, DEFAULT_DIAL_X);
        assert_eq!(config.bus, BusConfig::default());
        assert_eq!(config.poll.interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_custom_layout_section() {
        let config = Config::from_toml(
            r#"
model = "mine"

[[layouts]]
model = "mine"
keys = [["KP1", "KP2"], ["KP3", "KEY_5"]]
"#,
        )
        .unwrap();
        assert_eq!(config.layouts.len(), 1);
        assert_eq!(config.layouts[0].try_times, 5);
        let layout = crate::layout::resolve(&config.model, &config.layouts).unwrap();
        assert_eq!((layout.rows, layout.cols), (2, 2));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Config::from_toml(r#"modes = ["numpad", "mouse"]"#).is_err());
    }

    #[test]
    fn test_percentage_key_forms() {
        let mut config = Config::default();
        assert_eq!(config.percentage_key_code().unwrap(), KEY_5);
        config.percentage_key = "40".to_string();
        assert_eq!(config.percentage_key_code().unwrap(), KEY_APOSTROPHE);
        config.percentage_key = "percent".to_string();
        assert!(matches!(
            config.percentage_key_code(),
            Err(NumpadError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_interpreter_settings() {
        let settings = Config::default().interpreter_settings().unwrap();
        assert_eq!(settings.modes[0], Mode::Disabled);
        assert_eq!(settings.pivot.radius, DEFAULT_DIAL_RADIUS);
        assert!((settings.dial_step - DEFAULT_DIAL_STEP_DEGREES.to_radians()).abs() < 1e-12);

        let config = Config {
            modes: Vec::new(),
            ..Config::default()
        };
        assert!(config.interpreter_settings().is_err());
    }

    #[test]
    fn test_template_parses_back_to_default() {
        let template = Config::template().unwrap();
        assert_eq!(Config::from_toml(&template).unwrap(), Config::default());
    }
}
