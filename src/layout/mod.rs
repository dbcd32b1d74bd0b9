//! Numpad layouts
//!
//! Per-model grid geometry and key assignments, resolved once at startup
//! from the built-in registry or from `[[layouts]]` in the config file.

use std::time::Duration;

use crate::config::LayoutConfig;
use crate::error::NumpadError;
use crate::input::keycodes::*;
use crate::input::KeyCode;

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "m433ia";

/// Numpad grid painted on the touchpad
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Model identifier
    pub model: String,
    pub rows: usize,
    pub cols: usize,
    /// Reserved band above the first row, as a fraction of a row height
    pub top_offset: f64,
    /// `rows` x `cols` key grid
    pub keys: Vec<Vec<KeyCode>>,
    /// How many times to scan for devices before giving up
    pub device_search_attempts: u32,
    /// Pause between device scans
    pub device_search_interval: Duration,
}

impl Layout {
    /// Build a layout, checking that the grid matches its dimensions
    pub fn new(
        model: &str,
        top_offset: f64,
        keys: Vec<Vec<KeyCode>>,
        device_search_attempts: u32,
        device_search_interval: Duration,
    ) -> Result<Self, NumpadError> {
        let invalid = |reason: String| NumpadError::InvalidLayout {
            model: model.to_string(),
            reason,
        };

        let rows = keys.len();
        let cols = keys.first().map(|r| r.len()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(invalid("key grid is empty".to_string()));
        }
        if let Some((i, row)) = keys.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(invalid(format!(
                "row {} has {} keys, expected {}",
                i,
                row.len(),
                cols
            )));
        }
        if device_search_attempts == 0 {
            return Err(invalid("device_search_attempts must be at least 1".to_string()));
        }
        if !top_offset.is_finite() {
            return Err(invalid("top_offset must be a finite number".to_string()));
        }

        Ok(Self {
            model: model.to_string(),
            rows,
            cols,
            top_offset,
            keys,
            device_search_attempts,
            device_search_interval,
        })
    }

    /// Key at (row, col), or None outside the grid
    pub fn key_at(&self, row: i64, col: i64) -> Option<KeyCode> {
        if row < 0 || col < 0 {
            return None;
        }
        self.keys
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
    }

    /// Every distinct key in the grid
    pub fn all_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys.iter().flatten().copied()
    }

    /// Build from a config-file definition
    pub fn from_config(cfg: &LayoutConfig) -> Result<Self, NumpadError> {
        let keys = cfg
            .keys
            .iter()
            .map(|row| {
                row.iter()
                    .map(|name| {
                        KeyCode::from_name(name).ok_or_else(|| NumpadError::UnknownKey(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(
            &cfg.model,
            cfg.top_offset,
            keys,
            cfg.try_times,
            Duration::from_millis(cfg.try_sleep_ms),
        )
    }
}

/// Search tuning shared by the built-in models
const BUILTIN_ATTEMPTS: u32 = 5;
const BUILTIN_INTERVAL: Duration = Duration::from_millis(100);

/// Names of the built-in models
pub const BUILTIN_MODELS: &[&str] = &["ux433fa", "m433ia", "ux581l", "gx701"];

fn builtin(model: &str) -> Option<(f64, Vec<Vec<KeyCode>>)> {
    let layout = match model {
        "ux433fa" => (
            0.0,
            vec![
                vec![KEY_KP7, KEY_KP8, KEY_KP9, KEY_KPSLASH, KEY_BACKSPACE],
                vec![KEY_KP4, KEY_KP5, KEY_KP6, KEY_KPASTERISK, KEY_BACKSPACE],
                vec![KEY_KP1, KEY_KP2, KEY_KP3, KEY_KPMINUS, KEY_KPENTER],
                vec![KEY_KP0, KEY_KP0, KEY_KPDOT, KEY_KPPLUS, KEY_KPENTER],
            ],
        ),
        // KEY_5 marks the percent slot, replaced by the configured percentage key
        "m433ia" => (
            0.3,
            vec![
                vec![KEY_KP7, KEY_KP8, KEY_KP9, KEY_KPSLASH, KEY_BACKSPACE],
                vec![KEY_KP4, KEY_KP5, KEY_KP6, KEY_KPASTERISK, KEY_BACKSPACE],
                vec![KEY_KP1, KEY_KP2, KEY_KP3, KEY_KPMINUS, KEY_5],
                vec![KEY_KP0, KEY_KPDOT, KEY_KPENTER, KEY_KPPLUS, KEY_KPEQUAL],
            ],
        ),
        "ux581l" => (
            0.3,
            vec![
                vec![KEY_KPLEFTPAREN, KEY_KPRIGHTPAREN, KEY_5, KEY_BACKSPACE],
                vec![KEY_KP7, KEY_KP8, KEY_KP9, KEY_KPSLASH],
                vec![KEY_KP4, KEY_KP5, KEY_KP6, KEY_KPASTERISK],
                vec![KEY_KP1, KEY_KP2, KEY_KP3, KEY_KPMINUS],
                vec![KEY_KP0, KEY_KPDOT, KEY_KPENTER, KEY_KPPLUS],
            ],
        ),
        "gx701" => (
            0.0,
            vec![
                vec![KEY_KP7, KEY_KP8, KEY_KP9, KEY_KPSLASH],
                vec![KEY_KP4, KEY_KP5, KEY_KP6, KEY_KPASTERISK],
                vec![KEY_KP1, KEY_KP2, KEY_KP3, KEY_KPMINUS],
                vec![KEY_KP0, KEY_KPDOT, KEY_KPENTER, KEY_KPPLUS],
            ],
        ),
        _ => return None,
    };
    Some(layout)
}

/// Resolve a model name. Config-defined layouts shadow built-in ones.
pub fn resolve(model: &str, custom: &[LayoutConfig]) -> Result<Layout, NumpadError> {
    if let Some(cfg) = custom.iter().find(|c| c.model == model) {
        return Layout::from_config(cfg);
    }
    let (top_offset, keys) =
        builtin(model).ok_or_else(|| NumpadError::UnknownModel(model.to_string()))?;
    Layout::new(model, top_offset, keys, BUILTIN_ATTEMPTS, BUILTIN_INTERVAL)
}

/// Built-in plus config-defined model names, for --list-models
pub fn available_models(custom: &[LayoutConfig]) -> Vec<String> {
    let mut models: Vec<String> = BUILTIN_MODELS.iter().map(|m| m.to_string()).collect();
    for cfg in custom {
        if !models.contains(&cfg.model) {
            models.push(cfg.model.clone());
        }
    }
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_models_are_valid() {
        for model in BUILTIN_MODELS {
            let layout = resolve(model, &[]).unwrap();
            assert_eq!(layout.keys.len(), layout.rows);
            assert!(layout.keys.iter().all(|r| r.len() == layout.cols));
        }
    }

    #[test]
    fn test_unknown_model() {
        assert!(matches!(
            resolve("x999", &[]),
            Err(NumpadError::UnknownModel(m)) if m == "x999"
        ));
    }

    #[test]
    fn test_key_at_bounds() {
        let layout = resolve("ux433fa", &[]).unwrap();
        assert_eq!(layout.key_at(0, 0), Some(KEY_KP7));
        assert_eq!(layout.key_at(3, 4), Some(KEY_KPENTER));
        assert_eq!(layout.key_at(-1, 0), None);
        assert_eq!(layout.key_at(0, -1), None);
        assert_eq!(layout.key_at(4, 0), None);
        assert_eq!(layout.key_at(0, 5), None);
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let err = Layout::new(
            "bad",
            0.0,
            vec![vec![KEY_KP1, KEY_KP2], vec![KEY_KP3]],
            1,
            Duration::ZERO,
        )
        .unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 keys"));
    }

    #[test]
    fn test_custom_layout_shadows_builtin() {
        let custom = LayoutConfig {
            model: "m433ia".to_string(),
            top_offset: 0.0,
            keys: vec![vec!["KP1".to_string(), "KEY_KP2".to_string()]],
            try_times: 3,
            try_sleep_ms: 50,
        };
        let layout = resolve("m433ia", std::slice::from_ref(&custom)).unwrap();
        assert_eq!((layout.rows, layout.cols), (1, 2));
        assert_eq!(layout.device_search_attempts, 3);
        assert_eq!(layout.device_search_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_custom_layout_unknown_key() {
        let custom = LayoutConfig {
            model: "mine".to_string(),
            top_offset: 0.0,
            keys: vec![vec!["KP1".to_string(), "SPARKLE".to_string()]],
            try_times: 3,
            try_sleep_ms: 50,
        };
        assert!(matches!(
            Layout::from_config(&custom),
            Err(NumpadError::UnknownKey(k)) if k == "SPARKLE"
        ));
    }

    #[test]
    fn test_available_models_includes_custom() {
        let custom = LayoutConfig {
            model: "mine".to_string(),
            ..LayoutConfig::default()
        };
        let models = available_models(&[custom]);
        assert!(models.contains(&"ux433fa".to_string()));
        assert!(models.contains(&"mine".to_string()));
    }
}
