//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timezone and week start used for every date computation
//! - Timer limits and polling cadences
//! - Sort/filter choices of the habit list
//!
//! Configuration is stored at `~/.config/habitloom/config.toml`.
//! Missing or unreadable files yield defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::dates::{resolve_zone, WeekStart, ZoneResolution};
use crate::error::ConfigError;

/// Calendar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// IANA timezone name; empty means the system timezone.
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub week_start: WeekStart,
}

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Hard ceiling of a single timer session.
    #[serde(default = "default_max_session_minutes")]
    pub max_session_minutes: u64,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_rollover_check_secs")]
    pub rollover_check_secs: u64,
}

/// Habit list presentation choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_true")]
    pub show_completed: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habitloom/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_max_session_minutes() -> u64 {
    120
}
fn default_tick_interval_secs() -> u64 {
    1
}
fn default_rollover_check_secs() -> u64 {
    60
}
fn default_sort_by() -> String {
    "manual".into()
}
fn default_filter() -> String {
    "all".into()
}
fn default_true() -> bool {
    true
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: String::new(),
            week_start: WeekStart::Monday,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            max_session_minutes: default_max_session_minutes(),
            tick_interval_secs: default_tick_interval_secs(),
            rollover_check_secs: default_rollover_check_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sort_by: default_sort_by(),
            filter: default_filter(),
            show_completed: true,
        }
    }
}

impl TimerConfig {
    pub fn max_session_secs(&self) -> u64 {
        self.max_session_minutes.saturating_mul(60)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Option<PathBuf> {
        match data_dir() {
            Ok(dir) => Some(dir.join("config.toml")),
            Err(e) => {
                log::warn!("config directory unavailable: {e}");
                None
            }
        }
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`. A missing file yields defaults; an unparsable one
    /// is logged and replaced by defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                log::warn!("ignoring unparsable config at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::SaveFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })?;
        self.save_to(&path)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit
    /// the setting's type.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Update a value and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    pub fn zone(&self) -> ZoneResolution {
        resolve_zone(&self.calendar.timezone)
    }
}
