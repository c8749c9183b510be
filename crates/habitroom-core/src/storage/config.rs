//! TOML-based application configuration.
//!
//! Stores:
//! - The civil timezone every date is resolved in
//! - Streak walk horizon and the store lookback window
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::calendar::{CivilCalendar, DEFAULT_TIMEZONE};
use crate::error::ConfigError;
use crate::habits::streak::{StreakEngine, DEFAULT_HORIZON_DAYS};

/// Streak computation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Maximum calendar days a backward walk may cover
    #[serde(default = "default_days")]
    pub horizon_days: u32,
    /// How far back log entries and skip days are read from the store
    #[serde(default = "default_days")]
    pub lookback_days: u32,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// IANA timezone name
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub streaks: StreakConfig,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.into()
}
fn default_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_days(),
            lookback_days: default_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            streaks: StreakConfig::default(),
        }
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
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            }
        }
        let obj = parent
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(leaf)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(ConfigError::UnknownKey(key.to_string()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed or is invalid,
    /// or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    /// Same as [`load`](Self::load).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Check the timezone name and streak windows. The lookback window must
    /// cover the whole horizon, or walks would read unfetched days as misses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        CivilCalendar::from_name(&self.timezone)?;
        if self.streaks.horizon_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "streaks.horizon_days".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.streaks.lookback_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "streaks.lookback_days".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.streaks.lookback_days < self.streaks.horizon_days {
            return Err(ConfigError::InvalidValue {
                key: "streaks.lookback_days".into(),
                message: format!(
                    "must be at least streaks.horizon_days ({})",
                    self.streaks.horizon_days
                ),
            });
        }
        Ok(())
    }

    pub fn calendar(&self) -> Result<CivilCalendar, ConfigError> {
        CivilCalendar::from_name(&self.timezone)
    }

    pub fn streak_engine(&self) -> Result<StreakEngine, ConfigError> {
        Ok(StreakEngine::new(self.calendar()?, self.streaks.horizon_days))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. The change is validated but not saved.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
