//! TOML-based application configuration.
//!
//! Stores:
//! - Reward policy (word threshold, bonus sizes, milestones)
//! - Clock settings (local time or a fixed UTC offset)
//! - Toast notification preferences
//!
//! Configuration is stored at `~/.config/calmspace/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::rewards::{ActivityKind, MilestoneSet, RewardPolicy};

/// Reward policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_journal_min_words")]
    pub journal_min_words: u32,
    #[serde(default = "default_journal_first_bonus")]
    pub journal_first_bonus: u64,
    #[serde(default = "default_journal_repeat_bonus")]
    pub journal_repeat_bonus: u64,
    #[serde(default = "default_game_first_bonus")]
    pub game_first_bonus: u64,
    #[serde(default = "default_game_repeat_bonus")]
    pub game_repeat_bonus: u64,
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u64>,
    /// How far past a threshold the total may be and still count as "just crossed".
    #[serde(default = "default_milestone_window")]
    pub milestone_window: u64,
}

/// Clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClockConfig {
    /// Fixed offset from UTC in minutes. When unset the system local time zone is used.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Toast notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/calmspace/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_journal_min_words() -> u32 {
    20
}
fn default_journal_first_bonus() -> u64 {
    10
}
fn default_journal_repeat_bonus() -> u64 {
    5
}
fn default_game_first_bonus() -> u64 {
    5
}
fn default_game_repeat_bonus() -> u64 {
    2
}
fn default_milestones() -> Vec<u64> {
    vec![75, 500, 1000, 1750]
}
fn default_milestone_window() -> u64 {
    20
}
fn default_true() -> bool {
    true
}
fn default_toast_duration_ms() -> u64 {
    2500
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            journal_min_words: default_journal_min_words(),
            journal_first_bonus: default_journal_first_bonus(),
            journal_repeat_bonus: default_journal_repeat_bonus(),
            game_first_bonus: default_game_first_bonus(),
            game_repeat_bonus: default_game_repeat_bonus(),
            milestones: default_milestones(),
            milestone_window: default_milestone_window(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            toast_duration_ms: default_toast_duration_ms(),
        }
    }
}

impl RewardsConfig {
    /// Bonus policy for one activity kind.
    pub fn policy(&self, kind: ActivityKind) -> RewardPolicy {
        match kind {
            ActivityKind::Journal => RewardPolicy {
                first_bonus: self.journal_first_bonus,
                repeat_bonus: self.journal_repeat_bonus,
            },
            ActivityKind::Game => RewardPolicy {
                first_bonus: self.game_first_bonus,
                repeat_bonus: self.game_repeat_bonus,
            },
        }
    }

    pub fn milestone_set(&self) -> MilestoneSet {
        MilestoneSet::new(self.milestones.clone(), self.milestone_window)
    }

    /// Reject policies where a repeat pays more than the daily bonus or no
    /// milestone can ever be reached.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.milestones.is_empty() {
            return Err(ValidationError::EmptyCollection("rewards.milestones".into()));
        }
        if self.milestone_window == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rewards.milestone_window".into(),
                message: "must be at least 1".into(),
            });
        }
        for kind in ActivityKind::ALL {
            let policy = self.policy(kind);
            if policy.repeat_bonus > policy.first_bonus {
                return Err(ValidationError::InvalidValue {
                    field: format!("rewards.{kind}_repeat_bonus"),
                    message: format!(
                        "repeat bonus {} exceeds first bonus {}",
                        policy.repeat_bonus, policy.first_bonus
                    ),
                });
            }
        }
        Ok(())
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
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    _ if value == "none" => serde_json::Value::Null,
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as integer")));
                        }
                    }
                    // Optional numbers serialize as null until they are first set.
                    serde_json::Value::Null => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
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

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.rewards.validate()?;
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
            }
            .into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.rewards.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }
}
