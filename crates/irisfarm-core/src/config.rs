//! IrisFarm configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FarmError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FarmConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub farm: FarmTarget,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl FarmConfig {
    /// Load config from the default path (~/.irisfarm/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FarmError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FarmError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| FarmError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Reject configs that cannot possibly farm.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(FarmError::Config(
                "telegram.bot_token is not set".into(),
            ));
        }
        if self.farm.group_id == 0 {
            return Err(FarmError::Config("farm.group_id is not set".into()));
        }
        if self.farm.command.is_empty() {
            return Err(FarmError::Config("farm.command is empty".into()));
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".irisfarm")
            .join("config.toml")
    }

    /// Get the IrisFarm home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".irisfarm")
    }
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_poll_interval() -> u64 {
    1
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Who to farm with, and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmTarget {
    /// Username of the Iris bot account whose replies we act on.
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
    /// Numeric id of the Iris account, when known up front.
    #[serde(default)]
    pub bot_id: Option<i64>,
    /// Target group chat id.
    #[serde(default)]
    pub group_id: i64,
    /// The fixed command sent on every attempt.
    #[serde(default = "default_command")]
    pub command: String,
}

fn default_bot_username() -> String {
    "iris_cm_bot".into()
}
fn default_command() -> String {
    "Фарма".into()
}

impl Default for FarmTarget {
    fn default() -> Self {
        Self {
            bot_username: default_bot_username(),
            bot_id: None,
            group_id: 0,
            command: default_command(),
        }
    }
}

/// Scheduling intervals. Static for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Hours until the next attempt after a successful farm.
    #[serde(default = "default_normal_hours")]
    pub normal_interval_hours: i64,
    /// Minutes until the next attempt after a soft failure or send error.
    #[serde(default = "default_retry_mins")]
    pub retry_interval_mins: i64,
    /// Seconds between schedule checks in the farm loop.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Extra seconds added on top of a flood-control wait.
    #[serde(default = "default_flood_buffer")]
    pub flood_buffer_secs: i64,
}

fn default_normal_hours() -> i64 {
    4
}
fn default_retry_mins() -> i64 {
    2
}
fn default_tick_secs() -> u64 {
    10
}
fn default_flood_buffer() -> i64 {
    10
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            normal_interval_hours: default_normal_hours(),
            retry_interval_mins: default_retry_mins(),
            tick_secs: default_tick_secs(),
            flood_buffer_secs: default_flood_buffer(),
        }
    }
}
