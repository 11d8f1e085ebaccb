//! Scheduler tuning and on-disk locations.
//!
//! Every scheduling constant lives in [`SchedulerConfig`] so it can be tuned
//! from a `config.toml` without touching the algorithm:
//!
//! ```toml
//! [scheduler]
//! default_ease = 2.5
//! min_ease = 1.3
//! hard_interval_multiplier = 0.8
//! ```
//!
//! Missing keys fall back to their defaults and a missing file means
//! "all defaults".

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SrsError;

pub const APP_DIR: &str = "prepdeck";
pub const DEFAULT_DB_NAME: &str = "prepdeck.db";
pub const DEFAULT_JSON_NAME: &str = "cards.json";
pub const DEFAULT_CONFIG_NAME: &str = "config.toml";

pub const DB_ENV: &str = "PREPDECK_DB";
pub const JSON_ENV: &str = "PREPDECK_JSON";
pub const CONFIG_ENV: &str = "PREPDECK_CONFIG";

/// Upper bound accepted for `max_interval_days`. Keeps every due date inside
/// the four-digit years an RFC 3339 timestamp can hold.
pub const INTERVAL_DAYS_LIMIT: u32 = 365_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub default_ease: f64,
    pub min_ease: f64,
    pub again_ease_delta: f64,
    pub hard_ease_delta: f64,
    pub good_ease_delta: f64,
    pub easy_ease_delta: f64,
    pub relearn_interval_days: u32,
    pub first_interval_days: u32,
    pub second_interval_days: u32,
    pub hard_interval_multiplier: f64,
    pub easy_interval_multiplier: f64,
    pub max_interval_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_ease: 2.5,
            min_ease: 1.3,
            again_ease_delta: -0.3,
            hard_ease_delta: -0.15,
            good_ease_delta: 0.0,
            easy_ease_delta: 0.15,
            relearn_interval_days: 0,
            first_interval_days: 1,
            second_interval_days: 6,
            hard_interval_multiplier: 0.8,
            easy_interval_multiplier: 1.3,
            max_interval_days: 36_500,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SrsError> {
        let finite = [
            self.default_ease,
            self.min_ease,
            self.again_ease_delta,
            self.hard_ease_delta,
            self.good_ease_delta,
            self.easy_ease_delta,
            self.hard_interval_multiplier,
            self.easy_interval_multiplier,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(SrsError::InvalidConfig(
                "values must be finite numbers".to_string(),
            ));
        }
        if self.min_ease <= 0.0 {
            return Err(SrsError::InvalidConfig(format!(
                "min_ease must be positive, got {}",
                self.min_ease
            )));
        }
        if self.default_ease < self.min_ease {
            return Err(SrsError::InvalidConfig(format!(
                "default_ease {} is below min_ease {}",
                self.default_ease, self.min_ease
            )));
        }
        if self.hard_interval_multiplier <= 0.0 || self.easy_interval_multiplier <= 0.0 {
            return Err(SrsError::InvalidConfig(
                "interval multipliers must be positive".to_string(),
            ));
        }
        if self.first_interval_days == 0 {
            return Err(SrsError::InvalidConfig(
                "first_interval_days must be at least 1".to_string(),
            ));
        }
        if self.max_interval_days > INTERVAL_DAYS_LIMIT {
            return Err(SrsError::InvalidConfig(format!(
                "max_interval_days must be at most {}, got {}",
                INTERVAL_DAYS_LIMIT, self.max_interval_days
            )));
        }
        if self.first_interval_days > self.max_interval_days
            || self.relearn_interval_days > self.max_interval_days
        {
            return Err(SrsError::InvalidConfig(format!(
                "max_interval_days {} is below the first or relearn interval",
                self.max_interval_days
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    scheduler: Option<SchedulerConfig>,
}

/// Reads `[scheduler]` from a TOML file. A missing file yields the defaults.
pub fn load_scheduler_config(path: &Path) -> Result<SchedulerConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(SchedulerConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let file: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Loaded scheduler config from {}", path.display());
    Ok(file.scheduler.unwrap_or_default())
}

fn app_dir() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("Could not create {}: {}", dir.display(), e);
    }
    dir
}

fn path_from_env_or(var: &str, file_name: &str) -> PathBuf {
    if let Ok(path) = std::env::var(var) {
        return PathBuf::from(path);
    }
    app_dir().join(file_name)
}

pub fn db_path() -> PathBuf {
    path_from_env_or(DB_ENV, DEFAULT_DB_NAME)
}

pub fn json_path() -> PathBuf {
    path_from_env_or(JSON_ENV, DEFAULT_JSON_NAME)
}

pub fn config_path() -> PathBuf {
    path_from_env_or(CONFIG_ENV, DEFAULT_CONFIG_NAME)
}
