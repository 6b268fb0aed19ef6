// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration shared by the factory and the releaser
//!
//! Layers, lowest to highest precedence: built-in defaults, an optional TOML
//! file (`--config` or `SEMGATE_CONFIG`), `SEMGATE_*` environment variables,
//! then command-line flags applied by each binary.

mod mode;

pub use mode::Mode;

use crate::semaphore::{CreateOptions, SemaphoreError, SemaphoreName, DEFAULT_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "SEMGATE_CONFIG";
pub const NAME_ENV: &str = "SEMGATE_NAME";
pub const MODE_ENV: &str = "SEMGATE_MODE";
pub const EXCLUSIVE_ENV: &str = "SEMGATE_EXCLUSIVE";
pub const WORK_DELAY_ENV: &str = "SEMGATE_WORK_DELAY";
pub const SHUTDOWN_GRACE_ENV: &str = "SEMGATE_SHUTDOWN_GRACE";
pub const LOG_ENV: &str = "SEMGATE_LOG";
pub const LOG_FILE_ENV: &str = "SEMGATE_LOG_FILE";

/// Simulated work per released unit
pub const DEFAULT_WORK_DELAY: Duration = Duration::from_secs(5);

/// How long the factory waits for workers to leave their loop on shutdown
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub semaphore: SemaphoreSettings,
    pub factory: FactorySettings,
    pub log: LogSettings,
}

/// The shared named semaphore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemaphoreSettings {
    /// Name both processes open; a missing leading '/' is added
    pub name: String,
    /// Permission bits used when the factory creates the object
    pub mode: Mode,
    /// Refuse to attach to a semaphore left behind by another factory
    pub exclusive: bool,
}

impl Default for SemaphoreSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            mode: Mode::default(),
            exclusive: false,
        }
    }
}

/// Factory-only knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactorySettings {
    #[serde(with = "humantime_serde")]
    pub work_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            work_delay: DEFAULT_WORK_DELAY,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set
    pub filter: String,
    /// Write logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load from `explicit`, else `SEMGATE_CONFIG`, else defaults; then apply the environment
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override settings from `SEMGATE_*` variables found through `lookup`
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(name) = lookup(NAME_ENV) {
            self.semaphore.name = name;
        }
        if let Some(mode) = lookup(MODE_ENV) {
            self.semaphore.mode = mode.parse()?;
        }
        if let Some(exclusive) = lookup(EXCLUSIVE_ENV) {
            self.semaphore.exclusive = parse_bool(EXCLUSIVE_ENV, &exclusive)?;
        }
        if let Some(delay) = lookup(WORK_DELAY_ENV) {
            self.factory.work_delay = parse_duration(WORK_DELAY_ENV, &delay)?;
        }
        if let Some(grace) = lookup(SHUTDOWN_GRACE_ENV) {
            self.factory.shutdown_grace = parse_duration(SHUTDOWN_GRACE_ENV, &grace)?;
        }
        if let Some(filter) = lookup(LOG_ENV) {
            self.log.filter = filter;
        }
        if let Some(file) = lookup(LOG_FILE_ENV) {
            self.log.file = (!file.is_empty()).then(|| PathBuf::from(file));
        }
        Ok(())
    }

    pub fn semaphore_name(&self) -> Result<SemaphoreName, SemaphoreError> {
        SemaphoreName::new(self.semaphore.name.as_str())
    }

    pub fn create_options(&self) -> CreateOptions {
        CreateOptions {
            mode: self.semaphore.mode.bits(),
            initial: 0,
            exclusive: self.semaphore.exclusive,
        }
    }
}

/// Parse a humantime duration such as `5s` or `250ms`
pub fn parse_duration(key: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests;
