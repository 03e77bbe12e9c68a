//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across the tickdev workspace.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tickdev_common::config::{ConfigLoader, TickdevConfig};
//! use std::path::Path;
//!
//! let config = TickdevConfig::load(Path::new("config.toml"))?;
//! println!("Service: {}", config.shared.service_name);
//! # Ok::<(), tickdev_common::config::ConfigError>(())
//! ```

use crate::consts::{JOB_BLOCKING_MS, TICK_PERIOD_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Common configuration fields shared across tickdev applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "tickdev-bench-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Timing overrides for the timer device.
///
/// The protocol fixes these at 1000 ms / 10 000 ms; the overrides exist so
/// integration tests and benches can run the full pipeline in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerTuning {
    /// Periodic ticker period [ms].
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Background-job blocking phase duration [ms].
    #[serde(default = "default_job_blocking_ms")]
    pub job_blocking_ms: u64,
}

fn default_tick_period_ms() -> u64 {
    TICK_PERIOD_MS
}

fn default_job_blocking_ms() -> u64 {
    JOB_BLOCKING_MS
}

impl Default for TimerTuning {
    fn default() -> Self {
        Self {
            tick_period_ms: TICK_PERIOD_MS,
            job_blocking_ms: JOB_BLOCKING_MS,
        }
    }
}

impl TimerTuning {
    /// Validate the tuning values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the ticker period is zero —
    /// a zero period would turn the ticker into a busy loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_period_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for the tickdev CLI.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "tickdev-main"
///
/// [timer]
/// tick_period_ms = 1000
/// job_blocking_ms = 10000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickdevConfig {
    /// Common fields (logging, service identity).
    pub shared: SharedConfig,

    /// Timer device tuning.
    #[serde(default)]
    pub timer: TimerTuning,
}

impl TickdevConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.timer.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Returns `ConfigError::ValidationError` if semantic validation fails
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
