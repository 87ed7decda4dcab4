//! # Unified Configuration System
//!
//! Configuration for the engine core. All types are serde-serializable so
//! applications can load them from TOML files alongside their own settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration for the dual-clock system scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fixed-clock tick rate in ticks per second
    pub fixed_update_rate: f32,

    /// Worker thread count for the variable-rate (normal) clock
    pub normal_worker_count: usize,

    /// Worker thread count for the fixed-rate clock
    pub fixed_worker_count: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_update_rate: 60.0,
            normal_worker_count: 2,
            fixed_worker_count: 2,
        }
    }
}

impl SchedulerConfig {
    /// Validate the configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_update_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_update_rate must be positive, got {}",
                self.fixed_update_rate
            )));
        }
        if self.normal_worker_count == 0 || self.fixed_worker_count == 0 {
            return Err(ConfigError::Invalid(
                "worker counts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scheduler configuration
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.scheduler.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse configuration contents
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed validation
    #[error("invalid config: {0}")]
    Invalid(String),
}
