//! Configuration for clinic-core

use std::path::Path;

use chrono::NaiveTime;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub database: DatabaseConfig,
    pub api_bind_address: String,
    pub queue: QueueConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a writer waits for the SQLite write lock
    pub busy_timeout_ms: u64,
}

/// Daily queue reset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Local wall-clock time of the daily reset, `HH:MM`
    pub reset_time: String,
    pub scheduler_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl ClinicConfig {
    /// Load configuration: built-in defaults, then an optional TOML file, then
    /// `CLINIC__SECTION__KEY` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        // Missing keys fall back to the Default impls through #[serde(default)]
        let config: ClinicConfig = builder
            .add_source(
                Environment::with_prefix("CLINIC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(Error::config("database.url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(Error::config("database.max_connections must be at least 1"));
        }
        self.queue.reset_time()?;
        Ok(())
    }
}

impl QueueConfig {
    /// Parsed reset time
    pub fn reset_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.reset_time.trim(), "%H:%M").map_err(|e| {
            Error::config(format!("invalid queue.reset_time '{}': {}", self.reset_time, e))
        })
    }
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            api_bind_address: "127.0.0.1:8080".to_string(),
            queue: QueueConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://clinic.db?mode=rwc".to_string(),
            max_connections: 8,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            reset_time: "00:00".to_string(),
            scheduler_enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
