//! # Register Configuration
//!
//! Configuration loaded once at startup.
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file (`kasir.toml`)
//!    - `~/.config/kasir/kasir.toml` (Linux)
//!    - `~/Library/Application Support/id.kasir.register/kasir.toml` (macOS)
//!    - or the path in `KASIR_CONFIG`
//! 3. Environment variables (`KASIR_*`)
//!
//! ## Example Config File
//! ```toml
//! [database]
//! path = "/var/lib/kasir/kasir.db"
//! max_connections = 5
//! busy_timeout_secs = 30
//!
//! [logging]
//! filter = "info,kasir=debug,sqlx=warn"
//!
//! [register]
//! queue_capacity = 64
//! ```
//!
//! Read-only after load, so no locking needed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use kasir_db::DbConfig;

/// Default tracing filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,kasir=debug,sqlx=warn";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine app data directory")]
    NoDataDir,
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; the platform data directory when unset.
    pub path: Option<PathBuf>,

    /// Default: 5
    pub max_connections: u32,

    /// How long a unit waits for another unit's lock.
    /// Default: 30
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
            busy_timeout_secs: 30,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive string. `RUST_LOG` still wins when set.
    pub filter: Option<String>,
}

/// Request channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterSettings {
    /// Requests buffered before senders wait.
    /// Default: 64
    pub queue_capacity: usize,
}

impl Default for RegisterSettings {
    fn default() -> Self {
        RegisterSettings { queue_capacity: 64 }
    }
}

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub register: RegisterSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing config file is not an error; an unreadable or malformed one
    /// is.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .or_else(|| std::env::var_os("KASIR_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `KASIR_*` overrides read through `lookup`.
    ///
    /// ## Variables
    /// - `KASIR_DB_PATH`: database file
    /// - `KASIR_MAX_CONNECTIONS`: pool size
    /// - `KASIR_BUSY_TIMEOUT_SECS`: lock wait
    /// - `KASIR_LOG`: tracing filter
    ///
    /// Unparseable numbers are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("KASIR_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("KASIR_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.database.max_connections = max;
        }

        if let Some(secs) = lookup("KASIR_BUSY_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.database.busy_timeout_secs = secs;
        }

        if let Some(filter) = lookup("KASIR_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.register.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "register.queue_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Tracing filter to use when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &str {
        self.logging.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Builds the pool configuration.
    ///
    /// Without an explicit path, the database lives in the platform data
    /// directory, which is created if needed.
    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        let path = match &self.database.path {
            Some(path) => path.clone(),
            None => {
                let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
                let data_dir = dirs.data_dir();
                std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Read {
                    path: data_dir.to_path_buf(),
                    source,
                })?;
                data_dir.join("kasir.db")
            }
        };

        Ok(DbConfig::new(path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs)))
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("kasir.toml"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("id", "kasir", "register")
}

// =============================================================================
// Unit Tests
// =============================================================================
