//! # State Module
//!
//! Startup state for the register: configuration only. The database handle
//! is owned by the dispatcher.

mod config;

pub use config::{
    AppConfig, ConfigError, DatabaseSettings, LoggingSettings, RegisterSettings,
    DEFAULT_LOG_FILTER,
};
