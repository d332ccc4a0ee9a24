//! Configuration module for Dreamboard.

use serde::Deserialize;
use std::path::Path;

use crate::board::MAX_PAGE_SIZE;
use crate::{DreamboardError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Busy timeout in milliseconds while another connection holds the write lock.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> String {
    "data/dreamboard.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty logs to stdout only.
    #[serde(default = "default_log_file")]
    pub file: String,
    /// Let sqlx log every statement it runs.
    #[serde(default)]
    pub log_statements: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/dreamboard.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            log_statements: false,
        }
    }
}

/// Listing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
    /// Page size used when the caller does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    /// Largest page size a caller may request. At most `MAX_PAGE_SIZE`.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

fn default_page_size() -> i64 {
    20
}

fn default_max_page_size() -> i64 {
    100
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Listing configuration.
    #[serde(default)]
    pub paging: PagingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DreamboardError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DreamboardError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DREAMBOARD_DATABASE_PATH`: Override the database file path
    /// - `DREAMBOARD_LOG_LEVEL`: Override the log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DREAMBOARD_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(level) = std::env::var("DREAMBOARD_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The database path is empty
    /// - The pool has no connections
    /// - Page sizes are not positive, the default exceeds the maximum, or
    ///   the maximum exceeds `MAX_PAGE_SIZE`
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(DreamboardError::Config(
                "database.path must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(DreamboardError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.paging.default_page_size < 1 || self.paging.max_page_size < 1 {
            return Err(DreamboardError::Config(
                "paging sizes must be positive".to_string(),
            ));
        }
        if self.paging.max_page_size > MAX_PAGE_SIZE {
            return Err(DreamboardError::Config(format!(
                "paging.max_page_size ({}) exceeds the limit of {MAX_PAGE_SIZE}",
                self.paging.max_page_size
            )));
        }
        if self.paging.default_page_size > self.paging.max_page_size {
            return Err(DreamboardError::Config(format!(
                "paging.default_page_size ({}) exceeds paging.max_page_size ({})",
                self.paging.default_page_size, self.paging.max_page_size
            )));
        }
        Ok(())
    }
}
