//! # Configuration
//!
//! Application configuration loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKROOM_*`)
//! 2. Defaults (this file)
//!
//! | Variable                    | Default                       |
//! |-----------------------------|-------------------------------|
//! | `STOCKROOM_DB_PATH`         | `<data dir>/stockroom.db`     |
//! | `STOCKROOM_UTC_OFFSET`      | `+05:00`                      |
//! | `STOCKROOM_STORE_NAME`      | `Stockroom`                   |
//! | `STOCKROOM_CURRENCY_SYMBOL` | `₸`                           |
//! | `STOCKROOM_MAX_CONNECTIONS` | `5`                           |
//!
//! A malformed value is a [`ConfigError`], never a fallback to the default.

use chrono::{FixedOffset, Offset};
use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

use stockroom_core::validation::parse_utc_offset;
use stockroom_core::{ValidationError, DEFAULT_UTC_OFFSET_SECS};

/// Environment variable names.
pub const ENV_DB_PATH: &str = "STOCKROOM_DB_PATH";
pub const ENV_UTC_OFFSET: &str = "STOCKROOM_UTC_OFFSET";
pub const ENV_STORE_NAME: &str = "STOCKROOM_STORE_NAME";
pub const ENV_CURRENCY_SYMBOL: &str = "STOCKROOM_CURRENCY_SYMBOL";
pub const ENV_MAX_CONNECTIONS: &str = "STOCKROOM_MAX_CONNECTIONS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid UTC offset: {source}")]
    InvalidOffset {
        var: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("could not determine a data directory; set STOCKROOM_DB_PATH")]
    NoDataDir,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Business time zone. Decides which date an order completion
    /// belongs to.
    pub utc_offset: FixedOffset,

    /// Store name (display only)
    pub store_name: String,

    /// Currency symbol (display only)
    pub currency_symbol: String,

    /// Pool size.
    pub max_connections: u32,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match get(ENV_DB_PATH) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let utc_offset = match get(ENV_UTC_OFFSET) {
            Some(value) => parse_utc_offset(&value).map_err(|source| ConfigError::InvalidOffset {
                var: ENV_UTC_OFFSET,
                source,
            })?,
            None => default_offset(),
        };

        let max_connections = match get(ENV_MAX_CONNECTIONS) {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: ENV_MAX_CONNECTIONS,
                        value,
                    })
                }
            },
            None => 5,
        };

        Ok(AppConfig {
            db_path,
            utc_offset,
            store_name: get(ENV_STORE_NAME).unwrap_or_else(|| "Stockroom".to_string()),
            currency_symbol: get(ENV_CURRENCY_SYMBOL).unwrap_or_else(|| "₸".to_string()),
            max_connections,
        })
    }

    /// Formats an amount in whole currency units.
    ///
    /// ## Example
    /// ```rust,ignore
    /// assert_eq!(config.format_currency(1234567), "1 234 567 ₸");
    /// ```
    pub fn format_currency(&self, units: i64) -> String {
        let digits = units.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }

        format!(
            "{}{} {}",
            if units < 0 { "-" } else { "" },
            grouped,
            self.currency_symbol
        )
    }
}

/// Platform data directory:
/// - **Linux**: `~/.local/share/stockroom/stockroom.db`
/// - **macOS**: `~/Library/Application Support/com.stockroom.stockroom/stockroom.db`
/// - **Windows**: `%APPDATA%\stockroom\stockroom\data\stockroom.db`
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "stockroom", "stockroom").ok_or(ConfigError::NoDataDir)?;
    Ok(dirs.data_dir().join("stockroom.db"))
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| chrono::Utc.fix())
}
