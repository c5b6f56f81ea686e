//! # Application State
//!
//! Everything a command needs: the open database and the configuration it
//! was opened with.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  AppState                                    │
//! │  ┌───────────────────┐ ┌──────────────────┐  │
//! │  │  Database         │ │  AppConfig       │  │
//! │  │  • pool           │ │  • store name    │  │
//! │  │  • calendar       │ │  • currency      │  │
//! │  │  • services       │ │  • offset        │  │
//! │  └───────────────────┘ └──────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;

pub use config::{AppConfig, ConfigError};

use stockroom_db::{Database, DbConfig, DbError, DbResult};
use tracing::info;

/// Shared state for one CLI invocation.
#[derive(Debug, Clone)]
pub struct AppState {
    db: Database,
    config: AppConfig,
}

impl AppState {
    /// Wraps an already open database.
    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState { db, config }
    }

    /// Opens (creating if needed) the configured database, applies pending
    /// migrations and checks that it answers a query.
    pub async fn open(config: AppConfig) -> DbResult<Self> {
        if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                DbError::ConnectionFailed(format!(
                    "cannot create {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let db = Database::new(
            DbConfig::new(&config.db_path)
                .max_connections(config.max_connections)
                .business_offset(config.utc_offset),
        )
        .await?;

        if !db.health_check().await {
            db.close().await;
            return Err(DbError::ConnectionFailed(format!(
                "{} does not answer queries",
                config.db_path.display()
            )));
        }

        info!(path = ?config.db_path, offset = %config.utc_offset, "Database opened");
        Ok(AppState { db, config })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
