//! # Database Error Types
//!
//! Storage errors and the service outcome errors built on top of them.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (stockroom-core)        │
//! │       │                                   │                             │
//! │       ▼                                   │                             │
//! │  DbError ← adds categorization            │                             │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  ServiceError ← Rejected | Storage | ReportRebuild | ReportsStale      │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  ApiError (admin CLI) ← code + message for the operator                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use thiserror::Error;

use crate::fulfillment::FinishBatch;
use stockroom_core::{CoreError, Order, ValidationError};

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (e.g. duplicate category name).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, bad status pair).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A transaction observed a state it should have excluded.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A value derived from stored rows or a requested date does not fit
    /// (a day total past `i64`, a date at the calendar edge).
    #[error("Derived value out of range: {0}")]
    OutOfRange(#[from] ValidationError),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <expr>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// ServiceError
// =============================================================================

/// Outcome errors of the catalog, fulfillment and aggregation services.
///
/// ## Variants by Severity
/// ```text
/// Rejected       nothing was written; fix the input and retry
/// Storage        the store failed; the transaction rolled back
/// ReportRebuild  the order IS finished; only its day's report is stale
/// ReportsStale   the batch IS applied; only the listed reports are stale
/// ```
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A business rule rejected the request before any write.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The record store failed.
    #[error(transparent)]
    Storage(#[from] DbError),

    /// The order was finished but the report for its date was not rebuilt.
    #[error("Order {order_id} was finished but the report for {date} could not be rebuilt: {source}")]
    ReportRebuild {
        order_id: String,
        date: NaiveDate,
        order: Box<Order>,
        #[source]
        source: DbError,
    },

    /// Some reports touched by a bulk finish could not be rebuilt.
    #[error("Orders were finished but reports for {dates:?} could not be rebuilt")]
    ReportsStale {
        batch: Box<FinishBatch>,
        dates: Vec<NaiveDate>,
    },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Rejected(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Storage(DbError::from(err))
    }
}

impl ServiceError {
    /// Dates whose reports are stale because of this error.
    pub fn stale_dates(&self) -> Vec<NaiveDate> {
        match self {
            ServiceError::ReportRebuild { date, .. } => vec![*date],
            ServiceError::ReportsStale { dates, .. } => dates.clone(),
            _ => Vec::new(),
        }
    }

    /// True when the requested state change was committed despite the error.
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            ServiceError::ReportRebuild { .. } | ServiceError::ReportsStale { .. }
        )
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
