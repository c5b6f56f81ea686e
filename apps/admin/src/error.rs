//! # API Error Type
//!
//! What the operator sees when a command fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  stockroom order create --product P --quantity 7 ...                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  ServiceError::Rejected(InsufficientStock) ──┐                   │  │
//! │  │  ServiceError::Storage(DbError) ─────────────┼──► ApiError       │  │
//! │  │  ServiceError::ReportRebuild ────────────────┘                   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stderr: error [INSUFFICIENT_STOCK]: Insufficient stock for P: ...     │
//! │  exit code 1                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage details are logged, not shown: the operator gets a generic
//! message and the log has the SQL error.

use serde::Serialize;
use std::fmt;
use stockroom_core::CoreError;
use stockroom_db::{DbError, ServiceError};

/// Error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order not found: 7f1c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, category, order or report does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// A unique name is already taken
    Duplicate,

    /// Not enough stock for the order
    InsufficientStock,

    /// The order was finished earlier
    AlreadyFinished,

    /// The change was committed but a daily report could not be rebuilt
    ReportStale,

    /// Database operation failed
    DatabaseError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Duplicate => "DUPLICATE",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::AlreadyFinished => "ALREADY_FINISHED",
            ErrorCode::ReportStale => "REPORT_STALE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Process exit code for this failure.
    ///
    /// `3` means the requested change IS in the store and only a report
    /// needs rebuilding; everything else is `1`.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::ReportStale => 3,
            _ => 1,
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::validation("Rejected by a store constraint")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::OutOfRange(e) => ApiError::validation(e.to_string()),
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core rejections to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::CategoryNotFound(id) => ApiError::not_found("Category", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    product_id, available, requested
                ),
            ),
            CoreError::AlreadyFinished {
                order_id,
                finished_at,
            } => ApiError::new(
                ErrorCode::AlreadyFinished,
                format!("Order {} was already finished at {}", order_id, finished_at),
            ),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts service outcomes to API errors.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rejected(e) => e.into(),
            ServiceError::Storage(e) => e.into(),
            ServiceError::ReportRebuild {
                order_id,
                date,
                source,
                ..
            } => {
                tracing::error!(%order_id, %date, error = %source, "Report left stale");
                ApiError::new(
                    ErrorCode::ReportStale,
                    format!(
                        "Order {} is finished, but the report for {} could not be rebuilt; \
                         run `stockroom report rebuild {}`",
                        order_id, date, date
                    ),
                )
            }
            ServiceError::ReportsStale { batch, dates } => {
                let listed: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
                tracing::error!(dates = ?listed, "Reports left stale");
                ApiError::new(
                    ErrorCode::ReportStale,
                    format!(
                        "{} order(s) finished, but reports for {} could not be rebuilt; \
                         run `stockroom report rebuild <date>` for each",
                        batch.finished.len(),
                        listed.join(", ")
                    ),
                )
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error [{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
