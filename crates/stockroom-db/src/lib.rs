//! # stockroom-db: Storage, Fulfillment and Reporting for Stockroom
//!
//! SQLite-backed record store plus the services that change it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  stockroom order finish <id>                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │  Fulfillment  │──►│  Aggregator   │   │    Catalog     │   │   │
//! │  │   │ create_order  │   │ rebuild_report│   │ create_product │   │   │
//! │  │   │ mark_finished │   │ rebuild_range │   │ restock        │   │   │
//! │  │   └───────┬───────┘   └───────┬───────┘   └───────┬────────┘   │   │
//! │  │           └───────────────────┼───────────────────┘            │   │
//! │  │                               ▼                                 │   │
//! │  │   ┌─────────────────────────────────────────────────────────┐  │   │
//! │  │   │  Repositories: categories products orders expenses      │  │   │
//! │  │   │                reports                                  │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) ── migrations/sqlite/*.sql embedded at build time        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockroom.db")).await?;
//! let order = db.fulfillment().create_order(&request).await?;
//! db.fulfillment().mark_finished(&order.id).await?;
//! let report = db.reports().get(db.calendar().date_of(Utc::now())).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod fulfillment;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use aggregator::{ReportAggregator, ReportRebuilder};
pub use catalog::CatalogService;
pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use fulfillment::{FailedOrder, FinishBatch, FulfillmentService, SkipReason, SkippedOrder};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
