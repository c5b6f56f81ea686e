//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Two Levels of Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Repository structs (pool-level)         free functions (conn-level)   │
//! │  ───────────────────────────────         ──────────────────────────    │
//! │  db.products().get_by_id(id)             product::fetch(&mut tx, id)   │
//! │  db.orders().list(Some(New))             order::insert(&mut tx, &o)    │
//! │  db.reports().range(from, to)            report::claim(&mut tx, d)     │
//! │                                                                         │
//! │  Read-side queries for the front end.    Building blocks the services  │
//! │  Each call takes its own connection.     compose inside ONE transaction│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conn-level functions take `&mut SqliteConnection`, so they accept a
//! `&mut Transaction` or a `&mut PoolConnection` alike.
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository)
//! - [`ProductRepository`](product::ProductRepository)
//! - [`OrderRepository`](order::OrderRepository)
//! - [`ExpenseRepository`](expense::ExpenseRepository)
//! - [`ReportRepository`](report::ReportRepository)

pub mod category;
pub mod expense;
pub mod order;
pub mod product;
pub mod report;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
