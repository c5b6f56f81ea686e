//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! Everything Stockroom knows about prices, stock and daily totals, as pure
//! functions over plain data. The database crate decides *when* these rules
//! run and persists the results; this crate decides *what* they are.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Admin CLI (apps/admin)                       │   │
//! │  │   order create ──► order finish ──► report show                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         stockroom-db (fulfillment, aggregation, repos)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ stockroom-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  totals   │  │ calendar  │  │   │
//! │  │   │  Product  │  │   Money   │  │DailyTotals│  │ day bounds│  │   │
//! │  │   │   Order   │  │           │  │           │  │  offsets  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Category, Product, Order, Expense, Report) and requests
//! - [`money`] - Integer money in the smallest currency unit
//! - [`totals`] - Daily selling/benefit/expenses aggregation
//! - [`calendar`] - Business-day boundaries under a fixed UTC offset
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let unit = Money::from_units(150);
//! assert_eq!(unit.checked_multiply_quantity(4).map(|m| m.units()), Some(600));
//! ```

pub mod calendar;
pub mod error;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

pub use calendar::BusinessCalendar;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use totals::{DailyTotals, FinishedLine};
pub use types::*;

/// Default business time zone: UTC+05:00 (Kazakhstan, single zone since 2024).
///
/// Report dates and order completion dates are both computed in this offset
/// unless the deployment configures another one.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 5 * 3600;

/// Upper bound on a single order or restock quantity.
///
/// Catches typos like 1000 instead of 10 before they reach the stock column.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Upper bound on a unit price, in smallest currency units.
///
/// `MAX_PRICE × MAX_LINE_QUANTITY` stays far below `i64::MAX`, so a single
/// line total always fits.
pub const MAX_PRICE: i64 = 1_000_000_000_000;
