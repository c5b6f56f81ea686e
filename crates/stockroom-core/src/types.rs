//! # Domain Types
//!
//! Entities and requests used throughout Stockroom.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │◄──│     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  arrival_price  │   │  quantity       │       │
//! │  │  name           │   │  sales_price    │   │  price_type     │       │
//! │  └─────────────────┘   │  kaspi_price    │   │  price (frozen) │       │
//! │                        │  quantity       │   │  status         │       │
//! │                        └────────┬────────┘   │  finished_at    │       │
//! │                                 │            └─────────────────┘       │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │    Expense      │   │     Report      │       │
//! │                        │  amount         │   │  date (key)     │       │
//! │                        │  incurred_at    │   │  selling        │       │
//! │                        └─────────────────┘   │  benefit        │       │
//! │                                              │  expenses       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money columns are stored as `i64` smallest units; the accessor methods
//! wrap them in [`Money`] for arithmetic.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::totals::DailyTotals;
use crate::validation::{
    validate_category_name, validate_price, validate_product_name, validate_quantity,
    validate_stock_level, validate_uuid, ValidationResult,
};

// =============================================================================
// Category
// =============================================================================

/// A product category. Catalog data only; the core never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    /// Builds a category after validating its name.
    pub fn new(id: impl Into<String>, name: &str) -> ValidationResult<Self> {
        validate_category_name(name)?;
        Ok(Category {
            id: id.into(),
            name: name.trim().to_string(),
        })
    }
}

// =============================================================================
// Price Type
// =============================================================================

/// Which sale channel an order is priced from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Regular shop price (`Product::sales_price`).
    #[default]
    Sales,
    /// Kaspi marketplace price (`Product::kaspi_price`).
    Kaspi,
}

impl PriceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PriceType::Sales => "sales",
            PriceType::Kaspi => "kaspi",
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sales" => Ok(PriceType::Sales),
            "kaspi" => Ok(PriceType::Kaspi),
            _ => Err(ValidationError::NotAllowed {
                field: "price_type".to_string(),
                allowed: vec!["sales".to_string(), "kaspi".to_string()],
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    /// Category this product belongs to.
    pub category_id: String,

    /// Purchase cost per unit.
    pub arrival_price: i64,

    /// Shop price per unit.
    pub sales_price: i64,

    /// Kaspi marketplace price per unit.
    pub kaspi_price: i64,

    /// Units on hand. Never negative.
    pub quantity: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the purchase cost per unit.
    #[inline]
    pub fn arrival_price(&self) -> Money {
        Money::from_units(self.arrival_price)
    }

    /// Resolves the unit price for a sale channel.
    ///
    /// ```rust
    /// # use chrono::Utc;
    /// # use stockroom_core::{PriceType, Product};
    /// # let now = Utc::now();
    /// let product = Product {
    ///     id: "p".into(), name: "Tea".into(), category_id: "c".into(),
    ///     arrival_price: 100, sales_price: 150, kaspi_price: 170,
    ///     quantity: 10, created_at: now, updated_at: now,
    /// };
    /// assert_eq!(product.price_for(PriceType::Sales).units(), 150);
    /// assert_eq!(product.price_for(PriceType::Kaspi).units(), 170);
    /// ```
    pub fn price_for(&self, price_type: PriceType) -> Money {
        match price_type {
            PriceType::Sales => Money::from_units(self.sales_price),
            PriceType::Kaspi => Money::from_units(self.kaspi_price),
        }
    }

    /// Checks that `requested` units can be taken from stock.
    pub fn check_stock(&self, requested: i64) -> CoreResult<()> {
        if requested > self.quantity {
            return Err(CoreError::insufficient_stock(
                &self.id,
                self.quantity,
                requested,
            ));
        }
        Ok(())
    }
}

// =============================================================================
// New Product
// =============================================================================

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub category_id: String,
    pub arrival_price: i64,
    pub sales_price: i64,
    pub kaspi_price: i64,
    /// Initial stock. Non-zero stock is recorded as an expense.
    pub quantity: i64,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        validate_uuid(&self.category_id)?;
        validate_price("arrival_price", self.arrival_price)?;
        validate_price("sales_price", self.sales_price)?;
        validate_price("kaspi_price", self.kaspi_price)?;
        validate_stock_level(self.quantity)?;
        Ok(())
    }

    /// Materializes the product row.
    pub fn into_product(self, id: impl Into<String>, now: DateTime<Utc>) -> Product {
        Product {
            id: id.into(),
            name: self.name.trim().to_string(),
            category_id: self.category_id,
            arrival_price: self.arrival_price,
            sales_price: self.sales_price,
            kaspi_price: self.kaspi_price,
            quantity: self.quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle: `new → finished`, one way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Finished,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(OrderStatus::New),
            "finished" => Ok(OrderStatus::Finished),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["new".to_string(), "finished".to_string()],
            }),
        }
    }
}

// =============================================================================
// Order Request
// =============================================================================

/// What the operator asks for when placing an order.
///
/// Deliberately has no price field: the price is resolved from the product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub deadline: NaiveDate,
    #[serde(default)]
    pub price_type: PriceType,
}

impl OrderRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid(&self.product_id)?;
        validate_quantity(self.quantity)?;
        Ok(())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order against a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub deadline: NaiveDate,
    pub price_type: PriceType,
    /// Unit price captured when the order was placed.
    pub price: i64,
    pub status: OrderStatus,
    /// Set exactly once, when `status` becomes `finished`.
    #[ts(as = "Option<String>")]
    pub finished_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new order priced from `product` at this moment.
    ///
    /// Stock is not checked here; the caller reserves it atomically with
    /// the insert.
    pub fn place(
        id: impl Into<String>,
        request: &OrderRequest,
        product: &Product,
        now: DateTime<Utc>,
    ) -> Order {
        Order {
            id: id.into(),
            product_id: product.id.clone(),
            quantity: request.quantity,
            deadline: request.deadline,
            price_type: request.price_type,
            price: product.price_for(request.price_type).units(),
            status: OrderStatus::New,
            finished_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_units(self.price)
    }

    /// `price × quantity`.
    pub fn total(&self) -> CoreResult<Money> {
        self.unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| ValidationError::overflow("total").into())
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.status == OrderStatus::Finished
    }

    /// Rejects the transition when the order is no longer `new`.
    pub fn ensure_new(&self) -> CoreResult<()> {
        match (self.status, self.finished_at) {
            (OrderStatus::New, _) => Ok(()),
            (OrderStatus::Finished, finished_at) => Err(CoreError::AlreadyFinished {
                order_id: self.id.clone(),
                finished_at: finished_at.unwrap_or(self.updated_at),
            }),
        }
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A cash outflow recorded when stock arrives. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    /// `arrival_price × quantity` at the time of the stocking event.
    pub amount: i64,
    #[ts(as = "String")]
    pub incurred_at: DateTime<Utc>,
}

impl Expense {
    /// Expense for receiving `quantity` units of `product` at `at`.
    pub fn for_stocking(
        id: impl Into<String>,
        product: &Product,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> CoreResult<Expense> {
        let amount = product
            .arrival_price()
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::overflow("amount"))?;

        Ok(Expense {
            id: id.into(),
            product_id: product.id.clone(),
            quantity,
            amount: amount.units(),
            incurred_at: at,
        })
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_units(self.amount)
    }
}

// =============================================================================
// Report
// =============================================================================

/// Per-date financial snapshot. Derived data: always rebuildable from
/// orders and expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Report {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Σ price × quantity over orders finished on `date`.
    pub selling: i64,
    /// `selling` minus Σ arrival_price × quantity over the same orders.
    pub benefit: i64,
    /// Σ expense amounts incurred on `date`.
    pub expenses: i64,
    pub order_count: i64,
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn from_totals(date: NaiveDate, totals: &DailyTotals, generated_at: DateTime<Utc>) -> Self {
        Report {
            date,
            selling: totals.selling.units(),
            benefit: totals.benefit.units(),
            expenses: totals.expenses.units(),
            order_count: totals.order_count,
            generated_at,
        }
    }

    /// True when both reports carry the same figures, ignoring `generated_at`.
    pub fn same_figures(&self, other: &Report) -> bool {
        self.date == other.date
            && self.selling == other.selling
            && self.benefit == other.benefit
            && self.expenses == other.expenses
            && self.order_count == other.order_count
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
