//! # Daily Totals
//!
//! The arithmetic behind a daily report, separated from how the rows are
//! fetched.
//!
//! ```text
//! finished orders of day D ──► FinishedLine { price, quantity, arrival_price }
//!                                   │
//!                                   ├── selling      = Σ price × quantity
//!                                   └── arrival_cost = Σ arrival_price × quantity
//! expenses of day D ─────────────────── expenses     = Σ amount
//!
//! benefit = selling − arrival_cost
//! ```
//!
//! Everything defaults to zero, so a day with no activity yields a report of
//! zeros rather than missing values. Every step is checked; a figure that
//! does not fit in `i64` is a [`ValidationError::Overflow`] naming it.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Expense;
use crate::validation::ValidationResult;

/// One finished order joined with its product's arrival price.
///
/// `arrival_price` is the product's *current* cost, read at aggregation
/// time; the order only freezes its sale price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FinishedLine {
    pub order_id: String,
    pub price: i64,
    pub quantity: i64,
    pub arrival_price: i64,
}

impl FinishedLine {
    /// `price × quantity`, or `None` on overflow.
    #[inline]
    pub fn selling(&self) -> Option<Money> {
        Money::from_units(self.price).checked_multiply_quantity(self.quantity)
    }

    /// `arrival_price × quantity`, or `None` on overflow.
    #[inline]
    pub fn arrival_cost(&self) -> Option<Money> {
        Money::from_units(self.arrival_price).checked_multiply_quantity(self.quantity)
    }
}

/// Aggregated figures for one business day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub selling: Money,
    pub arrival_cost: Money,
    /// `selling − arrival_cost`. Negative on a loss-making day.
    pub benefit: Money,
    pub expenses: Money,
    pub order_count: i64,
}

impl DailyTotals {
    /// Computes the totals from a day's finished orders and expenses.
    ///
    /// ```rust
    /// use stockroom_core::{DailyTotals, FinishedLine};
    ///
    /// let lines = vec![FinishedLine {
    ///     order_id: "o-1".into(), price: 150, quantity: 4, arrival_price: 100,
    /// }];
    /// let totals = DailyTotals::compute(&lines, &[]).unwrap();
    /// assert_eq!(totals.selling.units(), 600);
    /// assert_eq!(totals.benefit.units(), 200);
    /// assert!(totals.expenses.is_zero());
    /// ```
    pub fn compute(lines: &[FinishedLine], expenses: &[Expense]) -> ValidationResult<Self> {
        let selling = sum_of("selling", lines.iter().map(FinishedLine::selling))?;
        let arrival_cost = sum_of("arrival_cost", lines.iter().map(FinishedLine::arrival_cost))?;
        let expenses = sum_of("expenses", expenses.iter().map(|e| Some(e.amount())))?;
        let benefit = selling
            .checked_sub(arrival_cost)
            .ok_or_else(|| ValidationError::overflow("benefit"))?;

        Ok(DailyTotals {
            selling,
            arrival_cost,
            benefit,
            expenses,
            order_count: lines.len() as i64,
        })
    }
}

fn sum_of<I>(field: &str, amounts: I) -> ValidationResult<Money>
where
    I: Iterator<Item = Option<Money>>,
{
    amounts
        .collect::<Option<Vec<Money>>>()
        .and_then(Money::checked_sum)
        .ok_or_else(|| ValidationError::overflow(field))
}
