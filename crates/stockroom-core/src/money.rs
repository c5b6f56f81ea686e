//! # Money Module
//!
//! Provides the `Money` type for monetary values.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: integer amounts in the smallest currency unit            │
//! │    Σ price × quantity is exact, so a rebuilt report always matches      │
//! │    the previous rebuild to the unit.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store works in a single currency; the unit is whatever the catalog
//! prices are entered in (tenge for the default deployment). Formatting with
//! a currency symbol is the front end's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed so that a loss-making day (`benefit < 0`) is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from smallest currency units.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_units(150);
    /// assert_eq!(price.units(), 150);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in smallest currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// Returns `None` when the product does not fit in `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let arrival = Money::from_units(100);
    /// assert_eq!(arrival.checked_multiply_quantity(4), Some(Money::from_units(400)));
    /// assert_eq!(Money::from_units(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    ///
    /// ## Where It Is Used
    /// ```text
    /// Order.price × Order.quantity          ──► selling
    /// Product.arrival_price × Order.quantity ──► arrival cost
    /// Product.arrival_price × stocked qty    ──► Expense.amount
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// `self − other`, or `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// Sums an iterator of amounts. An empty iterator sums to zero, which is
    /// what an empty day reports.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let total = Money::checked_sum([150, 250].into_iter().map(Money::from_units));
    /// assert_eq!(total, Some(Money::from_units(400)));
    /// assert_eq!(Money::checked_sum(std::iter::empty::<Money>()), Some(Money::zero()));
    /// ```
    pub fn checked_sum<I>(iter: I) -> Option<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        iter.into_iter().try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain unit count; the CLI adds the configured currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
