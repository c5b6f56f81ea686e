//! # Expense Commands
//!
//! Expenses are listed either by business day or by product; both views
//! carry their sum.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::{AppConfig, AppState};
use stockroom_core::{CoreError, Expense, Money, ValidationError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDto {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub amount: i64,
    pub incurred_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseDto {
    fn from(e: Expense) -> Self {
        ExpenseDto {
            id: e.id,
            product_id: e.product_id,
            quantity: e.quantity,
            amount: e.amount,
            incurred_at: e.incurred_at,
        }
    }
}

/// All expenses of one business day, with their sum.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayExpensesDto {
    pub date: NaiveDate,
    pub total: i64,
    pub total_display: String,
    pub expenses: Vec<ExpenseDto>,
}

impl DayExpensesDto {
    pub fn new(date: NaiveDate, expenses: Vec<Expense>, config: &AppConfig) -> Result<Self, ApiError> {
        let total = total_of(&expenses)?;
        Ok(DayExpensesDto {
            date,
            total,
            total_display: config.format_currency(total),
            expenses: expenses.into_iter().map(ExpenseDto::from).collect(),
        })
    }
}

/// Every stocking event of one product, oldest first, with their sum.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductExpensesDto {
    pub product_id: String,
    pub total: i64,
    pub total_display: String,
    pub expenses: Vec<ExpenseDto>,
}

fn total_of(expenses: &[Expense]) -> Result<i64, ApiError> {
    Money::checked_sum(expenses.iter().map(Expense::amount))
        .map(|m| m.units())
        .ok_or_else(|| CoreError::from(ValidationError::overflow("total")).into())
}

/// `stockroom expense list <date>`
pub async fn list(state: &AppState, date: NaiveDate) -> Result<DayExpensesDto, ApiError> {
    let expenses = state.db().expenses().list_for_date(date).await?;
    DayExpensesDto::new(date, expenses, state.config())
}

/// `stockroom expense list --product <id>`
pub async fn list_for_product(state: &AppState, product_id: &str) -> Result<ProductExpensesDto, ApiError> {
    if state.db().products().get_by_id(product_id).await?.is_none() {
        return Err(ApiError::not_found("Product", product_id));
    }

    let expenses = state.db().expenses().list_for_product(product_id).await?;
    let total = total_of(&expenses)?;
    Ok(ProductExpensesDto {
        product_id: product_id.to_string(),
        total,
        total_display: state.config().format_currency(total),
        expenses: expenses.into_iter().map(ExpenseDto::from).collect(),
    })
}
