//! # Order Commands
//!
//! ## Finish Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stockroom order finish <id>            stockroom order finish a b c    │
//! │         │                                        │                      │
//! │         ▼                                        ▼                      │
//! │  mark_finished(id)                     mark_finished_many([a, b, c])    │
//! │         │                                        │                      │
//! │         ▼                                        ▼                      │
//! │  OrderDto, or                          FinishBatchDto                   │
//! │  NOT_FOUND / ALREADY_FINISHED          { finished, skipped, failed,     │
//! │  / REPORT_STALE                          reports }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A single id is strict: finishing an unknown or finished order is an
//! error. Several ids are lenient: those are reported as skipped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::report::ReportDto;
use super::to_json;
use crate::error::ApiError;
use crate::state::{AppConfig, AppState};
use stockroom_core::{Order, OrderRequest, OrderStatus, PriceType};
use stockroom_db::{FailedOrder, FinishBatch, SkippedOrder};

/// Order as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub deadline: NaiveDate,
    pub price_type: PriceType,
    /// Unit price captured at creation.
    pub price: i64,
    pub total: i64,
    pub total_display: String,
    pub status: OrderStatus,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OrderDto {
    /// Fails only when `price × quantity` does not fit in 64 bits.
    pub fn new(o: Order, config: &AppConfig) -> Result<Self, ApiError> {
        let total = o.total()?.units();
        Ok(OrderDto {
            id: o.id,
            product_id: o.product_id,
            quantity: o.quantity,
            deadline: o.deadline,
            price_type: o.price_type,
            price: o.price,
            total,
            total_display: config.format_currency(total),
            status: o.status,
            finished_at: o.finished_at,
            created_at: o.created_at,
        })
    }
}

/// Outcome of finishing several orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishBatchDto {
    pub finished: Vec<OrderDto>,
    pub skipped: Vec<SkippedOrder>,
    pub failed: Vec<FailedOrder>,
    pub reports: Vec<ReportDto>,
}

impl FinishBatchDto {
    pub fn new(batch: FinishBatch, config: &AppConfig) -> Result<Self, ApiError> {
        Ok(FinishBatchDto {
            finished: batch
                .finished
                .into_iter()
                .map(|o| OrderDto::new(o, config))
                .collect::<Result<_, _>>()?,
            skipped: batch.skipped,
            failed: batch.failed,
            reports: batch
                .reports
                .into_iter()
                .map(|r| ReportDto::new(r, config))
                .collect(),
        })
    }
}

/// Order counts per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCountsDto {
    pub new: i64,
    pub finished: i64,
}

/// `stockroom order create ...`
pub async fn create(state: &AppState, request: OrderRequest) -> Result<OrderDto, ApiError> {
    let order = state.db().fulfillment().create_order(&request).await?;
    OrderDto::new(order, state.config())
}

/// `stockroom order finish <id>...`
pub async fn finish(state: &AppState, ids: &[String]) -> Result<Value, ApiError> {
    let fulfillment = state.db().fulfillment();

    match ids {
        [id] => {
            let order = fulfillment.mark_finished(id).await?;
            to_json(OrderDto::new(order, state.config())?)
        }
        _ => {
            let batch = fulfillment.mark_finished_many(ids).await?;
            to_json(FinishBatchDto::new(batch, state.config())?)
        }
    }
}

/// `stockroom order list [--status new|finished]`
pub async fn list(state: &AppState, status: Option<OrderStatus>) -> Result<Vec<OrderDto>, ApiError> {
    let orders = state.db().orders().list(status).await?;
    debug!(count = orders.len(), ?status, "Listed orders");
    orders
        .into_iter()
        .map(|o| OrderDto::new(o, state.config()))
        .collect()
}

/// `stockroom order count`
pub async fn count(state: &AppState) -> Result<OrderCountsDto, ApiError> {
    let orders = state.db().orders();
    Ok(OrderCountsDto {
        new: orders.count_by_status(OrderStatus::New).await?,
        finished: orders.count_by_status(OrderStatus::Finished).await?,
    })
}

/// `stockroom order show <id>`
pub async fn show(state: &AppState, id: &str) -> Result<OrderDto, ApiError> {
    match state.db().orders().get_by_id(id).await? {
        Some(order) => OrderDto::new(order, state.config()),
        None => Err(ApiError::not_found("Order", id)),
    }
}
