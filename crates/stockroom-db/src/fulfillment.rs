//! # Order Fulfillment Service
//!
//! Commits order lifecycle transitions and keeps the daily report in step.
//!
//! ## Placing an Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order(product, qty = 4, price_type = sales)                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE products SET quantity = quantity - 4                          │
//! │    WHERE id = ? AND quantity >= 4          ← write lock, stock check    │
//! │        │                                                                │
//! │        ├── 0 rows ──► ProductNotFound | InsufficientStock (rollback)    │
//! │        ▼                                                                │
//! │    SELECT product        ← prices as of this instant                    │
//! │    INSERT order { price: sales_price, status: new }                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Finishing an Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mark_finished(order)                                                   │
//! │                                                                         │
//! │  UPDATE orders SET status = 'finished', finished_at = now               │
//! │  WHERE id = ? AND status = 'new'                                        │
//! │        │                                                                │
//! │        ├── 0 rows ──► OrderNotFound | AlreadyFinished                   │
//! │        ▼                                                                │
//! │  COMMIT ─────────────── the order is finished from here on              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  rebuild_report(calendar.date_of(now))                                  │
//! │        │                                                                │
//! │        └── fails ──► ReportRebuild { order, date } (order stays done)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rebuild runs after the commit, on its own connection: a transaction
//! is never held open while another connection is acquired.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::aggregator::ReportRebuilder;
use crate::error::{DbError, ServiceError, ServiceResult};
use crate::repository::{generate_id, order, product};
use stockroom_core::{BusinessCalendar, CoreError, Order, OrderRequest, Report};

// =============================================================================
// Batch outcome
// =============================================================================

/// Why an order in a bulk finish was left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    AlreadyFinished { finished_at: DateTime<Utc> },
    /// The id appeared earlier in the same request.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedOrder {
    pub order_id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// An order whose transition hit a storage error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedOrder {
    pub order_id: String,
    pub error: String,
}

/// Outcome of [`FulfillmentService::mark_finished_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinishBatch {
    pub finished: Vec<Order>,
    pub skipped: Vec<SkippedOrder>,
    pub failed: Vec<FailedOrder>,
    /// One report per distinct business date among `finished`.
    pub reports: Vec<Report>,
}

impl FinishBatch {
    pub fn finished_ids(&self) -> Vec<&str> {
        self.finished.iter().map(|o| o.id.as_str()).collect()
    }
}

// =============================================================================
// Service
// =============================================================================

/// Order creation and completion.
#[derive(Clone)]
pub struct FulfillmentService {
    pool: SqlitePool,
    calendar: BusinessCalendar,
    reports: Arc<dyn ReportRebuilder>,
}

impl std::fmt::Debug for FulfillmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentService")
            .field("calendar", &self.calendar)
            .finish_non_exhaustive()
    }
}

impl FulfillmentService {
    pub fn new(
        pool: SqlitePool,
        calendar: BusinessCalendar,
        reports: Arc<dyn ReportRebuilder>,
    ) -> Self {
        FulfillmentService {
            pool,
            calendar,
            reports,
        }
    }

    /// Places an order, reserving stock and capturing the price.
    ///
    /// ## Errors
    /// * `Rejected(Validation)` - quantity ≤ 0 or malformed product id
    /// * `Rejected(ProductNotFound)`
    /// * `Rejected(InsufficientStock)` - carries the available quantity
    ///
    /// On any error nothing is written.
    pub async fn create_order(&self, request: &OrderRequest) -> ServiceResult<Order> {
        request.validate()?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let reserved =
            product::reserve_stock(&mut tx, &request.product_id, request.quantity, now).await?;

        let product = product::fetch(&mut tx, &request.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        if !reserved {
            if let Err(rejection) = product.check_stock(request.quantity) {
                warn!(
                    product_id = %product.id,
                    available = product.quantity,
                    requested = request.quantity,
                    "Order rejected: insufficient stock"
                );
                return Err(rejection.into());
            }
            return Err(DbError::TransactionFailed(format!(
                "stock reservation for {} matched no row",
                product.id
            ))
            .into());
        }

        let order = Order::place(generate_id(), request, &product, now);
        order::insert(&mut tx, &order).await?;

        tx.commit().await?;

        info!(
            id = %order.id,
            product_id = %order.product_id,
            quantity = order.quantity,
            price_type = %order.price_type,
            price = order.price,
            stock_left = product.quantity,
            "Order created"
        );
        Ok(order)
    }

    /// Finishes an order now and rebuilds its day's report.
    pub async fn mark_finished(&self, order_id: &str) -> ServiceResult<Order> {
        self.mark_finished_at(order_id, Utc::now()).await
    }

    /// Finishes an order at `at` and rebuilds the report for `at`'s date.
    ///
    /// ## Errors
    /// * `Rejected(OrderNotFound)`
    /// * `Rejected(AlreadyFinished)` - the order is left untouched
    /// * `ReportRebuild` - the order IS finished; its report is stale
    pub async fn mark_finished_at(&self, order_id: &str, at: DateTime<Utc>) -> ServiceResult<Order> {
        let order = self.finish(order_id, at).await?;
        let date = self.calendar.date_of(at);

        match self.reports.rebuild_report(date).await {
            Ok(_) => Ok(order),
            Err(source) => {
                error!(
                    order_id = %order.id,
                    %date,
                    error = %source,
                    "Order finished but report rebuild failed"
                );
                Err(ServiceError::ReportRebuild {
                    order_id: order.id.clone(),
                    date,
                    order: Box::new(order),
                    source,
                })
            }
        }
    }

    /// Finishes several orders now. See [`Self::mark_finished_many_at`].
    pub async fn mark_finished_many<S: AsRef<str>>(&self, order_ids: &[S]) -> ServiceResult<FinishBatch> {
        self.mark_finished_many_at(order_ids, Utc::now()).await
    }

    /// Finishes each order independently, then rebuilds each affected
    /// date's report once.
    ///
    /// Missing, already finished and repeated ids are skipped with a reason.
    /// A storage error on one order is recorded and the rest continue.
    pub async fn mark_finished_many_at<S: AsRef<str>>(
        &self,
        order_ids: &[S],
        at: DateTime<Utc>,
    ) -> ServiceResult<FinishBatch> {
        let mut batch = FinishBatch::default();
        let mut seen = HashSet::new();

        for id in order_ids.iter().map(|id| id.as_ref()) {
            if !seen.insert(id) {
                batch.skipped.push(skipped(id, SkipReason::Duplicate));
                continue;
            }

            match self.finish(id, at).await {
                Ok(order) => batch.finished.push(order),
                Err(ServiceError::Rejected(CoreError::OrderNotFound(_))) => {
                    batch.skipped.push(skipped(id, SkipReason::NotFound));
                }
                Err(ServiceError::Rejected(CoreError::AlreadyFinished { finished_at, .. })) => {
                    batch
                        .skipped
                        .push(skipped(id, SkipReason::AlreadyFinished { finished_at }));
                }
                Err(err) => {
                    warn!(order_id = %id, error = %err, "Order could not be finished");
                    batch.failed.push(FailedOrder {
                        order_id: id.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let dates: BTreeSet<NaiveDate> = batch
            .finished
            .iter()
            .map(|o| self.calendar.date_of(o.finished_at.unwrap_or(at)))
            .collect();

        let mut stale = Vec::new();
        for date in dates {
            match self.reports.rebuild_report(date).await {
                Ok(report) => batch.reports.push(report),
                Err(source) => {
                    error!(%date, error = %source, "Report rebuild failed after bulk finish");
                    stale.push(date);
                }
            }
        }

        info!(
            finished = batch.finished.len(),
            skipped = batch.skipped.len(),
            failed = batch.failed.len(),
            stale_reports = stale.len(),
            "Bulk finish applied"
        );

        if stale.is_empty() {
            Ok(batch)
        } else {
            Err(ServiceError::ReportsStale {
                batch: Box::new(batch),
                dates: stale,
            })
        }
    }

    /// The `new → finished` transition alone, without touching reports.
    async fn finish(&self, order_id: &str, at: DateTime<Utc>) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await?;

        if !order::mark_finished(&mut tx, order_id, at).await? {
            let existing = order::fetch(&mut tx, order_id)
                .await?
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

            if let Err(rejection) = existing.ensure_new() {
                warn!(order_id = %order_id, "Order already finished");
                return Err(rejection.into());
            }
            return Err(DbError::TransactionFailed(format!(
                "finishing order {} matched no row",
                order_id
            ))
            .into());
        }

        let finished = order::fetch(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::TransactionFailed(format!("order {} vanished", order_id)))?;

        tx.commit().await?;

        info!(id = %finished.id, finished_at = %at, "Order finished");
        Ok(finished)
    }
}

fn skipped(order_id: &str, reason: SkipReason) -> SkippedOrder {
    SkippedOrder {
        order_id: order_id.to_string(),
        reason,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
