//! # Daily Report Aggregator
//!
//! Recomputes one business day's report from scratch and upserts it.
//!
//! ## Rebuild Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rebuild_report(D)                                                      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. claim row D            ← write lock taken here                    │
//! │    2. (start, end) = calendar.bounds(D)                                 │
//! │    3. finished orders in [start, end) ⋈ products.arrival_price          │
//! │    4. expenses in [start, end)                                          │
//! │    5. DailyTotals::compute  (pure, checked; overflow rolls back)        │
//! │    6. overwrite row D                                                   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Nothing is accumulated: running it twice gives the same row.           │
//! │  Orders and expenses are only read.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbResult, ServiceResult};
use crate::repository::{expense, order, report};
use stockroom_core::validation::validate_date_range;
use stockroom_core::{BusinessCalendar, DailyTotals, Report};

/// Something that can rebuild the report for a business date.
///
/// The fulfillment service depends on this rather than on
/// [`ReportAggregator`] directly, so tests can count or fail rebuilds.
#[async_trait]
pub trait ReportRebuilder: Send + Sync {
    async fn rebuild_report(&self, date: NaiveDate) -> DbResult<Report>;
}

/// Rebuilds report rows from orders and expenses.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    pool: SqlitePool,
    calendar: BusinessCalendar,
}

impl ReportAggregator {
    pub fn new(pool: SqlitePool, calendar: BusinessCalendar) -> Self {
        ReportAggregator { pool, calendar }
    }

    pub fn calendar(&self) -> BusinessCalendar {
        self.calendar
    }

    /// Rebuilds every date from `from` to `to`, inclusive.
    ///
    /// Stops at the first failure; reports already rebuilt stay rebuilt.
    pub async fn rebuild_range(&self, from: NaiveDate, to: NaiveDate) -> ServiceResult<Vec<Report>> {
        validate_date_range(from, to)?;

        let mut reports = Vec::new();
        for date in BusinessCalendar::days(from, to) {
            reports.push(self.rebuild_report(date).await?);
        }

        info!(%from, %to, count = reports.len(), "Report range rebuilt");
        Ok(reports)
    }

    /// Recomputes and upserts the report for `date`.
    pub async fn rebuild_report(&self, date: NaiveDate) -> DbResult<Report> {
        let (start, end) = self.calendar.bounds(date)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        report::claim(&mut tx, date, now).await?;

        let lines = order::finished_lines(&mut tx, start, end).await?;
        let expenses = expense::between(&mut tx, start, end).await?;
        debug!(
            %date,
            orders = lines.len(),
            expenses = expenses.len(),
            "Aggregating day"
        );

        let totals = DailyTotals::compute(&lines, &expenses)?;
        let row = Report::from_totals(date, &totals, now);
        report::save(&mut tx, &row).await?;

        tx.commit().await?;

        info!(
            %date,
            selling = row.selling,
            benefit = row.benefit,
            expenses = row.expenses,
            order_count = row.order_count,
            "Report rebuilt"
        );
        Ok(row)
    }
}

#[async_trait]
impl ReportRebuilder for ReportAggregator {
    async fn rebuild_report(&self, date: NaiveDate) -> DbResult<Report> {
        ReportAggregator::rebuild_report(self, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::product;
    use crate::{Database, DbConfig};
    use chrono::{DateTime, Duration, TimeZone};
    use stockroom_core::{Category, Expense, Order, OrderRequest, PriceType, Product};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    async fn setup() -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.categories()
            .insert(&Category::new("c-1", "Coffee").unwrap())
            .await
            .unwrap();

        let created = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let p = Product {
            id: "p-1".to_string(),
            name: "Coffee Beans 1kg".to_string(),
            category_id: "c-1".to_string(),
            arrival_price: 100,
            sales_price: 150,
            kaspi_price: 165,
            quantity: 100,
            created_at: created,
            updated_at: created,
        };
        let mut conn = db.pool().acquire().await.unwrap();
        product::insert(&mut conn, &p).await.unwrap();
        (db, p)
    }

    async fn finished_order(db: &Database, p: &Product, id: &str, qty: i64, at: DateTime<Utc>) {
        let request = OrderRequest {
            product_id: p.id.clone(),
            quantity: qty,
            deadline: day(10),
            price_type: PriceType::Sales,
        };
        let o = Order::place(id, &request, p, at - Duration::hours(1));
        let mut conn = db.pool().acquire().await.unwrap();
        order::insert(&mut conn, &o).await.unwrap();
        assert!(order::mark_finished(&mut conn, id, at).await.unwrap());
    }

    async fn expense_at(db: &Database, p: &Product, id: &str, qty: i64, at: DateTime<Utc>) {
        let mut conn = db.pool().acquire().await.unwrap();
        expense::insert(&mut conn, &Expense::for_stocking(id, p, qty, at).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_day_reports_zeros() {
        let (db, _) = setup().await;
        let report = db.aggregator().rebuild_report(day(2)).await.unwrap();

        assert_eq!((report.selling, report.benefit, report.expenses), (0, 0, 0));
        assert_eq!(report.order_count, 0);
        assert_eq!(db.reports().get(day(2)).await.unwrap(), Some(report));
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let (db, p) = setup().await;
        // 10:00 at +05:00 on 2026-03-02
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap();
        finished_order(&db, &p, "o-1", 4, at).await;

        let agg = db.aggregator();
        let first = agg.rebuild_report(day(2)).await.unwrap();
        let second = agg.rebuild_report(day(2)).await.unwrap();

        assert!(first.same_figures(&second));
        assert_eq!(first.selling, 600);
        assert_eq!(db.reports().range(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_days_do_not_leak() {
        let (db, p) = setup().await;
        let cal = db.calendar();
        let (start, end) = cal.bounds(day(2)).unwrap();

        finished_order(&db, &p, "o-prev", 1, start - Duration::seconds(1)).await;
        finished_order(&db, &p, "o-in", 2, start).await;
        finished_order(&db, &p, "o-next", 3, end).await;
        expense_at(&db, &p, "e-prev", 5, start - Duration::minutes(1)).await;
        expense_at(&db, &p, "e-in", 1, end - Duration::seconds(1)).await;

        let report = db.aggregator().rebuild_report(day(2)).await.unwrap();
        assert_eq!(report.order_count, 1);
        assert_eq!(report.selling, 300);
        assert_eq!(report.benefit, 100);
        assert_eq!(report.expenses, 100);
    }

    #[tokio::test]
    async fn test_rebuild_reflects_current_arrival_price() {
        let (db, p) = setup().await;
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap();
        finished_order(&db, &p, "o-1", 4, at).await;

        db.products().update_prices("p-1", 120, 150, 165).await.unwrap();
        let report = db.aggregator().rebuild_report(day(2)).await.unwrap();

        assert_eq!(report.selling, 600);
        assert_eq!(report.benefit, 600 - 480);
    }

    #[tokio::test]
    async fn test_rebuild_overwrites_previous_row() {
        let (db, p) = setup().await;
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap();
        let agg = db.aggregator();

        finished_order(&db, &p, "o-1", 1, at).await;
        assert_eq!(agg.rebuild_report(day(2)).await.unwrap().selling, 150);

        finished_order(&db, &p, "o-2", 2, at + Duration::hours(1)).await;
        let report = agg.rebuild_report(day(2)).await.unwrap();
        assert_eq!(report.selling, 450);
        assert_eq!(report.order_count, 2);
    }

    #[tokio::test]
    async fn test_rebuild_range() {
        let (db, p) = setup().await;
        finished_order(&db, &p, "o-1", 1, Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 0).unwrap()).await;
        finished_order(&db, &p, "o-3", 2, Utc.with_ymd_and_hms(2026, 3, 3, 5, 0, 0).unwrap()).await;

        let reports = db.aggregator().rebuild_range(day(1), day(3)).await.unwrap();
        let selling: Vec<_> = reports.iter().map(|r| (r.date, r.selling)).collect();
        assert_eq!(selling, vec![(day(1), 150), (day(2), 0), (day(3), 300)]);

        assert!(db.aggregator().rebuild_range(day(3), day(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_date_at_calendar_edge_is_rejected() {
        let (db, _) = setup().await;
        let err = db.aggregator().rebuild_report(NaiveDate::MAX).await.unwrap_err();
        assert!(matches!(err, DbError::OutOfRange(_)));
        assert!(db.reports().range(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_totals_roll_back() {
        let (db, p) = setup().await;
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap();
        let mut pricey = p.clone();
        pricey.sales_price = i64::MAX / 2 + 1;

        finished_order(&db, &pricey, "o-1", 1, at).await;
        finished_order(&db, &pricey, "o-2", 1, at + Duration::minutes(5)).await;

        let err = db.aggregator().rebuild_report(day(2)).await.unwrap_err();
        assert!(matches!(err, DbError::OutOfRange(_)));
        assert_eq!(db.reports().get(day(2)).await.unwrap(), None);
    }
}
