//! End-to-end order flows against a real database and the real aggregator.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::PathBuf;
use stockroom_core::{CoreError, Expense, NewProduct, OrderRequest, OrderStatus, PriceType, Product};
use stockroom_db::repository::expense;
use stockroom_db::{Database, DbConfig, DbError, ServiceError};

// =============================================================================
// Helpers
// =============================================================================

/// 2025-03-02 at +05:00 starts at 2025-03-01T19:00:00Z.
fn day_d() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
}

fn during_d(hour_utc: u32) -> DateTime<Utc> {
    // 19:00Z on Mar 1 .. 18:59Z on Mar 2 are all Mar 2 locally
    if hour_utc >= 19 {
        Utc.with_ymd_and_hms(2025, 3, 1, hour_utc, 0, 0).unwrap()
    } else {
        Utc.with_ymd_and_hms(2025, 3, 2, hour_utc, 0, 0).unwrap()
    }
}

async fn product_p(db: &Database, quantity: i64) -> Product {
    let category = db.catalog().create_category("Coffee").await.unwrap();
    db.catalog()
        .create_product(NewProduct {
            name: "P".to_string(),
            category_id: category.id,
            arrival_price: 100,
            sales_price: 150,
            kaspi_price: 170,
            quantity,
        })
        .await
        .unwrap()
}

fn order_request(product: &Product, quantity: i64) -> OrderRequest {
    OrderRequest {
        product_id: product.id.clone(),
        quantity,
        deadline: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        price_type: PriceType::Sales,
    }
}

async fn record_expense(db: &Database, product: &Product, amount: i64, at: DateTime<Utc>) {
    let mut conn = db.pool().acquire().await.unwrap();
    expense::insert(
        &mut conn,
        &Expense {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            quantity: 1,
            amount,
            incurred_at: at,
        },
    )
    .await
    .unwrap();
}

struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("stockroom-test-{}.db", uuid::Uuid::new_v4()));
        TempDb { path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

// =============================================================================
// Scenario from the product sheet
// =============================================================================

#[tokio::test]
async fn test_order_to_report_scenario() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let p = product_p(&db, 10).await;
    let fulfillment = db.fulfillment();

    // order 4 → price 150, stock 6
    let first = fulfillment.create_order(&order_request(&p, 4)).await.unwrap();
    assert_eq!(first.price, 150);
    assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().quantity, 6);

    // order 7 → InsufficientStock(available 6), stock still 6
    match fulfillment.create_order(&order_request(&p, 7)).await {
        Err(ServiceError::Rejected(CoreError::InsufficientStock { available, .. })) => {
            assert_eq!(available, 6)
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }
    assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().quantity, 6);
    assert_eq!(db.orders().list(None).await.unwrap().len(), 1);

    // 50 of expenses on D, then finish the first order on D
    record_expense(&db, &p, 50, during_d(20)).await;
    let finished = fulfillment.mark_finished_at(&first.id, during_d(9)).await.unwrap();
    assert_eq!(finished.status, OrderStatus::Finished);

    let report = db.reports().get(day_d()).await.unwrap().unwrap();
    assert_eq!(report.selling, 600);
    assert_eq!(report.benefit, 200);
    assert_eq!(report.expenses, 50);
    assert_eq!(report.order_count, 1);
}

#[tokio::test]
async fn test_other_days_are_not_affected() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let p = product_p(&db, 10).await;
    let fulfillment = db.fulfillment();

    let on_d = fulfillment.create_order(&order_request(&p, 1)).await.unwrap();
    let next_day = fulfillment.create_order(&order_request(&p, 2)).await.unwrap();

    fulfillment.mark_finished_at(&on_d.id, during_d(10)).await.unwrap();
    let before = db.reports().get(day_d()).await.unwrap().unwrap();

    // 19:00Z on Mar 2 is already Mar 3 locally
    let d_plus_one = Utc.with_ymd_and_hms(2025, 3, 2, 19, 0, 0).unwrap();
    fulfillment.mark_finished_at(&next_day.id, d_plus_one).await.unwrap();

    let after = db.aggregator().rebuild_report(day_d()).await.unwrap();
    assert!(before.same_figures(&after));
    assert_eq!(after.selling, 150);

    let next = db
        .reports()
        .get(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.selling, 300);
}

#[tokio::test]
async fn test_finishing_twice_leaves_report_unchanged() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let p = product_p(&db, 10).await;
    let fulfillment = db.fulfillment();

    let order = fulfillment.create_order(&order_request(&p, 3)).await.unwrap();
    fulfillment.mark_finished_at(&order.id, during_d(8)).await.unwrap();
    let report = db.reports().get(day_d()).await.unwrap().unwrap();

    let err = fulfillment
        .mark_finished_at(&order.id, during_d(12))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Rejected(CoreError::AlreadyFinished { .. })));

    let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.finished_at, Some(during_d(8)));
    assert_eq!(db.reports().get(day_d()).await.unwrap().unwrap(), report);
}

#[tokio::test]
async fn test_price_change_after_ordering_does_not_reprice() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let p = product_p(&db, 10).await;
    let fulfillment = db.fulfillment();

    let order = fulfillment.create_order(&order_request(&p, 2)).await.unwrap();
    assert_eq!(order.price, 150);

    let repriced = db.catalog().update_prices(&p.id, 100, 999, 170).await.unwrap();
    assert_eq!(repriced.sales_price, 999);

    fulfillment.mark_finished_at(&order.id, during_d(9)).await.unwrap();

    let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.price, 150);

    let report = db.reports().get(day_d()).await.unwrap().unwrap();
    assert_eq!(report.selling, 300);
    assert_eq!(report.benefit, 300 - 200);

    // A later order picks up the new price
    let later = fulfillment.create_order(&order_request(&p, 1)).await.unwrap();
    assert_eq!(later.price, 999);
}

#[tokio::test]
async fn test_overflowing_day_leaves_report_stale_not_crashed() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let p = product_p(&db, 10).await;
    let fulfillment = db.fulfillment();

    let first = fulfillment.create_order(&order_request(&p, 1)).await.unwrap();
    let second = fulfillment.create_order(&order_request(&p, 1)).await.unwrap();
    sqlx::query("UPDATE orders SET price = ?1")
        .bind(i64::MAX / 2 + 1)
        .execute(db.pool())
        .await
        .unwrap();

    fulfillment.mark_finished_at(&first.id, during_d(9)).await.unwrap();
    let before = db.reports().get(day_d()).await.unwrap().unwrap();
    assert_eq!(before.selling, i64::MAX / 2 + 1);

    match fulfillment.mark_finished_at(&second.id, during_d(10)).await {
        Err(ServiceError::ReportRebuild { date, source, .. }) => {
            assert_eq!(date, day_d());
            assert!(matches!(source, DbError::OutOfRange(_)));
        }
        other => panic!("expected ReportRebuild, got {:?}", other),
    }

    let stored = db.orders().get_by_id(&second.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Finished);
    assert_eq!(db.reports().get(day_d()).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn test_aggregation_failure_keeps_order_finished() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let p = product_p(&db, 10).await;
    let order = db.fulfillment().create_order(&order_request(&p, 2)).await.unwrap();

    sqlx::query("DROP TABLE reports").execute(db.pool()).await.unwrap();

    let err = db
        .fulfillment()
        .mark_finished_at(&order.id, during_d(9))
        .await
        .unwrap_err();

    assert!(err.is_committed());
    assert_eq!(err.stale_dates(), vec![day_d()]);

    let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Finished);
    assert_eq!(stored.finished_at, Some(during_d(9)));
}

#[tokio::test]
async fn test_bulk_finish_with_real_aggregator() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let p = product_p(&db, 10).await;
    let fulfillment = db.fulfillment();

    let a = fulfillment.create_order(&order_request(&p, 1)).await.unwrap();
    let b = fulfillment.create_order(&order_request(&p, 2)).await.unwrap();

    let batch = fulfillment
        .mark_finished_many_at(&[a.id.as_str(), b.id.as_str(), "nope"], during_d(11))
        .await
        .unwrap();

    assert_eq!(batch.finished.len(), 2);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.reports.len(), 1);
    assert_eq!(batch.reports[0].selling, 450);
    assert_eq!(batch.reports[0].order_count, 2);
}

// =============================================================================
// Concurrency (file database, several connections)
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_cannot_oversell() {
    let tmp = TempDb::new();
    let db = Database::new(DbConfig::new(&tmp.path).max_connections(4))
        .await
        .unwrap();
    let p = product_p(&db, 10).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let db = db.clone();
        let request = order_request(&p, 6);
        handles.push(tokio::spawn(async move {
            db.fulfillment().create_order(&request).await
        }));
    }

    let mut placed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(ServiceError::Rejected(CoreError::InsufficientStock { .. })) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(placed, 1);
    assert_eq!(rejected, 3);
    assert_eq!(db.products().get_by_id(&p.id).await.unwrap().unwrap().quantity, 4);
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finishes_produce_complete_report() {
    let tmp = TempDb::new();
    let db = Database::new(DbConfig::new(&tmp.path).max_connections(4))
        .await
        .unwrap();
    let p = product_p(&db, 100).await;

    let mut ids = Vec::new();
    for _ in 0..6 {
        ids.push(db.fulfillment().create_order(&order_request(&p, 2)).await.unwrap().id);
    }

    let mut handles = Vec::new();
    for (n, id) in ids.into_iter().enumerate() {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.fulfillment().mark_finished_at(&id, during_d(n as u32 + 1)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let report = db.reports().get(day_d()).await.unwrap().unwrap();
    assert_eq!(report.order_count, 6);
    assert_eq!(report.selling, 6 * 2 * 150);
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_submission_finishes_once() {
    let tmp = TempDb::new();
    let db = Database::new(DbConfig::new(&tmp.path).max_connections(4))
        .await
        .unwrap();
    let p = product_p(&db, 10).await;
    let order = db.fulfillment().create_order(&order_request(&p, 1)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..3 {
        let db = db.clone();
        let id = order.id.clone();
        handles.push(tokio::spawn(async move {
            db.fulfillment().mark_finished_at(&id, during_d(9)).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(ServiceError::Rejected(CoreError::AlreadyFinished { .. })) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(ok, 1);
    db.close().await;
}
