//! # Order Repository
//!
//! Database operations for orders.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert() → Order { status: new, finished_at: NULL }            │
//! │         (same transaction as product::reserve_stock)                   │
//! │                                                                         │
//! │  2. FINISH (once)                                                      │
//! │     └── mark_finished() → Order { status: finished, finished_at: t }   │
//! │         UPDATE ... WHERE status = 'new'                                │
//! │                                                                         │
//! │  There is no way back: no reopen, no cancel.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{FinishedLine, Order, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Lists orders, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<OrderStatus>) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, product_id, quantity, deadline, price_type, price,
                status, finished_at, created_at, updated_at
            FROM orders
            WHERE ?1 IS NULL OR status = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Counts orders in a status.
    pub async fn count_by_status(&self, status: OrderStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Fetches an order on an existing connection.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT
            id, product_id, quantity, deadline, price_type, price,
            status, finished_at, created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(order)
}

/// Inserts an order row.
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, product_id = %order.product_id, quantity = order.quantity, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, product_id, quantity, deadline, price_type, price,
            status, finished_at, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&order.id)
    .bind(&order.product_id)
    .bind(order.quantity)
    .bind(order.deadline)
    .bind(order.price_type)
    .bind(order.price)
    .bind(order.status)
    .bind(order.finished_at)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Moves an order from `new` to `finished` at `at`.
///
/// Returns `false` when nothing was written: the order is missing or was
/// already finished. Two concurrent calls for the same order cannot both
/// return `true`.
pub async fn mark_finished(
    conn: &mut SqliteConnection,
    id: &str,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, finished_at = %at, "Finishing order");

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = 'finished',
            finished_at = ?2,
            updated_at = ?2
        WHERE id = ?1 AND status = 'new'
        "#,
    )
    .bind(id)
    .bind(at)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Finished orders with `start <= finished_at < end`, joined with their
/// product's current arrival price.
pub async fn finished_lines(
    conn: &mut SqliteConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> DbResult<Vec<FinishedLine>> {
    let lines = sqlx::query_as::<_, FinishedLine>(
        r#"
        SELECT
            o.id AS order_id,
            o.price,
            o.quantity,
            p.arrival_price
        FROM orders o
        INNER JOIN products p ON p.id = o.product_id
        WHERE o.status = 'finished'
        AND o.finished_at >= ?1
        AND o.finished_at < ?2
        ORDER BY o.finished_at
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}
