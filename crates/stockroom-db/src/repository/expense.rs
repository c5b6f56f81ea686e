//! # Expense Repository
//!
//! Expenses are append-only: one row per stocking event, never updated.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{BusinessCalendar, Expense};

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
    calendar: BusinessCalendar,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool, calendar: BusinessCalendar) -> Self {
        ExpenseRepository { pool, calendar }
    }

    /// Expenses incurred on a business date.
    pub async fn list_for_date(&self, date: NaiveDate) -> DbResult<Vec<Expense>> {
        let (start, end) = self.calendar.bounds(date)?;
        let mut conn = self.pool.acquire().await?;
        between(&mut conn, start, end).await
    }

    /// Every expense recorded for a product, oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, product_id, quantity, amount, incurred_at
            FROM expenses
            WHERE product_id = ?1
            ORDER BY incurred_at
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}

/// Records an expense.
pub async fn insert(conn: &mut SqliteConnection, expense: &Expense) -> DbResult<()> {
    debug!(
        id = %expense.id,
        product_id = %expense.product_id,
        amount = expense.amount,
        "Recording expense"
    );

    sqlx::query(
        r#"
        INSERT INTO expenses (id, product_id, quantity, amount, incurred_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&expense.id)
    .bind(&expense.product_id)
    .bind(expense.quantity)
    .bind(expense.amount)
    .bind(expense.incurred_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Expenses with `start <= incurred_at < end`.
pub async fn between(
    conn: &mut SqliteConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> DbResult<Vec<Expense>> {
    let expenses = sqlx::query_as::<_, Expense>(
        r#"
        SELECT id, product_id, quantity, amount, incurred_at
        FROM expenses
        WHERE incurred_at >= ?1 AND incurred_at < ?2
        ORDER BY incurred_at
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;

    Ok(expenses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::generate_id;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use stockroom_core::{NewProduct, Product};

    async fn product(db: &Database) -> Product {
        let category = db.catalog().create_category("Tea").await.unwrap();
        db.catalog()
            .create_product(NewProduct {
                name: "Green Tea".to_string(),
                category_id: category.id,
                arrival_price: 10,
                sales_price: 15,
                kaspi_price: 16,
                quantity: 0,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_for_date_uses_business_day_bounds() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = product(&db).await;

        // 2025-03-02 at +05:00 is [2025-03-01T19:00Z, 2025-03-02T19:00Z)
        let instants = [
            Utc.with_ymd_and_hms(2025, 3, 1, 18, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 2, 18, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 2, 19, 0, 0).unwrap(),
        ];
        let mut conn = db.pool().acquire().await.unwrap();
        for (n, at) in instants.iter().enumerate() {
            let expense = Expense::for_stocking(generate_id(), &p, n as i64 + 1, *at).unwrap();
            insert(&mut conn, &expense).await.unwrap();
        }
        drop(conn);

        let day = db
            .expenses()
            .list_for_date(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap())
            .await
            .unwrap();
        let quantities: Vec<_> = day.iter().map(|e| e.quantity).collect();
        assert_eq!(quantities, vec![2, 3]);
        assert_eq!(db.expenses().list_for_product(&p.id).await.unwrap().len(), 4);
    }
}
