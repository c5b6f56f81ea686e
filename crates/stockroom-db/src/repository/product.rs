//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, check in Rust, write                               │
//! │     SELECT quantity ... → 6                                         │
//! │     (another order takes 6 here)                                    │
//! │     UPDATE products SET quantity = 6 - 4   → stock is now wrong     │
//! │                                                                     │
//! │  ✅ CORRECT: conditional delta in one statement                     │
//! │     UPDATE products SET quantity = quantity - 4                     │
//! │     WHERE id = ? AND quantity >= 4                                  │
//! │                                                                     │
//! │  rows_affected = 0 means "not enough" (or no such product), and     │
//! │  nothing was written.                                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Lists products by name, optionally within one category.
    pub async fn list(&self, category_id: Option<&str>) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, category_id,
                arrival_price, sales_price, kaspi_price,
                quantity, created_at, updated_at
            FROM products
            WHERE ?1 IS NULL OR category_id = ?1
            ORDER BY name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Updates the three prices. Stock and existing orders are untouched.
    pub async fn update_prices(
        &self,
        id: &str,
        arrival_price: i64,
        sales_price: i64,
        kaspi_price: i64,
    ) -> DbResult<()> {
        debug!(id = %id, arrival_price, sales_price, kaspi_price, "Updating prices");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                arrival_price = ?2,
                sales_price = ?3,
                kaspi_price = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(arrival_price)
        .bind(sales_price)
        .bind(kaspi_price)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Fetches a product on an existing connection.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT
            id, name, category_id,
            arrival_price, sales_price, kaspi_price,
            quantity, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Inserts a product row.
pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, category_id,
            arrival_price, sales_price, kaspi_price,
            quantity, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.category_id)
    .bind(product.arrival_price)
    .bind(product.sales_price)
    .bind(product.kaspi_price)
    .bind(product.quantity)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Takes `quantity` units out of stock if at least that many are on hand.
///
/// Returns `false` when nothing was written: the product is missing or has
/// too little stock. Inside a transaction this is the statement that takes
/// SQLite's write lock.
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, quantity, "Reserving stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Adds `quantity` units to stock. Returns `false` if the product is missing.
pub async fn add_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, quantity, "Adding stock");

    let result = sqlx::query(
        "UPDATE products SET quantity = quantity + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
