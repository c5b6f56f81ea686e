//! # Catalog & Stocking
//!
//! Operator-facing catalog operations. Every stocking event (a new product
//! with initial stock, or a restock) writes the stock change and its
//! Expense in one transaction.
//!
//! ```text
//! create_product(qty = 10, arrival = 100)
//!      │
//!      ▼
//! BEGIN
//!   category exists?  ── no ──► CategoryNotFound (rollback)
//!   INSERT product
//!   INSERT expense { amount: 1000, incurred_at: created_at }
//! COMMIT
//! ```
//!
//! Stocking does not rebuild reports. The next order completion on the same
//! date, or an explicit `rebuild_report`, picks the expense up.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, ServiceResult};
use crate::repository::category::{self, CategoryRepository};
use crate::repository::product::{self, ProductRepository};
use crate::repository::{expense, generate_id};
use stockroom_core::validation::{validate_price, validate_quantity};
use stockroom_core::{Category, CoreError, Expense, NewProduct, Product};

/// Catalog and stocking operations.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogService { pool }
    }

    /// Creates a category with a unique name.
    pub async fn create_category(&self, name: &str) -> ServiceResult<Category> {
        let category = Category::new(generate_id(), name)?;
        CategoryRepository::new(self.pool.clone())
            .insert(&category)
            .await?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Creates a product, recording its initial stock as an expense.
    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        input.validate()?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if category::fetch(&mut tx, &input.category_id).await?.is_none() {
            warn!(category_id = %input.category_id, "Product rejected: unknown category");
            return Err(CoreError::CategoryNotFound(input.category_id).into());
        }

        let product = input.into_product(generate_id(), now);
        product::insert(&mut tx, &product).await?;

        if product.quantity > 0 {
            let stocking = Expense::for_stocking(generate_id(), &product, product.quantity, now)?;
            expense::insert(&mut tx, &stocking).await?;
        }

        tx.commit().await?;

        info!(
            id = %product.id,
            name = %product.name,
            quantity = product.quantity,
            "Product created"
        );
        Ok(product)
    }

    /// Adds stock and records the matching expense.
    pub async fn restock_product(&self, product_id: &str, quantity: i64) -> ServiceResult<Product> {
        validate_quantity(quantity)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if !product::add_stock(&mut tx, product_id, quantity, now).await? {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let restocked = product::fetch(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::TransactionFailed(format!("product {} vanished", product_id)))?;

        let stocking = Expense::for_stocking(generate_id(), &restocked, quantity, now)?;
        expense::insert(&mut tx, &stocking).await?;

        tx.commit().await?;

        info!(
            id = %product_id,
            added = quantity,
            quantity = restocked.quantity,
            expense = stocking.amount,
            "Product restocked"
        );
        Ok(restocked)
    }

    /// Changes a product's prices. Orders already placed keep theirs.
    pub async fn update_prices(
        &self,
        product_id: &str,
        arrival_price: i64,
        sales_price: i64,
        kaspi_price: i64,
    ) -> ServiceResult<Product> {
        validate_price("arrival_price", arrival_price)?;
        validate_price("sales_price", sales_price)?;
        validate_price("kaspi_price", kaspi_price)?;

        let repo = ProductRepository::new(self.pool.clone());
        match repo
            .update_prices(product_id, arrival_price, sales_price, kaspi_price)
            .await
        {
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::ProductNotFound(product_id.to_string()).into())
            }
            other => other?,
        }

        let updated = repo
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        info!(id = %product_id, arrival_price, sales_price, kaspi_price, "Prices updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use stockroom_core::{MAX_LINE_QUANTITY, MAX_PRICE};
    use crate::{Database, DbConfig};

    async fn setup() -> (Database, Category) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db.catalog().create_category("Coffee").await.unwrap();
        (db, category)
    }

    fn new_product(category_id: &str, quantity: i64) -> NewProduct {
        NewProduct {
            name: "Coffee Beans 1kg".to_string(),
            category_id: category_id.to_string(),
            arrival_price: 100,
            sales_price: 150,
            kaspi_price: 165,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_product_records_stocking_expense() {
        let (db, category) = setup().await;
        let product = db
            .catalog()
            .create_product(new_product(&category.id, 10))
            .await
            .unwrap();

        let expenses = db.expenses().list_for_product(&product.id).await.unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].amount, 1000);
        assert_eq!(expenses[0].quantity, 10);
        assert_eq!(expenses[0].incurred_at, product.created_at);
    }

    #[tokio::test]
    async fn test_create_product_without_stock_has_no_expense() {
        let (db, category) = setup().await;
        let product = db
            .catalog()
            .create_product(new_product(&category.id, 0))
            .await
            .unwrap();

        assert!(db.expenses().list_for_product(&product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_product_unknown_category() {
        let (db, _) = setup().await;
        let err = db
            .catalog()
            .create_product(new_product("00000000-0000-4000-8000-000000000000", 5))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Rejected(CoreError::CategoryNotFound(_))));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_product_validation() {
        let (db, category) = setup().await;
        let mut input = new_product(&category.id, 5);
        input.sales_price = -1;

        let err = db.catalog().create_product(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_price_past_limit_is_rejected_before_any_write() {
        let (db, category) = setup().await;
        let catalog = db.catalog();

        let mut input = new_product(&category.id, 2);
        input.arrival_price = 4_611_686_018_427_387_904;
        assert!(matches!(
            catalog.create_product(input).await,
            Err(ServiceError::Rejected(CoreError::Validation(_)))
        ));
        assert_eq!(db.products().count().await.unwrap(), 0);

        let product = catalog.create_product(new_product(&category.id, 2)).await.unwrap();
        assert!(matches!(
            catalog.update_prices(&product.id, MAX_PRICE + 1, 150, 165).await,
            Err(ServiceError::Rejected(CoreError::Validation(_)))
        ));

        let at_limit = catalog
            .update_prices(&product.id, MAX_PRICE, MAX_PRICE, MAX_PRICE)
            .await
            .unwrap();
        let restocked = catalog
            .restock_product(&at_limit.id, MAX_LINE_QUANTITY)
            .await
            .unwrap();
        assert_eq!(restocked.quantity, 2 + MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn test_restock_adds_stock_and_expense() {
        let (db, category) = setup().await;
        let catalog = db.catalog();
        let product = catalog.create_product(new_product(&category.id, 10)).await.unwrap();

        let restocked = catalog.restock_product(&product.id, 5).await.unwrap();
        assert_eq!(restocked.quantity, 15);

        let amounts: Vec<_> = db
            .expenses()
            .list_for_product(&product.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.amount)
            .collect();
        assert_eq!(amounts, vec![1000, 500]);
    }

    #[tokio::test]
    async fn test_restock_rejections() {
        let (db, category) = setup().await;
        let catalog = db.catalog();
        let product = catalog.create_product(new_product(&category.id, 1)).await.unwrap();

        assert!(matches!(
            catalog.restock_product(&product.id, 0).await,
            Err(ServiceError::Rejected(CoreError::Validation(_)))
        ));
        assert!(matches!(
            catalog.restock_product("missing", 3).await,
            Err(ServiceError::Rejected(CoreError::ProductNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_prices() {
        let (db, category) = setup().await;
        let catalog = db.catalog();
        let product = catalog.create_product(new_product(&category.id, 1)).await.unwrap();

        let updated = catalog.update_prices(&product.id, 90, 140, 155).await.unwrap();
        assert_eq!(updated.sales_price, 140);

        assert!(matches!(
            catalog.update_prices("missing", 1, 1, 1).await,
            Err(ServiceError::Rejected(CoreError::ProductNotFound(_)))
        ));
    }
}
