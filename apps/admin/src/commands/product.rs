//! # Product Commands
//!
//! Catalog maintenance. Stock only ever goes up here (initial stock and
//! restocks); orders are the only thing that takes it down.
//!
//! ```text
//! product add --quantity 10 --arrival 100
//!      │
//!      ▼
//! CatalogService::create_product
//!      ├── products   += { quantity: 10 }
//!      └── expenses   += { amount: 1000 }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppConfig, AppState};
use stockroom_core::{NewProduct, Product};

/// Product as printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub arrival_price: i64,
    pub sales_price: i64,
    pub kaspi_price: i64,
    pub quantity: i64,
    /// `sales_price` with the currency symbol, e.g. "1 500 ₸".
    pub sales_price_display: String,
    pub kaspi_price_display: String,
    pub updated_at: DateTime<Utc>,
}

impl ProductDto {
    pub fn new(p: Product, config: &AppConfig) -> Self {
        ProductDto {
            sales_price_display: config.format_currency(p.sales_price),
            kaspi_price_display: config.format_currency(p.kaspi_price),
            id: p.id,
            name: p.name,
            category_id: p.category_id,
            arrival_price: p.arrival_price,
            sales_price: p.sales_price,
            kaspi_price: p.kaspi_price,
            quantity: p.quantity,
            updated_at: p.updated_at,
        }
    }
}

/// `stockroom product add ...`
pub async fn add(state: &AppState, input: NewProduct) -> Result<ProductDto, ApiError> {
    let product = state.db().catalog().create_product(input).await?;
    Ok(ProductDto::new(product, state.config()))
}

/// `stockroom product list [--category <id>]`
pub async fn list(state: &AppState, category_id: Option<&str>) -> Result<Vec<ProductDto>, ApiError> {
    let products = state.db().products().list(category_id).await?;
    debug!(count = products.len(), ?category_id, "Listed products");
    Ok(products
        .into_iter()
        .map(|p| ProductDto::new(p, state.config()))
        .collect())
}

/// `stockroom product show <id>`
pub async fn show(state: &AppState, id: &str) -> Result<ProductDto, ApiError> {
    match state.db().products().get_by_id(id).await? {
        Some(product) => Ok(ProductDto::new(product, state.config())),
        None => Err(ApiError::not_found("Product", id)),
    }
}

/// `stockroom product restock <id> <quantity>`
pub async fn restock(state: &AppState, id: &str, quantity: i64) -> Result<ProductDto, ApiError> {
    let product = state.db().catalog().restock_product(id, quantity).await?;
    Ok(ProductDto::new(product, state.config()))
}

/// `stockroom product price <id> --arrival <p> --sales <p> --kaspi <p>`
pub async fn set_prices(
    state: &AppState,
    id: &str,
    arrival_price: i64,
    sales_price: i64,
    kaspi_price: i64,
) -> Result<ProductDto, ApiError> {
    let product = state
        .db()
        .catalog()
        .update_prices(id, arrival_price, sales_price, kaspi_price)
        .await?;
    Ok(ProductDto::new(product, state.config()))
}
