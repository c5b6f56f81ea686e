//! # Commands
//!
//! One function per CLI command. Each takes the [`AppState`], calls exactly
//! one service or repository, and returns a serializable DTO.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch)
//! ├── category.rs  ◄─── category add / list
//! ├── product.rs   ◄─── product add / list / show / restock / price
//! ├── order.rs     ◄─── order create / finish / list / show / count
//! ├── report.rs    ◄─── report rebuild / show / list
//! └── expense.rs   ◄─── expense list (by date or by product)
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command::OrderCreate(request)                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  order::create(&state, request)                                        │
//! │      -> Result<OrderDto, ApiError>                                     │
//! │         │                                                               │
//! │         ▼ (serde_json)                                                  │
//! │  stdout: { "id": "...", "price": 150, "status": "new", ... }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod category;
pub mod expense;
pub mod order;
pub mod product;
pub mod report;

use serde::Serialize;
use serde_json::Value;

use crate::cli::{Command, USAGE};
use crate::error::ApiError;
use crate::state::AppState;

/// Runs one command and returns its JSON rendering.
pub async fn dispatch(state: &AppState, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::Help => Ok(Value::String(USAGE.to_string())),

        Command::CategoryAdd { name } => to_json(category::add(state, &name).await?),
        Command::CategoryList => to_json(category::list(state).await?),

        Command::ProductAdd(input) => to_json(product::add(state, input).await?),
        Command::ProductList { category_id } => {
            to_json(product::list(state, category_id.as_deref()).await?)
        }
        Command::ProductShow { id } => to_json(product::show(state, &id).await?),
        Command::ProductRestock { id, quantity } => {
            to_json(product::restock(state, &id, quantity).await?)
        }
        Command::ProductPrice {
            id,
            arrival_price,
            sales_price,
            kaspi_price,
        } => to_json(product::set_prices(state, &id, arrival_price, sales_price, kaspi_price).await?),

        Command::OrderCreate(request) => to_json(order::create(state, request).await?),
        Command::OrderFinish { ids } => order::finish(state, &ids).await,
        Command::OrderList { status } => to_json(order::list(state, status).await?),
        Command::OrderShow { id } => to_json(order::show(state, &id).await?),
        Command::OrderCount => to_json(order::count(state).await?),

        Command::ReportRebuild { from, to } => match to {
            Some(to) => to_json(report::rebuild_range(state, from, to).await?),
            None => to_json(report::rebuild(state, from).await?),
        },
        Command::ReportShow { date } => to_json(report::show(state, date).await?),
        Command::ReportList { from, to } => to_json(report::list(state, from, to).await?),

        Command::ExpenseList { date } => to_json(expense::list(state, date).await?),
        Command::ExpenseListProduct { product_id } => {
            to_json(expense::list_for_product(state, &product_id).await?)
        }
    }
}

pub(crate) fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("cannot render output: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::test_support::state;
    use super::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    fn parse(line: &str) -> Command {
        let args: Vec<&str> = line.split_whitespace().collect();
        Command::parse(&args).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_end_to_end() {
        let state = state().await;

        let category = dispatch(&state, parse("category add Coffee")).await.unwrap();
        let category_id = category["id"].as_str().unwrap().to_string();

        let product = dispatch(
            &state,
            parse(&format!(
                "product add --name Beans --category {} --arrival 100 --sales 150 --kaspi 170 --quantity 10",
                category_id
            )),
        )
        .await
        .unwrap();
        let product_id = product["id"].as_str().unwrap().to_string();
        assert_eq!(product["quantity"], 10);

        let order = dispatch(
            &state,
            parse(&format!(
                "order create --product {} --quantity 4 --deadline 2030-01-01",
                product_id
            )),
        )
        .await
        .unwrap();
        assert_eq!(order["price"], 150);
        assert_eq!(order["total"], 600);

        let err = dispatch(
            &state,
            parse(&format!(
                "order create --product {} --quantity 7 --deadline 2030-01-01",
                product_id
            )),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let order_id = order["id"].as_str().unwrap();
        let finished = dispatch(&state, parse(&format!("order finish {}", order_id)))
            .await
            .unwrap();
        assert_eq!(finished["status"], "finished");

        let again = dispatch(&state, parse(&format!("order finish {}", order_id)))
            .await
            .unwrap_err();
        assert_eq!(again.code, ErrorCode::AlreadyFinished);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let state = state().await;
        for line in ["product show nope", "order show nope", "order finish nope"] {
            let err = dispatch(&state, parse(line)).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::NotFound, "{}", line);
        }
    }

    #[tokio::test]
    async fn test_missing_report_is_not_found() {
        let state = state().await;
        let date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let err = dispatch(&state, Command::ReportShow { date }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
