//! # Category Commands

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use stockroom_core::Category;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        CategoryDto {
            id: c.id,
            name: c.name,
        }
    }
}

/// `stockroom category add <name>`
pub async fn add(state: &AppState, name: &str) -> Result<CategoryDto, ApiError> {
    let category = state.db().catalog().create_category(name).await?;
    Ok(category.into())
}

/// `stockroom category list`
pub async fn list(state: &AppState) -> Result<Vec<CategoryDto>, ApiError> {
    let categories = state.db().categories().list().await?;
    debug!(count = categories.len(), "Listed categories");
    Ok(categories.into_iter().map(CategoryDto::from).collect())
}
