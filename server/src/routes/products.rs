use axum::{
    Json,
    extract::{Query, State},
};
use platform_api::ApiResult;
use platform_db::TableQuery;
use sea_orm::JsonValue;
use serde::Deserialize;
use serde_json::json;

use super::helper_error;
use crate::http::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductParams {
    pub category: Option<String>,
    pub active: Option<bool>,
}

/// Fixed products read: equality filters on category and the active flag,
/// always ordered by name ascending.
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductParams>,
) -> ApiResult<Json<Vec<JsonValue>>> {
    let mut query = TableQuery::new().order_by("name", true);
    if let Some(category) = params.category {
        query = query.filter("category", json!(category));
    }
    if let Some(active) = params.active {
        query = query.filter("is_active", json!(active));
    }
    let rows = platform_db::fetch_rows(&state.pool, "product", &query)
        .await
        .map_err(helper_error)?;
    Ok(Json(rows))
}
