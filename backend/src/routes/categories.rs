use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use crate::errors::AppError;
use crate::extract::ApiPath;
use crate::models::CategoryWithCount;
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/:id", get(get_category))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<CategoryWithCount>>, AppError> {
    info!("GET /categories - Fetching all categories");
    let categories = services::category_service::fetch_all(&state.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch categories: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<CategoryWithCount>, AppError> {
    info!("GET /categories/{} - Fetching category", id);
    let category = services::category_service::fetch_one(&state.pool, &id)
        .await
        .map_err(|e| {
            error!("Failed to fetch category {}: {}", id, e);
            e
        })?;
    Ok(ApiResponse::ok(category))
}
