use axum::extract::State;
use axum::routing::{get, patch};
use axum::{Extension, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{
    AssetDetail, AssetFilters, AssetView, AuthUser, CreateAsset, Paginated, UpdateAsset,
    UpdatePrice,
};
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
        .route("/:id/price", patch(update_price))
}

pub async fn list_assets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(filters): ApiQuery<AssetFilters>,
) -> Result<ApiResponse<Paginated<AssetView>>, AppError> {
    info!("GET /assets - Listing assets for user {}", user.id);
    let page = services::asset_service::list(&state.pool, user.id, filters)
        .await
        .map_err(|e| {
            error!("Failed to list assets: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(page))
}

pub async fn create_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(data): ApiJson<CreateAsset>,
) -> Result<ApiResponse<AssetView>, AppError> {
    info!("POST /assets - Creating asset for user {}", user.id);
    let asset = services::asset_service::create(&state.pool, user.id, data)
        .await
        .map_err(|e| {
            error!("Failed to create asset: {}", e);
            e
        })?;
    Ok(ApiResponse::created(asset).with_message("Asset created"))
}

pub async fn get_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<AssetDetail>, AppError> {
    info!("GET /assets/{} - Fetching asset", id);
    let asset = services::asset_service::fetch_one(&state.pool, user.id, id)
        .await
        .map_err(|e| {
            error!("Failed to fetch asset {}: {}", id, e);
            e
        })?;
    Ok(ApiResponse::ok(asset))
}

pub async fn update_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(data): ApiJson<UpdateAsset>,
) -> Result<ApiResponse<AssetView>, AppError> {
    info!("PUT /assets/{} - Updating asset", id);
    let asset = services::asset_service::update(&state.pool, user.id, id, data)
        .await
        .map_err(|e| {
            error!("Failed to update asset {}: {}", id, e);
            e
        })?;
    Ok(ApiResponse::ok(asset).with_message("Asset updated"))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    info!("DELETE /assets/{} - Deleting asset", id);
    services::asset_service::delete(&state.pool, user.id, id)
        .await
        .map_err(|e| {
            error!("Failed to delete asset {}: {}", id, e);
            e
        })?;
    Ok(ApiResponse::message_only("Asset deleted"))
}

pub async fn update_price(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(data): ApiJson<UpdatePrice>,
) -> Result<ApiResponse<AssetView>, AppError> {
    info!("PATCH /assets/{}/price - Updating price", id);
    let asset = services::asset_service::update_price(&state.pool, user.id, id, data)
        .await
        .map_err(|e| {
            error!("Failed to update price for asset {}: {}", id, e);
            e
        })?;
    Ok(ApiResponse::ok(asset).with_message("Price updated"))
}
