use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    AssetDetail, AssetFilters, AssetView, AssetWithCategory, CreateAsset, Paginated, Pagination,
    PriceHistory, UpdateAsset, UpdatePrice,
};

const RECENT_PRICE_HISTORY: i64 = 10;

fn not_found() -> AppError {
    AppError::NotFound("Asset not found".to_string())
}

pub async fn list(
    pool: &PgPool,
    user_id: Uuid,
    filters: AssetFilters,
) -> Result<Paginated<AssetView>, AppError> {
    filters.validate()?;

    let total = db::asset_queries::count(pool, user_id, &filters).await?;
    let items = db::asset_queries::fetch_page(pool, user_id, &filters)
        .await?
        .into_iter()
        .map(AssetView::from)
        .collect();

    Ok(Paginated {
        items,
        pagination: Pagination::new(filters.page, filters.limit, total),
    })
}

pub async fn fetch_all(pool: &PgPool, user_id: Uuid) -> Result<Vec<AssetWithCategory>, AppError> {
    let assets = db::asset_queries::fetch_all_for_user(pool, user_id).await?;
    Ok(assets)
}

async fn fetch_view(pool: &PgPool, user_id: Uuid, asset_id: Uuid) -> Result<AssetView, AppError> {
    db::asset_queries::fetch_one(pool, user_id, asset_id)
        .await?
        .map(AssetView::from)
        .ok_or_else(not_found)
}

pub async fn fetch_one(pool: &PgPool, user_id: Uuid, asset_id: Uuid) -> Result<AssetDetail, AppError> {
    let view = fetch_view(pool, user_id, asset_id).await?;
    let price_history =
        db::price_history_queries::fetch_recent(pool, asset_id, RECENT_PRICE_HISTORY).await?;
    Ok(AssetDetail {
        view,
        price_history,
    })
}

pub async fn create(pool: &PgPool, user_id: Uuid, input: CreateAsset) -> Result<AssetView, AppError> {
    let new_asset = input.validate()?;

    if !db::category_queries::exists(pool, &new_asset.category_id).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let asset = db::asset_queries::insert(pool, user_id, &new_asset).await?;
    fetch_view(pool, user_id, asset.id).await
}

pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    asset_id: Uuid,
    input: UpdateAsset,
) -> Result<AssetView, AppError> {
    let changes = input.validate()?;
    db::asset_queries::update(pool, user_id, asset_id, changes)
        .await?
        .ok_or_else(not_found)?;
    fetch_view(pool, user_id, asset_id).await
}

pub async fn delete(pool: &PgPool, user_id: Uuid, asset_id: Uuid) -> Result<(), AppError> {
    match db::asset_queries::delete(pool, user_id, asset_id).await? {
        0 => Err(not_found()),
        _ => Ok(()),
    }
}

pub async fn update_price(
    pool: &PgPool,
    user_id: Uuid,
    asset_id: Uuid,
    input: UpdatePrice,
) -> Result<AssetView, AppError> {
    input.validate()?;
    let entry = PriceHistory::new(asset_id, input.current_price, input.source);
    db::asset_queries::update_price(pool, user_id, &entry)
        .await?
        .ok_or_else(not_found)?;
    fetch_view(pool, user_id, asset_id).await
}
