use sqlx::PgPool;

use crate::db;
use crate::errors::AppError;
use crate::models::CategoryWithCount;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<CategoryWithCount>, AppError> {
    let categories = db::category_queries::fetch_all(pool).await?;
    Ok(categories)
}

pub async fn fetch_one(pool: &PgPool, id: &str) -> Result<CategoryWithCount, AppError> {
    db::category_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}
