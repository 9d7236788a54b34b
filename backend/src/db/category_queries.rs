use sqlx::PgPool;

use crate::models::CategoryWithCount;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<CategoryWithCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryWithCount>(
        "SELECT c.id, c.name, c.description, c.color, c.icon, c.created_at, c.updated_at,
                COUNT(a.id) AS asset_count
         FROM asset_categories c
         LEFT JOIN assets a ON a.category_id = c.id
         GROUP BY c.id
         ORDER BY c.name ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: &str) -> Result<Option<CategoryWithCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryWithCount>(
        "SELECT c.id, c.name, c.description, c.color, c.icon, c.created_at, c.updated_at,
                COUNT(a.id) AS asset_count
         FROM asset_categories c
         LEFT JOIN assets a ON a.category_id = c.id
         WHERE c.id = $1
         GROUP BY c.id",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM asset_categories WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}
