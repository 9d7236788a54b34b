use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PriceHistory;

pub async fn fetch_recent(
    pool: &PgPool,
    asset_id: Uuid,
    limit: i64,
) -> Result<Vec<PriceHistory>, sqlx::Error> {
    sqlx::query_as::<_, PriceHistory>(
        "SELECT id, asset_id, price, date, source, created_at
         FROM price_history
         WHERE asset_id = $1
         ORDER BY date DESC
         LIMIT $2",
    )
    .bind(asset_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
