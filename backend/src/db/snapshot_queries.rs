use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PortfolioSnapshot;

pub async fn insert(pool: &PgPool, snapshot: &PortfolioSnapshot) -> Result<PortfolioSnapshot, sqlx::Error> {
    sqlx::query_as::<_, PortfolioSnapshot>(
        "INSERT INTO portfolio_snapshots
            (id, user_id, total_value, total_gain_loss, total_gain_loss_percent, snapshot_date, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, user_id, total_value, total_gain_loss, total_gain_loss_percent, snapshot_date, created_at",
    )
    .bind(snapshot.id)
    .bind(snapshot.user_id)
    .bind(snapshot.total_value)
    .bind(snapshot.total_gain_loss)
    .bind(snapshot.total_gain_loss_percent)
    .bind(snapshot.snapshot_date)
    .bind(snapshot.created_at)
    .fetch_one(pool)
    .await
}

/// Snapshots with `from <= snapshot_date < until`, oldest first.
pub async fn fetch_range(
    pool: &PgPool,
    user_id: Uuid,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<PortfolioSnapshot>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioSnapshot>(
        "SELECT id, user_id, total_value, total_gain_loss, total_gain_loss_percent, snapshot_date, created_at
         FROM portfolio_snapshots
         WHERE user_id = $1 AND snapshot_date >= $2 AND snapshot_date < $3
         ORDER BY snapshot_date ASC",
    )
    .bind(user_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

pub async fn fetch_since(
    pool: &PgPool,
    user_id: Uuid,
    from: DateTime<Utc>,
) -> Result<Vec<PortfolioSnapshot>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioSnapshot>(
        "SELECT id, user_id, total_value, total_gain_loss, total_gain_loss_percent, snapshot_date, created_at
         FROM portfolio_snapshots
         WHERE user_id = $1 AND snapshot_date >= $2
         ORDER BY snapshot_date ASC",
    )
    .bind(user_id)
    .bind(from)
    .fetch_all(pool)
    .await
}
