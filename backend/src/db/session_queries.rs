use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::UserSession;

pub async fn insert(pool: &PgPool, session: &UserSession) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_sessions (id, user_id, token_hash, expires_at, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(session.id)
    .bind(session.user_id)
    .bind(&session.token_hash)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Deletes every session of the user and stores `session` in one transaction.
pub async fn replace_for_user(pool: &PgPool, session: &UserSession) -> Result<u64, sqlx::Error> {
    let mut tx: Transaction<'_, Postgres> = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
        .bind(session.user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query(
        "INSERT INTO user_sessions (id, user_id, token_hash, expires_at, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(session.id)
    .bind(session.user_id)
    .bind(&session.token_hash)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(removed)
}

pub async fn find_active(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<UserSession>, sqlx::Error> {
    sqlx::query_as::<_, UserSession>(
        "SELECT id, user_id, token_hash, expires_at, created_at
         FROM user_sessions
         WHERE user_id = $1 AND token_hash = $2 AND expires_at > $3
         LIMIT 1",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn delete_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
