use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{self, TokenManager};
use crate::db;
use crate::errors::AppError;
use crate::models::{AuthPayload, AuthUser, LoginUser, RegisterUser, User, UserSession};

// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))?
}

pub async fn register(
    pool: &PgPool,
    tokens: &TokenManager,
    input: RegisterUser,
) -> Result<AuthPayload, AppError> {
    input.validate()?;
    let email = input.email.trim().to_lowercase();

    if db::user_queries::email_exists(pool, &email).await? {
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(input.password).await?;
    let user = User::new(email, password_hash, input.name.trim().to_string());
    let user = db::user_queries::insert(pool, &user).await.map_err(|e| {
        // Lost a race with a concurrent registration.
        match AppError::from(e) {
            AppError::Duplicate => AppError::DuplicateEmail,
            other => other,
        }
    })?;

    let issued = tokens.issue(user.id, &user.email)?;
    let session = UserSession::new(user.id, auth::token_digest(&issued.token), issued.expires_at);
    db::session_queries::insert(pool, &session).await?;

    info!("Registered user {}", user.id);
    Ok(AuthPayload {
        user,
        token: issued.token,
    })
}

pub async fn login(
    pool: &PgPool,
    tokens: &TokenManager,
    input: LoginUser,
) -> Result<AuthPayload, AppError> {
    input.validate()?;
    let email = input.email.trim().to_lowercase();

    let invalid = || AppError::unauthenticated("Invalid email or password");
    let user = db::user_queries::fetch_by_email(pool, &email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(input.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let issued = tokens.issue(user.id, &user.email)?;
    let session = UserSession::new(user.id, auth::token_digest(&issued.token), issued.expires_at);
    let replaced = db::session_queries::replace_for_user(pool, &session).await?;

    info!("User {} logged in, {} previous session(s) revoked", user.id, replaced);
    Ok(AuthPayload {
        user,
        token: issued.token,
    })
}

pub async fn logout(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
    let removed = db::session_queries::delete_for_user(pool, user_id).await?;
    Ok(removed)
}

pub async fn current_user(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    db::user_queries::fetch_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Resolves a bearer token to its user. The token must verify, its user
/// must exist, and a live session must hold the token's digest.
pub async fn authenticate(
    pool: &PgPool,
    tokens: &TokenManager,
    token: &str,
) -> Result<AuthUser, AppError> {
    let claims = tokens.validate(token)?;

    let user = db::user_queries::fetch_by_id(pool, claims.user_id)
        .await?
        .ok_or_else(|| AppError::unauthenticated("User not found"))?;

    db::session_queries::find_active(pool, user.id, &auth::token_digest(token), Utc::now())
        .await?
        .ok_or_else(|| AppError::unauthenticated("Session is invalid or expired"))?;

    Ok(AuthUser::from(&user))
}
