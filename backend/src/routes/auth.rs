use axum::extract::State;
use axum::routing::{get, post};
use axum::{middleware, Extension, Router};
use tracing::{error, info};

use crate::auth::require_auth;
use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::models::{AuthPayload, AuthUser, LoginUser, RegisterUser, User, VerifyPayload};
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/verify", post(verify))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(data): ApiJson<RegisterUser>,
) -> Result<ApiResponse<AuthPayload>, AppError> {
    info!("POST /auth/register - Registering new user");
    let payload = services::auth_service::register(&state.pool, &state.tokens, data)
        .await
        .map_err(|e| {
            error!("Failed to register user: {}", e);
            e
        })?;
    Ok(ApiResponse::created(payload).with_message("Registration successful"))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(data): ApiJson<LoginUser>,
) -> Result<ApiResponse<AuthPayload>, AppError> {
    info!("POST /auth/login - Logging in");
    let payload = services::auth_service::login(&state.pool, &state.tokens, data)
        .await
        .map_err(|e| {
            error!("Login failed: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(payload).with_message("Login successful"))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<()>, AppError> {
    info!("POST /auth/logout - Logging out user {}", user.id);
    services::auth_service::logout(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to log out user {}: {}", user.id, e);
            e
        })?;
    Ok(ApiResponse::message_only("Logout successful"))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<User>, AppError> {
    info!("GET /auth/me - Fetching user {}", user.id);
    let user = services::auth_service::current_user(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch user {}: {}", user.id, e);
            e
        })?;
    Ok(ApiResponse::ok(user))
}

pub async fn verify(Extension(user): Extension<AuthUser>) -> ApiResponse<VerifyPayload> {
    info!("POST /auth/verify - Token valid for user {}", user.id);
    ApiResponse::ok(VerifyPayload { valid: true, user })
}
