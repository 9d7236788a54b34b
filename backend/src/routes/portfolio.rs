use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::models::{AuthUser, HistoryQuery, PerformanceReport, PortfolioSnapshot, PortfolioSummary};
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/history", get(get_history))
        .route("/snapshot", post(create_snapshot))
        .route("/performance", get(get_performance))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<PortfolioSummary>, AppError> {
    info!("GET /portfolio/summary - Summarizing portfolio for user {}", user.id);
    let summary = services::portfolio_service::get_summary(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to summarize portfolio: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(summary))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<ApiResponse<Vec<PortfolioSnapshot>>, AppError> {
    info!("GET /portfolio/history - Fetching {:?} history", query.period);
    let history = services::portfolio_service::get_history(&state.pool, user.id, query.period)
        .await
        .map_err(|e| {
            error!("Failed to fetch portfolio history: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(history))
}

pub async fn create_snapshot(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<PortfolioSnapshot>, AppError> {
    info!("POST /portfolio/snapshot - Recording snapshot for user {}", user.id);
    let snapshot = services::portfolio_service::create_snapshot(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to record snapshot: {}", e);
            e
        })?;
    Ok(ApiResponse::created(snapshot).with_message("Snapshot created"))
}

pub async fn get_performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<PerformanceReport>, AppError> {
    info!("GET /portfolio/performance - Ranking assets for user {}", user.id);
    let report = services::portfolio_service::get_performance(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to rank assets: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(report))
}
