use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use chrono::Utc;
use tracing::{error, info};

use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::models::{
    AuthUser, MonthlyReport, ReportQuery, ReportSummary, Sheet, TrendQuery, TrendReport,
    YearlyReport,
};
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trends", get(get_trends))
        .route("/monthly", get(get_monthly))
        .route("/yearly", get(get_yearly))
        .route("/summary", get(get_summary))
        .route("/export/csv", get(export_csv))
        .route("/export/sheets", get(export_sheets))
}

pub async fn get_trends(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> Result<ApiResponse<TrendReport>, AppError> {
    info!("GET /reports/trends - Building {:?} trend for user {}", query.period, user.id);
    let report = services::report_service::get_trends(&state.pool, user.id, query)
        .await
        .map_err(|e| {
            error!("Failed to build trend report: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(report))
}

pub async fn get_monthly(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<ApiResponse<MonthlyReport>, AppError> {
    info!("GET /reports/monthly - {}-{:?}", query.year, query.month);
    let report = services::report_service::get_monthly(&state.pool, user.id, query)
        .await
        .map_err(|e| {
            error!("Failed to build monthly report: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(report))
}

pub async fn get_yearly(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<ApiResponse<YearlyReport>, AppError> {
    info!("GET /reports/yearly - {}", query.year);
    let report = services::report_service::get_yearly(&state.pool, user.id, query)
        .await
        .map_err(|e| {
            error!("Failed to build yearly report: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(report))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<ReportSummary>, AppError> {
    info!("GET /reports/summary - Summarizing for user {}", user.id);
    let summary = services::report_service::get_summary(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to build report summary: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(summary))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, AppError> {
    info!("GET /reports/export/csv - Exporting assets for user {}", user.id);
    let body = services::export_service::export_csv(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to export CSV: {}", e);
            e
        })?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        services::export_service::csv_filename(Utc::now())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn export_sheets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<Sheet>>, AppError> {
    info!("GET /reports/export/sheets - Exporting workbook for user {}", user.id);
    let sheets = services::export_service::export_sheets(&state.pool, user.id)
        .await
        .map_err(|e| {
            error!("Failed to export sheets: {}", e);
            e
        })?;
    Ok(ApiResponse::ok(sheets))
}
