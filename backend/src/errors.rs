use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::response::{ApiResponse, ErrorBody};

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Validation failed for {} field(s)", .0.len())]
    InvalidFields(Vec<FieldError>),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Email address is already registered")]
    DuplicateEmail,
    #[error("Duplicate entry")]
    Duplicate,
    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail | AppError::Duplicate => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::Authentication(_) => "AUTHENTICATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::Duplicate => "DUPLICATE_ERROR",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::Db(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidFields(_) => "Request validation failed".to_string(),
            AppError::Authentication(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::DuplicateEmail => "Email address is already registered".to_string(),
            AppError::Duplicate => "A conflicting record already exists".to_string(),
            AppError::RateLimited { .. } => {
                "Too many requests, please try again later".to_string()
            }
            // Internal details stay in the logs.
            AppError::Db(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn unauthenticated(msg: &str) -> Self {
        AppError::Authentication(msg.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let details = match &self {
            AppError::InvalidFields(fields) => Some(fields.clone()),
            _ => None,
        };
        let body = ApiResponse::<()>::failure(ErrorBody {
            code: self.code().to_string(),
            message: self.public_message(),
            details,
        });

        match self {
            AppError::RateLimited { retry_after_secs } => {
                let mut headers = HeaderMap::new();
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    headers.insert("Retry-After", value);
                }
                (status, headers, Json(body)).into_response()
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &value {
            if db_err.is_unique_violation() {
                return AppError::Duplicate;
            }
        }
        AppError::Db(value)
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(value: Vec<FieldError>) -> Self {
        AppError::InvalidFields(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        AppError::Validation(value.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(value: QueryRejection) -> Self {
        AppError::Validation(value.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(value: PathRejection) -> Self {
        AppError::Validation(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = vec![
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AppError::unauthenticated("nope"), StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR"),
            (AppError::NotFound("Asset not found".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::DuplicateEmail, StatusCode::CONFLICT, "DUPLICATE_EMAIL"),
            (AppError::Duplicate, StatusCode::CONFLICT, "DUPLICATE_ERROR"),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_internal_message_is_not_leaked() {
        let err = AppError::Internal("connection string postgres://secret".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "42");
    }
}
