use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::downloads::RedeemError;
use crate::orders::admission::AdmissionError;
use crate::storage::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Sold out")]
    SoldOut,

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AdmissionError> for AppError {
    fn from(e: AdmissionError) -> Self {
        match e {
            AdmissionError::SoldOut => AppError::SoldOut,
            AdmissionError::Validation(msg) => AppError::Validation(msg),
            AdmissionError::UnknownOrder(id) => AppError::NotFound(format!("Order {id} not found")),
            AdmissionError::Store(e) => AppError::Store(e),
            e @ AdmissionError::Unrecorded(_) => AppError::Internal(e.into()),
        }
    }
}

impl From<RedeemError> for AppError {
    fn from(e: RedeemError) -> Self {
        match e {
            RedeemError::NotFound => AppError::NotFound("Download link not found".into()),
            RedeemError::FileMissing => AppError::NotFound("Download file not found".into()),
            RedeemError::Expired => AppError::Gone("Download link has expired".into()),
            RedeemError::LimitReached => {
                AppError::TooManyRequests("Download limit reached".into())
            }
            RedeemError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::SoldOut => (
                StatusCode::CONFLICT,
                "SOLD_OUT",
                "All slots have been claimed".to_string(),
            ),
            AppError::Gone(msg) => (StatusCode::GONE, "EXPIRED", msg.clone()),
            AppError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "LIMIT_REACHED", msg.clone())
            }
            AppError::Store(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
