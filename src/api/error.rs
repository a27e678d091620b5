//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::intake::{IntakeError, RESEND_PROMPT};
use crate::pipeline::orders::{OrderError, STORAGE_FAILURE_PROMPT};

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Could not understand the order: {0}")]
    NormalizationFailed(String),
    #[error("Order is incomplete: {0}")]
    Validation(String),
    #[error("Order could not be stored: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
            ),
            ApiError::NormalizationFailed(detail) => {
                tracing::warn!(detail, "Order text could not be normalized");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "NORMALIZATION_FAILED",
                    RESEND_PROMPT.to_string(),
                )
            }
            ApiError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                detail.clone(),
            ),
            ApiError::Storage(detail) => {
                tracing::error!(detail, "Order storage failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_FAILED",
                    STORAGE_FAILURE_PROMPT.to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::EmptyInput => ApiError::BadRequest(IntakeError::EmptyInput.to_string()),
            IntakeError::NormalizationFailed(reason) => {
                ApiError::NormalizationFailed(reason.to_string())
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        if err.is_validation() {
            ApiError::Validation(err.to_string())
        } else {
            ApiError::Storage(err.to_string())
        }
    }
}

impl From<crate::db::DatabaseError> for ApiError {
    fn from(err: crate::db::DatabaseError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
