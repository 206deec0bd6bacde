use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::{AdmissionError, StorageError};
use sea_orm::DbErr;
use serde::Serialize;

use crate::images::ImageError;

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `IN_USE`,
    /// `NOT_FOUND`, `CONFLICT`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Cannot delete image that is still in use")]
    pub error: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// The image is still referenced and cannot be removed.
    InUse(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    error: msg,
                },
            ),
            AppError::InUse(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "IN_USE",
                    error: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    error: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    error: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        error: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(name) => {
                AppError::Validation(format!("Invalid file name: {name}"))
            }
            StorageError::NotFound(name) => AppError::NotFound(format!("File '{name}' not found")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Rejected(e) => e.into(),
            ImageError::NotFound(what) => AppError::NotFound(format!("Image '{what}' not found")),
            e @ ImageError::InUse(_) => AppError::InUse(e.to_string()),
            e @ ImageError::ReferenceUnderflow(_) => AppError::Conflict(e.to_string()),
            ImageError::Storage(e) => AppError::Internal(e.to_string()),
            ImageError::Database(e) => e.into(),
        }
    }
}
