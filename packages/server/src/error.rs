use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::uploads::UploadError;

/// Error envelope returned by every endpoint on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Human-readable error description.
    #[schema(example = "npm must be exactly 8 characters")]
    pub error: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// Storage or filesystem failure. The detail is exposed to the client.
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) => ErrorBody { error: msg },
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorBody { error: detail }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
                AppError::NotFound("Not found".into())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::FileTooLarge { .. } | UploadError::UnsupportedType(_) => {
                tracing::warn!("Upload rejected: {err}");
                AppError::Validation(err.to_string())
            }
            UploadError::Io(_) => AppError::Internal(err.to_string()),
        }
    }
}
