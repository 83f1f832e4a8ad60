use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No writer available for type {0}")]
    UnsupportedFormat(String),

    #[error("Export format {0} is not available on this server")]
    WriterUnavailable(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            ApiError::WriterUnavailable(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Persistence(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<formstore_core::Error> for ApiError {
    fn from(err: formstore_core::Error) -> Self {
        match err {
            formstore_core::Error::InvalidIdentifier(msg) => ApiError::Validation(msg),
            formstore_core::Error::UnsupportedFormat(format) => ApiError::UnsupportedFormat(format),
            formstore_core::Error::Other(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<formstore_db::Error> for ApiError {
    fn from(err: formstore_db::Error) -> Self {
        match err {
            formstore_db::Error::Validation(e) => e.into(),
            formstore_db::Error::RecordNotFound(id) => {
                ApiError::NotFound(format!("record {}", id))
            }
            other => ApiError::Persistence(other.to_string()),
        }
    }
}

impl From<formstore_export::Error> for ApiError {
    fn from(err: formstore_export::Error) -> Self {
        match err {
            formstore_export::Error::WriterUnavailable(format) => {
                ApiError::WriterUnavailable(format.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
