use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookmarker_core::{ResolveError, StorageError};
use serde::Serialize;
use tracing::error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    NotFound(String),
    ResourceExhausted(String),
    Storage(StorageError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ResourceExhausted(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidInput(message) => message.clone(),
            ApiError::NotFound(id) => format!("bookmark '{id}' not found"),
            ApiError::ResourceExhausted(url) => format!("no free key left for '{url}'"),
            // Backend details stay in the logs.
            ApiError::Storage(_) => "storage unavailable".to_string(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidInput(message) => ApiError::InvalidInput(message),
            ResolveError::ResourceExhausted(url) => ApiError::ResourceExhausted(url),
            ResolveError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }

        let body = ErrorBody {
            error: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
