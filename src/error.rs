use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{dao::storage::StorageError, remote::FetchError, state::codes::UnknownGame};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The remote code source could not be read after all retries.
    #[error("fetch failed")]
    Fetch(#[source] FetchError),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Storage(#[source] StorageError),
    /// Unknown game or malformed key; never retried.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Request data that passed decoding but cannot be applied.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<FetchError> for ServiceError {
    fn from(err: FetchError) -> Self {
        ServiceError::Fetch(err)
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

impl From<UnknownGame> for ServiceError {
    fn from(err: UnknownGame) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<UnknownGame> for AppError {
    fn from(err: UnknownGame) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The upstream code source failed.
    #[error("upstream failure: {0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Fetch(source) => AppError::BadGateway(source.to_string()),
            ServiceError::Storage(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Validation(message) | ServiceError::InvalidInput(message) => {
                AppError::BadRequest(message)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
