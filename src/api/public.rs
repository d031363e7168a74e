//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::google::gcal::GoogleApiError;

pub const SERVICE_UNAVAILABLE_DETAIL: &str = "Failed to connect to the Google Calendar service.";
pub const UPSTREAM_DETAIL_PREFIX: &str = "Error querying the Google Calendar API";
pub const INTERNAL_DETAIL: &str = "Internal server error.";

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

// Errors

#[derive(Debug)]
pub enum ApiError {
    /// Credentials are missing or can't be used to build a client
    ServiceUnavailable(anyhow::Error),
    /// The calendar provider rejected the request
    Upstream(GoogleApiError),
    /// Bad query parameters
    Validation(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::ServiceUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SERVICE_UNAVAILABLE_DETAIL.to_string(),
            ),
            ApiError::Upstream(err) => (
                err.status,
                format!("{}: {}", UPSTREAM_DETAIL_PREFIX, err.reason),
            ),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_DETAIL.to_string(),
            ),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        match &self {
            ApiError::ServiceUnavailable(err) => {
                tracing::error!("Failed to authenticate with Google Calendar: {:#}", err)
            }
            ApiError::Upstream(err) => tracing::error!("{}", err),
            ApiError::Validation(msg) => tracing::warn!("Rejected request: {}", msg),
            ApiError::Internal(err) => tracing::error!("Unexpected error: {:#}", err),
        }

        let (status, detail) = self.status_and_detail();
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`. Provider
/// errors keep their status, everything else is internal.
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        match err.downcast::<GoogleApiError>() {
            Ok(api_err) => Self::Upstream(api_err),
            Err(err) => Self::Internal(err),
        }
    }
}

// Re-export public types from each route

pub mod events {
    pub use crate::api::routes::events::public::*;
}
