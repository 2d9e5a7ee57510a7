//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use switchhub_domain::error::SwitchHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    /// Set when a group operation changed some members before failing.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    partial: bool,
}

/// Maps [`SwitchHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(SwitchHubError);

impl From<SwitchHubError> for ApiError {
    fn from(err: SwitchHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, partial) = match &self.0 {
            SwitchHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), false),
            SwitchHubError::Config(err) => (StatusCode::BAD_REQUEST, err.to_string(), false),
            SwitchHubError::IndexOutOfRange(err) => {
                (StatusCode::BAD_REQUEST, err.to_string(), false)
            }
            SwitchHubError::InvalidHold(err) => (StatusCode::BAD_REQUEST, err.to_string(), false),
            SwitchHubError::Usage(err) => (StatusCode::CONFLICT, err.to_string(), false),
            SwitchHubError::PartialGroup(err) => {
                tracing::error!(error = %err, cause = %err.source, "partial group failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), true)
            }
            SwitchHubError::Driver(err) => {
                tracing::error!(error = %err, "driver error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), false)
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                partial,
            }),
        )
            .into_response()
    }
}
