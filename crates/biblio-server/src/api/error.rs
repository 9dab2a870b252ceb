//! HTTP error responses
//!
//! Every failure leaves the API as `{"error": "<message>"}` with the status
//! from `LibraryError::status_code`. Internal errors are logged and replaced
//! by a generic message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use biblio_core::LibraryError;

#[derive(Debug)]
pub struct ApiError(pub LibraryError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(LibraryError::validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(LibraryError::validation(format!(
            "Invalid id: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self.0 {
            LibraryError::Storage(storage) => {
                tracing::error!(
                    error = %storage,
                    suggestion = storage.recovery_suggestion().unwrap_or("none"),
                    "Storage error"
                );
                "Internal server error".to_string()
            }
            LibraryError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
