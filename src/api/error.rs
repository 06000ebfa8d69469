use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::logic::DirectoryError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Transport wrapper turning a [`DirectoryError`] into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub DirectoryError);

/// Status code for each failure kind. Every kind maps to exactly one status.
pub fn status_for(error: &DirectoryError) -> StatusCode {
    match error {
        DirectoryError::BadRequest(_) => StatusCode::BAD_REQUEST,
        DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
        DirectoryError::Conflict(_) => StatusCode::CONFLICT,
        DirectoryError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DirectoryError::bad_request(format!(
            "Error decoding params: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(DirectoryError::bad_request(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Display of the Store variant is the public message only, never the cause
        let status = status_for(&self.0);
        (status, Json(ErrorResponse::new(&self.0.to_string()))).into_response()
    }
}
