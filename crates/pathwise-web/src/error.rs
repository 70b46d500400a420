//! HTTP mapping for tracker errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pathwise_core::error::GraphParseError;
use pathwise_core::Error;
use serde_json::json;
use tracing::error;

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    /// The subjects root holds no subject directories.
    NoSubjects,
    /// A blocking task failed to complete.
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(Error::UnknownSubject(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(Error::UnknownTopic { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Core(Error::Graph {
                source: GraphParseError::Empty,
                ..
            }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NoSubjects => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Core(e) => e.to_string(),
            ApiError::NoSubjects => "No subjects available".to_string(),
            ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self.message(), "request failed");
        }
        let body = Json(json!({
            "success": false,
            "error": self.message(),
        }));
        (status, body).into_response()
    }
}
