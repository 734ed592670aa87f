//! Error types for facemeta-review

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unusable query parameters (400)
    ///
    /// The body keeps the shape of a listing response so clients can render
    /// an empty page.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": message,
                    "data": [],
                    "total": 0,
                    "page": DEFAULT_PAGE,
                    "limit": DEFAULT_LIMIT,
                }),
            ),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": message })),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("page".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x.jpg".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
