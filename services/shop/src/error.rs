//! Custom error types for the shop service

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repositories::RepositoryError;

/// Custom error type for the shop service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Referenced resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected failure; `detail` is the underlying error text
    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    /// Error mapper for a failed repository call, `message` summarises the
    /// operation for the client
    pub fn repository(message: &'static str) -> impl FnOnce(RepositoryError) -> ApiError {
        move |err| match err {
            RepositoryError::MissingReference(what) => {
                ApiError::NotFound(format!("{} not found", what))
            }
            RepositoryError::Database(e) => {
                error!("{}: {}", message, e);
                ApiError::Internal {
                    message: message.to_string(),
                    detail: e.to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": message }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": message }),
            ),
            ApiError::Internal { message, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "message": message, "error": detail }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_reference_maps_to_not_found() {
        let err = ApiError::repository("Failed to add item to cart")(
            RepositoryError::MissingReference("Project"),
        );
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Project not found"));
    }

    #[test]
    fn test_database_error_keeps_detail() {
        let err = ApiError::repository("Failed to clear user cart")(RepositoryError::Database(
            sqlx::Error::PoolTimedOut,
        ));
        match err {
            ApiError::Internal { message, detail } => {
                assert_eq!(message, "Failed to clear user cart");
                assert!(!detail.is_empty());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        let response = ApiError::BadRequest("User ID is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::NotFound("gone".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::Internal {
            message: "boom".into(),
            detail: "detail".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
