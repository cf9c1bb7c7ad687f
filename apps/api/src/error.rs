//! Error types for the API.
//!
//! Every handler returns [`ApiResult`]. Errors render as
//! `{"error": "<message>"}` with the matching status code.
//!
//! ```text
//! DbError::NotFound          ──► 404  "Bill not found"
//! DbError::UniqueViolation   ──► 409  "Email already registered"
//! DbError::Validation / Core ──► 400  "Missing required field: customer_name"
//! anything else              ──► 500  "Internal server error" (details logged)
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use axum::Json;
use billdesk_core::{CoreError, ValidationError};
use billdesk_db::DbError;
use http::StatusCode;
use serde_json::json;
use tracing::error;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The detail is logged, never sent.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("Forbidden".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(error = %detail, "Request failed");
        }
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            DbError::UniqueViolation { field, .. } => ApiError::Conflict(
                match field.as_str() {
                    "users.email" => "Email already registered",
                    "expense_categories.name" => "Category already exists",
                    "bills.bill_number" => "Bill number already exists",
                    _ => "Duplicate value",
                }
                .to_string(),
            ),
            DbError::Validation(e) => e.into(),
            DbError::Core(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BillNotFound(_) => ApiError::NotFound("Bill not found".to_string()),
            CoreError::ProductNotFound(_) => ApiError::NotFound("Product not found".to_string()),
            CoreError::Validation(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            // The reason already reads as a sentence for these
            ValidationError::InvalidFormat { field, reason }
                if field == "email" || field == "period" =>
            {
                ApiError::BadRequest(reason)
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Bill", 7).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Bill not found");

        let err: ApiError = DbError::duplicate("users.email", "a@b.co").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Email already registered");

        let err: ApiError = DbError::ConstraintViolation {
            message: "CHECK constraint failed: quantity > 0".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_validation_messages() {
        let err: ApiError = ValidationError::required("customer_name").into();
        assert_eq!(err.to_string(), "Missing required field: customer_name");

        let err: ApiError =
            ValidationError::invalid_format("email", "Invalid email format").into();
        assert_eq!(err.to_string(), "Invalid email format");
    }
}
