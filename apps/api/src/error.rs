//! # API Error Type
//!
//! Unified error type for HTTP handlers and services.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error Flow in Boutik                                │
//! │                                                                         │
//! │  CoreError / DbError ──► ApiError ──► HTTP status + JSON body           │
//! │                                                                         │
//! │  Kind              Status                                               │
//! │  ────              ──────                                               │
//! │  NotFound          404                                                  │
//! │  Forbidden         403                                                  │
//! │  Unauthorized      401                                                  │
//! │  InvalidInput      400                                                  │
//! │  EmptyCart         400                                                  │
//! │  InsufficientStock 400                                                  │
//! │  InvalidTransition 400                                                  │
//! │  Conflict          409                                                  │
//! │  Internal          500  (details logged, generic message returned)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use boutik_core::CoreError;
use boutik_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// This is what HTTP clients receive when a request fails:
/// ```json
/// {
///   "success": false,
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock: requested 5, available 3"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling.
    pub code: ErrorCode,

    /// Human-readable error message for display.
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404).
    NotFound,

    /// Actor lacks rights over the target entity (403).
    Forbidden,

    /// Missing or invalid credentials/token (401).
    Unauthorized,

    /// Malformed or out-of-range input (400).
    InvalidInput,

    /// Checkout attempted with no items (400).
    EmptyCart,

    /// Requested quantity exceeds availability (400).
    InsufficientStock,

    /// Illegal order lifecycle move (400).
    InvalidTransition,

    /// Uniqueness conflict (409).
    Conflict,

    /// Unexpected internal failure (500).
    Internal,
}

impl ErrorCode {
    /// The HTTP status this code maps to.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidInput
            | ErrorCode::EmptyCart
            | ErrorCode::InsufficientStock
            | ErrorCode::InvalidTransition => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors; the full taxonomy maps 1:1.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::Forbidden(_) => ErrorCode::Forbidden,
            CoreError::InvalidInput(_) => ErrorCode::InvalidInput,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::Conflict(_) => ErrorCode::Conflict,
            CoreError::Validation(_) => ErrorCode::InvalidInput,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } => {
                ApiError::conflict(format!("{} already exists", field))
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::internal("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::internal("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            DbError::Serialization(e) => {
                tracing::error!("Document (de)serialization failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            DbError::PoolExhausted => ApiError::internal("Database pool exhausted"),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

/// Converts validation errors directly (shortcut for service-level checks).
impl From<boutik_core::ValidationError> for ApiError {
    fn from(err: boutik_core::ValidationError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

/// JSON body sent to clients on failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    code: ErrorCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = ErrorBody {
            success: false,
            code: self.code,
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InsufficientStock.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::EmptyCart);

        let err: ApiError = CoreError::InsufficientStock {
            requested: 5,
            available: 3,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Order", "o-1").into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = DbError::UniqueViolation {
            field: "users.phone".to_string(),
            value: "771234567".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
    }
}
