//! Unified error handling
//!
//! Application-level error enum and the API response envelope:
//! - [`AppError`] - error taxonomy shared by every service
//! - [`AppResponse`] - uniform `{code, message, data}` envelope
//!
//! # Error code ranges
//!
//! | Prefix | Category | Example |
//! |--------|----------|---------|
//! | E0xxx  | Request/business errors | E0003 not found |
//! | E2xxx  | Permission errors | E2001 forbidden |
//! | E3xxx  | Authentication errors | E3001 not logged in |
//! | E4xxx  | Inventory errors | E4001 out of stock |
//! | E9xxx  | System errors | E9002 database |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Uniform API response envelope
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// Error code ("E0000" on success)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application error enum
///
/// Validation and authorization failures surface immediately with no partial
/// effects. `Conflict` is the retryable optimistic-versioning outcome after
/// internal retries are exhausted. `OutOfStock` carries the quantity that was
/// actually available at read time.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication errors (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // ========== Authorization errors (403) ==========
    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Request/business errors (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{message}")]
    OutOfStock {
        message: String,
        /// Quantity still available when the request was rejected
        available: i64,
    },

    // ========== System errors (5xx) ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an Invalid (bad request) error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Create a Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an OutOfStock error for a product
    pub fn out_of_stock(product: impl std::fmt::Display, available: i64) -> Self {
        Self::OutOfStock {
            message: format!("Product {product} has only {available} in stock"),
            available,
        }
    }

    /// Create a Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid token error
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    /// Stable error code for this variant
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "E3001",
            Self::InvalidToken(_) => "E3002",
            Self::TokenExpired => "E3003",
            Self::Forbidden(_) => "E2001",
            Self::NotFound(_) => "E0003",
            Self::Conflict(_) => "E0004",
            Self::Invalid(_) => "E0006",
            Self::OutOfStock { .. } => "E4001",
            Self::Database(_) => "E9002",
            Self::Internal(_) => "E9001",
        }
    }

    /// HTTP status for this variant
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::TokenExpired | Self::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::OutOfStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // System errors log the real cause and hide it from clients
        let (message, data) = match &self {
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                ("Database error".to_string(), None)
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                ("Internal server error".to_string(), None)
            }
            AppError::OutOfStock { message, available } => (
                message.clone(),
                Some(serde_json::json!({ "available": available })),
            ),
            other => (other.to_string(), None),
        };

        let body = Json(AppResponse {
            code: code.to_string(),
            message,
            data,
        });

        (status, body).into_response()
    }
}

/// Result type for application operations
pub type AppResult<T> = Result<T, AppError>;

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: message.into(),
        data: Some(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::not_found("Order 1").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::invalid("cart empty").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::forbidden("seller only").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::conflict("version mismatch").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::out_of_stock("p1", 3).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_out_of_stock_carries_available() {
        let err = AppError::out_of_stock(42, 7);
        match err {
            AppError::OutOfStock { available, message } => {
                assert_eq!(available, 7);
                assert!(message.contains("7"));
            }
            _ => panic!("expected OutOfStock"),
        }
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::not_found("x").code(), "E0003");
        assert_eq!(AppError::conflict("x").code(), "E0004");
        assert_eq!(AppError::invalid("x").code(), "E0006");
        assert_eq!(AppError::out_of_stock("x", 0).code(), "E4001");
        assert_eq!(AppError::database("x").code(), "E9002");
    }

    #[test]
    fn test_display_uses_message() {
        let err = AppError::invalid("cart is empty");
        assert_eq!(format!("{err}"), "Invalid request: cart is empty");
    }
}
