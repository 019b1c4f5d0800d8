//! # API Errors
//!
//! Every failure leaves the server as the same JSON envelope:
//!
//! ```json
//! { "ok": false, "error": "Insufficient stock for Ibuprofeno 400mg: available 2, requested 3", "code": "INSUFFICIENT_STOCK" }
//! ```
//!
//! ## Status Mapping
//! ```text
//! CheckoutError::EmptyCart / InvalidQuantity
//!     / ProductNotFound / InsufficientStock   → 400
//! CheckoutError::TransactionFailed            → 500 (detail logged, not sent)
//! DbError::NotFound                           → 404
//! DbError::UniqueViolation                    → 409
//! DbError::Validation, ValidationError        → 400
//! AccessDenied                                → 403
//! AuthError                                   → 401
//! malformed JSON body                         → 400
//! anything else                               → 500 (detail logged, not sent)
//! ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use farmasys_core::{AccessDenied, CheckoutError, ValidationError};
use farmasys_db::DbError;

/// Machine-readable failure kind, sent as `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    ValidationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    EmptyCart,
    InvalidQuantity,
    ProductNotFound,
    InsufficientStock,
    TransactionFailed,
    Internal,
}

/// Authentication failures. All of them are a 401 except a token that
/// could not be issued.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Failed to issue token: {0}")]
    TokenIssue(String),
}

/// An error on its way to becoming an HTTP response.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    error: &'a str,
    code: ErrorCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    /// A 500 whose detail only goes to the log.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            ok: false,
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        let code = match &err {
            CheckoutError::EmptyCart => ErrorCode::EmptyCart,
            CheckoutError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            CheckoutError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            CheckoutError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CheckoutError::TransactionFailed(detail) => {
                error!(error = %detail, "Checkout transaction failed");
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::TransactionFailed,
                    "Checkout failed, no changes were made",
                );
            }
        };
        Self::new(StatusCode::BAD_REQUEST, code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => Self::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => {
                Self::new(StatusCode::CONFLICT, ErrorCode::Conflict, err.to_string())
            }
            DbError::Validation(v) => v.into(),
            DbError::InsufficientStock { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::InsufficientStock,
                err.to_string(),
            ),
            other => Self::internal(other),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            err.to_string(),
        )
    }
}

impl From<AccessDenied> for ApiError {
    fn from(err: AccessDenied) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenIssue(_) => Self::internal(err),
            _ => Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
