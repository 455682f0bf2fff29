//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Infrastructure Errors**: database or store failures (always 500)
/// - **Authentication Errors**: missing/invalid session, non-admin caller
/// - **Resource Errors**: requested resources not found
/// - **Purchase Errors**: the hard failures of the coin purchase flow
/// - **Validation Errors**: invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database internal failure (serialization, store fault).
    #[error("Internal error: {0}")]
    Internal(String),

    /// Session token is missing, unknown, revoked or belongs to a banned user.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or missing session")]
    Unauthorized,

    /// Authenticated caller lacks the admin role.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Admin role required")]
    Forbidden,

    /// Requested entity does not exist or is not visible to the caller.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Buyer balance is lower than the requested amount.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// The coin amount sent by the client does not match the item's current price.
    #[error("Price mismatch: item costs {expected} coins, request offered {offered}")]
    PriceMismatch { expected: i64, offered: i64 },

    /// Item is already sold, inactive or free.
    #[error("Item is not available for purchase")]
    ItemUnavailable,

    /// The optimistic balance guard failed; another write happened since the read.
    ///
    /// Returns HTTP 409 Conflict. Clients retry the whole request.
    #[error("Balance changed concurrently, please retry")]
    BalanceConflict,

    /// Service request is not pending anymore.
    #[error("Request is already {0}")]
    InvalidTransition(String),

    /// Webhook URL failed validation.
    #[error("Invalid webhook URL")]
    InvalidWebhookUrl(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

impl AppError {
    /// Stable machine-readable code sent in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::InsufficientBalance => "insufficient_balance",
            AppError::PriceMismatch { .. } => "price_mismatch",
            AppError::ItemUnavailable => "item_unavailable",
            AppError::BalanceConflict => "balance_conflict",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::InvalidWebhookUrl(_) => "invalid_webhook_url",
            AppError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientBalance
            | AppError::PriceMismatch { .. }
            | AppError::ItemUnavailable => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BalanceConflict => StatusCode::CONFLICT,
            AppError::InvalidTransition(_)
            | AppError::InvalidWebhookUrl(_)
            | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Infrastructure errors are logged here and replaced by a generic message so
/// database details never reach the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "An internal error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "An internal error occurred".to_string()
            }
            AppError::InvalidRequest(msg) | AppError::InvalidWebhookUrl(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
