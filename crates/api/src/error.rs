//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::orders::CheckoutError;
use crate::services::account::AccountError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Account operation failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Request carries no valid authentication token.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Authenticated, but not allowed to touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::CartNotFound => Self::NotFound("cart not found for the user".to_owned()),
            CheckoutError::ProductNotFound(id) => {
                Self::NotFound(format!("product {id} in the cart no longer exists"))
            }
            CheckoutError::Database(e) => Self::Database(RepositoryError::Database(e)),
        }
    }
}

impl AppError {
    /// Whether this error is a server fault worth capturing.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Account(AccountError::Repository(_) | AccountError::PasswordHash)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Account(err) => match err {
                AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AccountError::UserNotFound => StatusCode::NOT_FOUND,
                // Duplicate usernames surface as a plain validation failure
                AccountError::UsernameTaken
                | AccountError::InvalidUsername(_)
                | AccountError::InvalidEmail(_)
                | AccountError::WeakPassword(_)
                | AccountError::PasswordMismatch
                | AccountError::WrongOldPassword => StatusCode::BAD_REQUEST,
                AccountError::Repository(_) | AccountError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Server faults are redacted.
    fn message(&self) -> String {
        match self {
            Self::Database(_)
            | Self::Internal(_)
            | Self::Account(AccountError::Repository(_) | AccountError::PasswordHash) => {
                "internal server error".to_owned()
            }
            Self::Account(AccountError::InvalidCredentials) => {
                "invalid username or password".to_owned()
            }
            Self::Unauthenticated => "invalid or missing token".to_owned(),
            Self::Account(err) => err.to_string(),
            Self::Forbidden(msg) | Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({ "error": self.message() });
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::ProductId;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes_follow_the_taxonomy() {
        assert_eq!(get_status(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::Forbidden("nope".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("missing".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("bad".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_account_errors_map_to_statuses() {
        assert_eq!(
            get_status(AppError::Account(AccountError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Account(AccountError::UsernameTaken)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Account(AccountError::PasswordMismatch)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_checkout_errors_are_not_found() {
        assert_eq!(
            get_status(CheckoutError::CartNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CheckoutError::ProductNotFound(ProductId::new(3)).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_internal_message_is_redacted() {
        let err = AppError::Internal("secret database string".to_owned());
        assert_eq!(err.message(), "internal server error");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::BadRequest("new passwords do not match".to_owned());
        assert_eq!(err.message(), "new passwords do not match");
    }
}
