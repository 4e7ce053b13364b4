//! Account service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Username/password pair doesn't match any account.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Username is already taken.
    #[error("username already taken")]
    UsernameTaken,

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] bazaar_core::UsernameError),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Password fails the strength policy.
    #[error("{0}")]
    WeakPassword(String),

    /// The two new-password fields differ.
    #[error("new passwords do not match")]
    PasswordMismatch,

    /// Old password doesn't match the stored hash.
    #[error("old password is incorrect")]
    WrongOldPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing or verification failed internally.
    #[error("password hashing failed")]
    PasswordHash,
}
