//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

use super::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] dashboard_core::EmailError),

    /// Password does not meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Unknown email, wrong password, or an identity without a password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An identity with this email already exists.
    #[error("user with this email already exists")]
    UserAlreadyExists,

    /// Identity not found.
    #[error("identity not found")]
    UserNotFound,

    /// Profile fields failed validation.
    #[error("{0}")]
    InvalidProfile(String),

    /// Password hashing failed.
    #[error("failed to hash password")]
    PasswordHash,

    /// Session token could not be issued.
    #[error("session token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/storage error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
