//! Account and login failures.

use thiserror::Error;

use bookbazar_core::EmailError;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Unknown email or wrong password; the two are never told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// `is_active` is false.
    #[error("account is inactive")]
    Inactive,

    #[error("user not found")]
    UserNotFound,

    /// The email is already registered.
    #[error("email already registered")]
    UserAlreadyExists,

    /// Carries the message shown next to the password field.
    #[error("{0}")]
    WeakPassword(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Argon2 could not produce or parse a hash.
    #[error("password hashing failed")]
    PasswordHash,
}
