//! Authentication and authorization logic.
//!
//! Provides password hashing, session token management, the credential store
//! and module permission resolution shared by `aluforce_api` and
//! `aluforce_cli`.

pub mod jwt;
pub mod password;
pub mod permissions;
pub mod queries;
pub mod store;

use thiserror::Error;

pub use jwt::TokenError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
