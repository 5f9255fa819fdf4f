//! Application error types.

use aluforce_core::auth::AuthError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Authentication failures carry fixed messages so a caller can never tell
/// an unknown account from a wrong password, or an expired token from a
/// forged one.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Module access denied: {0}")]
    ModuleDenied(String),

    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingToken
            | AppError::InvalidOrExpiredToken
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InsufficientRole
            | AppError::AccountDisabled
            | AppError::ModuleDenied(_) => StatusCode::FORBIDDEN,
            AppError::DatabaseUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingToken => "missing_token",
            AppError::InvalidOrExpiredToken => "invalid_token",
            AppError::InsufficientRole => "insufficient_role",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AccountDisabled => "account_disabled",
            AppError::ModuleDenied(_) => "module_denied",
            AppError::DatabaseUnavailable(_) => "database_unavailable",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::DatabaseUnavailable(_) => "Service temporarily unavailable".into(),
            AppError::ModuleDenied(module) => format!("Access to module '{module}' denied"),
            AppError::Validation(m) | AppError::NotFound(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => error!(detail = %detail, "internal error"),
            AppError::DatabaseUnavailable(detail) => {
                warn!(detail = %detail, "database unavailable")
            }
            _ => {}
        }
        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message: self.public_message(),
        });
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if aluforce_core::db::is_unavailable(&e) {
            AppError::DatabaseUnavailable(e.to_string())
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::InvalidCredentials,
            AuthError::AccountDisabled => AppError::AccountDisabled,
            AuthError::Token(_) => AppError::InvalidOrExpiredToken,
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::DbError(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
