//! Auth Error Types
//!
//! Auth-specific error variants folded into the unified
//! `kernel::error::AppError` taxonomy at the HTTP boundary.

use axum::response::{IntoResponse, Response};
use kernel::error::app_error::{AppError, FieldError, META_TOTP_REQUIRED};
use kernel::error::kind::ErrorKind;
use platform::kv::KvError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Role not found")]
    RoleNotFound,

    #[error("Permission not found")]
    PermissionNotFound,

    #[error("Session not found")]
    SessionNotFound,

    /// Unknown or already consumed refresh token
    #[error("Token not found")]
    TokenNotFound,

    #[error("Account with this auth provider id already exists")]
    AuthProviderIdTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is blocked")]
    AccountBlocked,

    /// Missing, malformed or expired `X-Authenticate` token
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("TOTP code required")]
    TotpRequired,

    #[error("Invalid TOTP code")]
    InvalidTotp,

    #[error("TOTP secret has not been generated")]
    TotpNotGenerated,

    #[error("TOTP is already enabled")]
    TotpAlreadyEnabled,

    #[error("Permission denied")]
    PermissionDenied,

    /// Root roles cannot be handed out, admin roles only by root holders
    #[error("Protected role cannot be changed: {0}")]
    ProtectedRole(String),

    #[error("Account holding a root role cannot be removed")]
    RootAccountRemoval,

    #[error("Role is assigned to {0} account(s)")]
    RoleInUse(i64),

    #[error("Organization is not assigned to the account")]
    OrganizationNotAssigned,

    #[error("Password reset token has expired")]
    ResetTokenExpired,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    Store(#[from] KvError),

    #[error("Token encoding error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Gateway(#[from] gateway::GatewayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AuthError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AccountNotFound
            | AuthError::RoleNotFound
            | AuthError::PermissionNotFound
            | AuthError::SessionNotFound
            | AuthError::TokenNotFound => ErrorKind::NotFound,
            AuthError::InvalidCredentials
            | AuthError::AccountBlocked
            | AuthError::Unauthenticated
            | AuthError::TotpRequired
            | AuthError::InvalidTotp
            | AuthError::PermissionDenied
            | AuthError::ProtectedRole(_) => ErrorKind::Unauthorized,
            AuthError::AuthProviderIdTaken
            | AuthError::TotpNotGenerated
            | AuthError::TotpAlreadyEnabled
            | AuthError::RootAccountRemoval
            | AuthError::RoleInUse(_)
            | AuthError::OrganizationNotAssigned
            | AuthError::ResetTokenExpired => ErrorKind::BadRequest,
            AuthError::Validation(_) => ErrorKind::UnprocessableEntity,
            AuthError::App(e) => e.kind(),
            AuthError::Database(_)
            | AuthError::Store(_)
            | AuthError::Jwt(_)
            | AuthError::Gateway(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => tracing::error!(error = %e, "Auth database error"),
            AuthError::Store(e) => tracing::error!(error = %e, "Session store error"),
            AuthError::Jwt(e) => tracing::error!(error = %e, "Token encoding error"),
            AuthError::Gateway(e) => tracing::error!(error = %e, "Auth gateway error"),
            AuthError::Internal(msg) => tracing::error!(message = %msg, "Auth internal error"),
            AuthError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Auth internal error")
            }
            AuthError::InvalidCredentials => tracing::warn!("Invalid login attempt"),
            AuthError::InvalidTotp => tracing::warn!("Invalid TOTP code"),
            AuthError::PermissionDenied | AuthError::ProtectedRole(_) => {
                tracing::warn!(error = %self, "Access denied")
            }
            _ => tracing::debug!(error = %self, "Auth error"),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::App(e) => e,
            AuthError::Database(e) => AppError::from(e),
            AuthError::Gateway(e) => AppError::from(e),
            AuthError::Validation(fields) => AppError::validation(fields),
            AuthError::TotpRequired => {
                AppError::unauthorized(AuthError::TotpRequired.to_string())
                    .with_meta(META_TOTP_REQUIRED)
            }
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::validation("password", err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
