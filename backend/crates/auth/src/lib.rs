//! Auth Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - PostgreSQL and key-value store implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Login with auth provider id + password, JWT access/refresh pair
//! - Sessions kept in the key-value store, keyed by the token `jti`
//! - TOTP second factor (RFC 6238) for login and auth mutations
//! - Password reset by mail, self-service and admin password change
//! - Accounts, roles, permissions and the endpoint-level permission check
//!
//! ## Security Model
//! - Passwords hashed with bcrypt
//! - A refresh token can be consumed once; both tokens rotate
//! - Root roles can neither be assigned nor revoked through the API

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{KvSessionStore, PgAuthRepository};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::extract::*;
    pub use crate::presentation::middleware::*;
}
