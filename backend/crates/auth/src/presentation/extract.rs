//! Request extractors filled in by [`authenticate`](super::middleware::authenticate)
//!
//! Other crates take `CurrentSession` in their handlers to learn who is
//! calling and for which organization.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::entity::session::Session;
use crate::error::AuthError;

#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<St: Send + Sync> FromRequestParts<St> for CurrentSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Raw `X-Authenticate` value of the current request
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

impl<St: Send + Sync> FromRequestParts<St> for AccessToken {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessToken>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}
