//! Auth Middleware
//!
//! Chain for protected routes, outermost first:
//! `authenticate` → `authorize` → `require_totp` (auth mutations only).

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::Response;
use axum::Router;

use crate::application::jwt::JwtManager;
use crate::domain::repository::{AccountRepository, SessionRepository};
use crate::domain::value_object::action::Action;
use crate::error::{AuthError, AuthResult};
use crate::presentation::extract::{AccessToken, CurrentSession};
use crate::presentation::handlers::AuthAppState;

/// Header carrying the access JWT
pub const AUTH_HEADER: &str = "x-authenticate";

/// Permission endpoints are stored with this prefix
pub const API_PREFIX: &str = "/api";

/// Largest body the TOTP guard will buffer
const TOTP_BODY_LIMIT: usize = 1024 * 1024;

/// What `authenticate` needs; cheap to clone into every protected router
pub struct AuthGuard<S> {
    pub store: Arc<S>,
    pub jwt: Arc<JwtManager>,
}

impl<S> Clone for AuthGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            jwt: self.jwt.clone(),
        }
    }
}

/// Resolve `X-Authenticate` to a live Session
pub async fn authenticate<S>(
    State(guard): State<AuthGuard<S>>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response>
where
    S: SessionRepository + Send + Sync + 'static,
{
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().trim_start_matches("Bearer ").to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::Unauthenticated)?;

    let claims = guard.jwt.validate_access(&token)?;
    let session = guard
        .store
        .find_session(claims.jti)
        .await?
        .filter(|s| s.account.id == claims.sub)
        .ok_or(AuthError::Unauthenticated)?;

    req.extensions_mut().insert(CurrentSession(session));
    req.extensions_mut().insert(AccessToken(token));
    Ok(next.run(req).await)
}

/// Endpoint-level permission check against the matched route pattern
pub async fn authorize(req: Request, next: Next) -> AuthResult<Response> {
    let session = req
        .extensions()
        .get::<CurrentSession>()
        .ok_or(AuthError::Unauthenticated)?;
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| permission_endpoint(p.as_str()))
        .ok_or(AuthError::PermissionDenied)?;
    let action = Action::from_method(req.method()).ok_or(AuthError::PermissionDenied)?;

    if !session.0.account.is_authorized(&endpoint, action) {
        tracing::warn!(
            account_id = %session.0.account.id,
            endpoint = %endpoint,
            action = %action,
            "Permission denied"
        );
        return Err(AuthError::PermissionDenied);
    }
    Ok(next.run(req).await)
}

/// Mutations need a valid `totp` body field once the caller enrolled
pub async fn require_totp<R, S>(
    State(state): State<AuthAppState<R, S>>,
    req: Request,
    next: Next,
) -> AuthResult<Response>
where
    R: AccountRepository + Send + Sync + 'static,
    S: Send + Sync + 'static,
{
    if !matches!(*req.method(), Method::POST | Method::PUT | Method::DELETE) {
        return Ok(next.run(req).await);
    }

    let account_id = req
        .extensions()
        .get::<CurrentSession>()
        .map(|s| s.0.account.id)
        .ok_or(AuthError::Unauthenticated)?;
    let account = state
        .repo
        .find_by_id(account_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    let Some(secret) = account.active_totp_secret() else {
        return Ok(next.run(req).await);
    };

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, TOTP_BODY_LIMIT)
        .await
        .map_err(|_| AuthError::validation("body", "request body too large"))?;
    let code = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("totp").and_then(|t| t.as_str()).map(str::to_string))
        .filter(|c| !c.trim().is_empty())
        .ok_or(AuthError::TotpRequired)?;

    if !secret.verify(&code, &account.auth_provider_id, &state.config.totp)? {
        return Err(AuthError::InvalidTotp);
    }
    Ok(next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await)
}

/// `/accounts/{id}` → `/api/accounts/:id`
pub fn permission_endpoint(matched: &str) -> String {
    let path = matched
        .split('/')
        .map(|segment| {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => match name.strip_prefix('*') {
                    Some(rest) => format!("*{}", rest),
                    None => format!(":{}", name),
                },
                None => segment.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/");
    if path.starts_with(API_PREFIX) {
        path
    } else {
        format!("{}{}", API_PREFIX, path)
    }
}

/// Authentication only
pub fn authenticated<S>(router: Router, guard: AuthGuard<S>) -> Router
where
    S: SessionRepository + Send + Sync + 'static,
{
    router.route_layer(from_fn_with_state(guard, authenticate::<S>))
}

/// Authentication plus endpoint permission check
pub fn protected<S>(router: Router, guard: AuthGuard<S>) -> Router
where
    S: SessionRepository + Send + Sync + 'static,
{
    router
        .route_layer(from_fn(authorize))
        .route_layer(from_fn_with_state(guard, authenticate::<S>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_endpoint() {
        assert_eq!(permission_endpoint("/api/accounts/{id}"), "/api/accounts/:id");
        assert_eq!(permission_endpoint("/reports/financial"), "/api/reports/financial");
        assert_eq!(
            permission_endpoint("/api/currency/{alias}/exchange/history"),
            "/api/currency/:alias/exchange/history"
        );
    }
}
