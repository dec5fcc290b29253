//! Auth Router
//!
//! Paths are relative to the `/api` nest done by the binary.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};

use crate::presentation::handlers::{self, AuthAppState, AuthRepos, AuthStore};
use crate::presentation::middleware::{authenticated, protected, require_totp};

/// Every auth, account, role and permission route
pub fn auth_router<R, S>(state: AuthAppState<R, S>) -> Router
where
    R: AuthRepos,
    S: AuthStore,
{
    let guard = state.guard();

    let public = Router::new()
        .route("/auth/login", post(handlers::login::<R, S>))
        .route("/auth/refresh", post(handlers::refresh::<R, S>))
        .route("/auth/password/reset", post(handlers::password_reset::<R, S>))
        .route(
            "/auth/password/reset/{token}",
            post(handlers::password_reset_confirm::<R, S>),
        )
        .with_state(state.clone());

    let session = Router::new()
        .route("/auth/logout", post(handlers::logout::<R, S>))
        .route(
            "/auth/session",
            get(handlers::current_session).put(handlers::switch_session::<R, S>),
        )
        .route("/auth/otp/generate", post(handlers::otp_generate::<R, S>))
        .route("/auth/otp/enable", post(handlers::otp_enable::<R, S>))
        .with_state(state.clone());

    // Enrolled callers confirm these with a current code
    let totp_gated = Router::new()
        .route("/auth/otp/disable", post(handlers::otp_disable::<R, S>))
        .route("/auth/password/change", post(handlers::password_change::<R, S>))
        .route_layer(from_fn_with_state(state.clone(), require_totp::<R, S>))
        .with_state(state.clone());

    let admin = Router::new()
        .route(
            "/accounts",
            get(handlers::list_accounts::<R, S>).post(handlers::create_account::<R, S>),
        )
        .route(
            "/accounts/{id}",
            get(handlers::get_account::<R, S>)
                .put(handlers::update_account::<R, S>)
                .delete(handlers::delete_account::<R, S>),
        )
        .route(
            "/accounts/{id}/roles",
            put(handlers::attach_roles::<R, S>).delete(handlers::detach_roles::<R, S>),
        )
        .route(
            "/accounts/{id}/organizations",
            put(handlers::attach_organizations::<R, S>)
                .delete(handlers::detach_organizations::<R, S>),
        )
        .route(
            "/accounts/{id}/operators",
            put(handlers::attach_operators::<R, S>).delete(handlers::detach_operators::<R, S>),
        )
        .route(
            "/accounts/{id}/change_password",
            put(handlers::admin_change_password::<R, S>),
        )
        .route(
            "/roles",
            get(handlers::list_roles::<R, S>).post(handlers::create_role::<R, S>),
        )
        .route(
            "/roles/{id}",
            get(handlers::get_role::<R, S>)
                .put(handlers::update_role::<R, S>)
                .delete(handlers::delete_role::<R, S>),
        )
        .route(
            "/roles/{id}/permissions",
            put(handlers::set_role_permissions::<R, S>),
        )
        .route(
            "/permissions",
            get(handlers::list_permissions::<R, S>).post(handlers::create_permission::<R, S>),
        )
        .route(
            "/permissions/{id}",
            get(handlers::get_permission::<R, S>)
                .put(handlers::update_permission::<R, S>)
                .delete(handlers::delete_permission::<R, S>),
        )
        .route_layer(from_fn_with_state(state.clone(), require_totp::<R, S>))
        .with_state(state);

    public
        .merge(authenticated(session.merge(totp_gated), guard.clone()))
        .merge(protected(admin, guard))
}
