//! Catalog Router
//!
//! Paths are relative to the `/api` nest done by the binary. Every route
//! goes through the permission check.

use auth::domain::repository::SessionRepository;
use auth::presentation::{AuthGuard, protected};
use axum::Router;
use axum::routing::{delete, get, post};

use crate::application::CatalogRepository;
use crate::presentation::handlers::{self, CatalogAppState};

pub fn catalog_router<R, S>(state: CatalogAppState<R>, guard: AuthGuard<S>) -> Router
where
    R: CatalogRepository,
    S: SessionRepository + Send + Sync + 'static,
{
    let router = Router::new()
        .route(
            "/organizations",
            get(handlers::list_organizations::<R>).post(handlers::create_organization::<R>),
        )
        .route(
            "/organizations/{id}",
            get(handlers::get_organization::<R>)
                .put(handlers::update_organization::<R>)
                .delete(handlers::delete_organization::<R>),
        )
        .route(
            "/organizations/{id}/integrators",
            get(handlers::list_integrators::<R>)
                .post(handlers::add_integrator::<R>)
                .delete(handlers::remove_integrator::<R>),
        )
        .route(
            "/organizations/{id}/operators",
            get(handlers::list_operators::<R>)
                .post(handlers::add_operator::<R>)
                .delete(handlers::remove_operator::<R>),
        )
        .route(
            "/organizations/{id}/game",
            get(handlers::list_assigned_games::<R>)
                .post(handlers::assign_game::<R>)
                .delete(handlers::unassign_game::<R>),
        )
        .route(
            "/organizations/{id}/wager_set",
            post(handlers::assign_wager_set::<R>).delete(handlers::unassign_wager_set::<R>),
        )
        .route(
            "/game",
            get(handlers::list_games::<R>).post(handlers::create_game::<R>),
        )
        .route(
            "/game/{id}",
            get(handlers::get_game::<R>)
                .put(handlers::update_game::<R>)
                .delete(handlers::delete_game::<R>),
        )
        .route(
            "/wager_set",
            get(handlers::list_wager_sets::<R>).post(handlers::create_wager_set::<R>),
        )
        .route(
            "/wager_set/{id}",
            get(handlers::get_wager_set::<R>)
                .put(handlers::update_wager_set::<R>)
                .delete(handlers::delete_wager_set::<R>),
        )
        .route(
            "/currency",
            get(handlers::list_currencies::<R>)
                .post(handlers::create_currency::<R>)
                .put(handlers::update_currency::<R>),
        )
        // one parameter name per segment: `alias` carries the title on delete
        .route("/currency/{alias}", delete(handlers::delete_currency::<R>))
        .route(
            "/currency/{alias}/exchange",
            get(handlers::get_rate::<R>).put(handlers::update_rate::<R>),
        )
        .route(
            "/currency/{alias}/exchange/history",
            get(handlers::rate_history::<R>),
        )
        .route(
            "/currency/multiplier",
            get(handlers::list_multipliers::<R>)
                .post(handlers::create_multiplier::<R>)
                .put(handlers::update_multiplier::<R>)
                .delete(handlers::delete_multiplier::<R>),
        )
        .route("/currency/multiplier/get", get(handlers::multiplier_group::<R>))
        .route("/currency/multiplier/search", get(handlers::search_multipliers::<R>))
        .route(
            "/currency/multiplier/download",
            get(handlers::download_multipliers::<R>),
        )
        .route(
            "/currency/multiplier/upload",
            post(handlers::upload_multipliers::<R>),
        )
        .route(
            "/currency_set",
            get(handlers::list_currency_sets::<R>).post(handlers::create_currency_set::<R>),
        )
        .route(
            "/currency_set/{id}",
            get(handlers::get_currency_set::<R>)
                .put(handlers::update_currency_set::<R>)
                .delete(handlers::delete_currency_set::<R>),
        )
        .route(
            "/dictionaries/{name}",
            get(handlers::get_dictionary::<R>)
                .post(handlers::add_dictionary_value::<R>)
                .delete(handlers::remove_dictionary_value::<R>),
        )
        .route("/lobby/start_game", post(handlers::start_game::<R>))
        .with_state(state);

    protected(router, guard)
}
