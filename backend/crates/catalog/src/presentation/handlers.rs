//! HTTP Handlers

use std::collections::HashMap;
use std::sync::Arc;

use auth::presentation::CurrentSession;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use gateway::{ExchangeClient, ExchangeRate, Overlord};
use kernel::id::{CurrencySetId, GameId, OrganizationId, WagerSetId};
use kernel::pagination::PageRequest;
use kernel::response::ApiResponse;

use crate::application::{
    CatalogRepository, CreateOrganizationInput, CurrencySetInput, CurrencySetUseCase,
    CurrencyUseCase, DictionaryUseCase, GameInput, GameUseCase, LobbyConfig, LobbyUseCase,
    MultiplierUseCase, OrganizationUseCase, StartGameInput, UpdateOrganizationInput,
    WagerSetInput, WagerSetUseCase,
};
use crate::domain::entity::{
    Currency, CurrencyMultiplier, CurrencySet, Dictionary, Game, MultiplierGroup, Organization,
    OrganizationPair, PairKind, WagerSet,
};
use crate::error::CatalogResult;
use crate::presentation::dto::{
    CreateOrganizationRequest, DeletedResponse, DictionaryValueRequest, GameLinkRequest,
    MultiplierKeyQuery, MultiplierSearchQuery, OrganizationLinkRequest, PairQuery, RateRequest,
    StartGameResponse, UpdateOrganizationRequest, UploadResponse, WagerSetLinkRequest,
};

/// Shared state for catalog handlers
pub struct CatalogAppState<R> {
    pub repo: Arc<R>,
    pub overlord: Arc<dyn Overlord>,
    pub exchange: Arc<dyn ExchangeClient>,
    pub lobby: Arc<LobbyConfig>,
}

impl<R> Clone for CatalogAppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            overlord: self.overlord.clone(),
            exchange: self.exchange.clone(),
            lobby: self.lobby.clone(),
        }
    }
}

impl<R> CatalogAppState<R> {
    pub fn new(
        repo: R,
        overlord: Arc<dyn Overlord>,
        exchange: Arc<dyn ExchangeClient>,
        lobby: LobbyConfig,
    ) -> Self {
        Self {
            repo: Arc::new(repo),
            overlord,
            exchange,
            lobby: Arc::new(lobby),
        }
    }
}

fn organizations<R: CatalogRepository>(state: &CatalogAppState<R>) -> OrganizationUseCase<R> {
    OrganizationUseCase::new(state.repo.clone(), state.overlord.clone())
}

fn games<R: CatalogRepository>(state: &CatalogAppState<R>) -> GameUseCase<R> {
    GameUseCase::new(state.repo.clone(), state.overlord.clone())
}

fn wager_sets<R: CatalogRepository>(state: &CatalogAppState<R>) -> WagerSetUseCase<R> {
    WagerSetUseCase::new(state.repo.clone(), state.overlord.clone())
}

fn currencies<R: CatalogRepository>(state: &CatalogAppState<R>) -> CurrencyUseCase<R> {
    CurrencyUseCase::new(
        state.repo.clone(),
        state.overlord.clone(),
        state.exchange.clone(),
    )
}

fn multipliers<R: CatalogRepository>(state: &CatalogAppState<R>) -> MultiplierUseCase<R> {
    MultiplierUseCase::new(state.repo.clone(), state.overlord.clone())
}

// ============================================================================
// Organizations
// ============================================================================

/// GET /api/organizations
pub async fn list_organizations<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<ApiResponse<Vec<Organization>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(organizations(&state).list(&request).await?))
}

/// POST /api/organizations
pub async fn create_organization<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<CreateOrganizationRequest>,
) -> CatalogResult<ApiResponse<Organization>> {
    let organization = organizations(&state)
        .create(
            session.account.id,
            CreateOrganizationInput {
                name: req.name,
                organization_type: req.organization_type,
            },
        )
        .await?;
    Ok(ApiResponse::ok(organization))
}

/// GET /api/organizations/{id}
pub async fn get_organization<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
) -> CatalogResult<ApiResponse<Organization>> {
    Ok(ApiResponse::ok(organizations(&state).get(id).await?))
}

/// PUT /api/organizations/{id}
pub async fn update_organization<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<UpdateOrganizationRequest>,
) -> CatalogResult<ApiResponse<Organization>> {
    let organization = organizations(&state)
        .update(
            id,
            UpdateOrganizationInput {
                name: req.name,
                status: req.status,
            },
        )
        .await?;
    Ok(ApiResponse::ok(organization))
}

/// DELETE /api/organizations/{id}
pub async fn delete_organization<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<OrganizationId>,
) -> CatalogResult<ApiResponse<DeletedResponse>> {
    organizations(&state).delete(session.account.id, id).await?;
    Ok(ApiResponse::ok(DeletedResponse::new(id)))
}

// ----------------------------------------------------------------------------
// Pairs
// ----------------------------------------------------------------------------

/// GET /api/organizations/{id}/integrators
pub async fn list_integrators<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
) -> CatalogResult<ApiResponse<Vec<OrganizationPair>>> {
    let pairs = organizations(&state)
        .pairs(PairKind::ProviderIntegrator, id)
        .await?;
    Ok(ApiResponse::ok(pairs))
}

/// POST /api/organizations/{id}/integrators
pub async fn add_integrator<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<OrganizationLinkRequest>,
) -> CatalogResult<ApiResponse<OrganizationPair>> {
    let pair = organizations(&state)
        .pair(PairKind::ProviderIntegrator, id, req.id)
        .await?;
    Ok(ApiResponse::ok(pair))
}

/// DELETE /api/organizations/{id}/integrators
pub async fn remove_integrator<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<OrganizationLinkRequest>,
) -> CatalogResult<ApiResponse<()>> {
    organizations(&state)
        .unpair(PairKind::ProviderIntegrator, id, req.id)
        .await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/organizations/{id}/operators
pub async fn list_operators<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
) -> CatalogResult<ApiResponse<Vec<OrganizationPair>>> {
    let pairs = organizations(&state)
        .pairs(PairKind::IntegratorOperator, id)
        .await?;
    Ok(ApiResponse::ok(pairs))
}

/// POST /api/organizations/{id}/operators
pub async fn add_operator<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<OrganizationLinkRequest>,
) -> CatalogResult<ApiResponse<OrganizationPair>> {
    let pair = organizations(&state)
        .pair(PairKind::IntegratorOperator, id, req.id)
        .await?;
    Ok(ApiResponse::ok(pair))
}

/// DELETE /api/organizations/{id}/operators
pub async fn remove_operator<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<OrganizationLinkRequest>,
) -> CatalogResult<ApiResponse<()>> {
    organizations(&state)
        .unpair(PairKind::IntegratorOperator, id, req.id)
        .await?;
    Ok(ApiResponse::no_content())
}

// ----------------------------------------------------------------------------
// Integrator assignments
// ----------------------------------------------------------------------------

/// GET /api/organizations/{id}/game
pub async fn list_assigned_games<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
) -> CatalogResult<ApiResponse<Vec<Game>>> {
    Ok(ApiResponse::ok(organizations(&state).games(id).await?))
}

/// POST /api/organizations/{id}/game
pub async fn assign_game<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<GameLinkRequest>,
) -> CatalogResult<ApiResponse<Vec<Game>>> {
    let use_case = organizations(&state);
    use_case.assign_game(id, req.game_id).await?;
    Ok(ApiResponse::ok(use_case.games(id).await?))
}

/// DELETE /api/organizations/{id}/game
pub async fn unassign_game<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<GameLinkRequest>,
) -> CatalogResult<ApiResponse<()>> {
    organizations(&state).unassign_game(id, req.game_id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/organizations/{id}/wager_set
pub async fn assign_wager_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<WagerSetLinkRequest>,
) -> CatalogResult<ApiResponse<bool>> {
    organizations(&state)
        .assign_wager_set(id, req.game_id, req.wager_set_id)
        .await?;
    Ok(ApiResponse::ok(true))
}

/// DELETE /api/organizations/{id}/wager_set
pub async fn unassign_wager_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<OrganizationId>,
    Json(req): Json<WagerSetLinkRequest>,
) -> CatalogResult<ApiResponse<()>> {
    organizations(&state)
        .unassign_wager_set(id, req.game_id, req.wager_set_id)
        .await?;
    Ok(ApiResponse::no_content())
}

// ============================================================================
// Games
// ============================================================================

/// GET /api/game
pub async fn list_games<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<ApiResponse<Vec<Game>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(games(&state).list(&request).await?))
}

/// POST /api/game
pub async fn create_game<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(input): Json<GameInput>,
) -> CatalogResult<ApiResponse<Game>> {
    Ok(ApiResponse::ok(games(&state).create(input).await?))
}

/// GET /api/game/{id}
pub async fn get_game<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<GameId>,
) -> CatalogResult<ApiResponse<Game>> {
    Ok(ApiResponse::ok(games(&state).get(id).await?))
}

/// PUT /api/game/{id}
pub async fn update_game<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<GameId>,
    Json(input): Json<GameInput>,
) -> CatalogResult<ApiResponse<Game>> {
    Ok(ApiResponse::ok(games(&state).update(id, input).await?))
}

/// DELETE /api/game/{id}
pub async fn delete_game<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<GameId>,
) -> CatalogResult<ApiResponse<DeletedResponse>> {
    games(&state).delete(id).await?;
    Ok(ApiResponse::ok(DeletedResponse::new(id)))
}

// ============================================================================
// Wager sets
// ============================================================================

/// GET /api/wager_set
pub async fn list_wager_sets<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<ApiResponse<Vec<WagerSet>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(wager_sets(&state).list(&request).await?))
}

/// POST /api/wager_set
pub async fn create_wager_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(input): Json<WagerSetInput>,
) -> CatalogResult<ApiResponse<WagerSet>> {
    Ok(ApiResponse::ok(wager_sets(&state).create(input).await?))
}

/// GET /api/wager_set/{id}
pub async fn get_wager_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<WagerSetId>,
) -> CatalogResult<ApiResponse<WagerSet>> {
    Ok(ApiResponse::ok(wager_sets(&state).get(id).await?))
}

/// PUT /api/wager_set/{id}
pub async fn update_wager_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<WagerSetId>,
    Json(input): Json<WagerSetInput>,
) -> CatalogResult<ApiResponse<WagerSet>> {
    Ok(ApiResponse::ok(wager_sets(&state).update(id, input).await?))
}

/// DELETE /api/wager_set/{id}
pub async fn delete_wager_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<WagerSetId>,
) -> CatalogResult<ApiResponse<DeletedResponse>> {
    wager_sets(&state).delete(id).await?;
    Ok(ApiResponse::ok(DeletedResponse::new(id)))
}

// ============================================================================
// Currencies
// ============================================================================

/// GET /api/currency
pub async fn list_currencies<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<ApiResponse<Vec<Currency>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(currencies(&state).list(&request).await?))
}

/// POST /api/currency
pub async fn create_currency<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(currency): Json<Currency>,
) -> CatalogResult<ApiResponse<Currency>> {
    Ok(ApiResponse::ok(currencies(&state).create(currency).await?))
}

/// PUT /api/currency
pub async fn update_currency<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(currency): Json<Currency>,
) -> CatalogResult<ApiResponse<Currency>> {
    Ok(ApiResponse::ok(currencies(&state).update(currency).await?))
}

/// DELETE /api/currency/{title}
pub async fn delete_currency<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(title): Path<String>,
) -> CatalogResult<ApiResponse<DeletedResponse>> {
    currencies(&state).delete(&title).await?;
    Ok(ApiResponse::ok(DeletedResponse::new(title.to_lowercase())))
}

/// GET /api/currency/{alias}/exchange
pub async fn get_rate<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(alias): Path<String>,
) -> CatalogResult<ApiResponse<ExchangeRate>> {
    Ok(ApiResponse::ok(currencies(&state).rate(&alias).await?))
}

/// PUT /api/currency/{alias}/exchange
pub async fn update_rate<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(alias): Path<String>,
    Json(req): Json<RateRequest>,
) -> CatalogResult<ApiResponse<ExchangeRate>> {
    Ok(ApiResponse::ok(
        currencies(&state).update_rate(&alias, req.rate).await?,
    ))
}

/// GET /api/currency/{alias}/exchange/history
pub async fn rate_history<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(alias): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<ApiResponse<Vec<ExchangeRate>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(
        currencies(&state).rate_history(&alias, &request).await?,
    ))
}

// ----------------------------------------------------------------------------
// Multipliers
// ----------------------------------------------------------------------------

/// GET /api/currency/multiplier
pub async fn list_multipliers<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<ApiResponse<Vec<CurrencyMultiplier>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(multipliers(&state).list(&request).await?))
}

/// POST /api/currency/multiplier
pub async fn create_multiplier<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(multiplier): Json<CurrencyMultiplier>,
) -> CatalogResult<ApiResponse<CurrencyMultiplier>> {
    Ok(ApiResponse::ok(multipliers(&state).create(multiplier).await?))
}

/// PUT /api/currency/multiplier
pub async fn update_multiplier<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(multiplier): Json<CurrencyMultiplier>,
) -> CatalogResult<ApiResponse<CurrencyMultiplier>> {
    Ok(ApiResponse::ok(multipliers(&state).update(multiplier).await?))
}

/// DELETE /api/currency/multiplier?organization_pair_id=&title=
pub async fn delete_multiplier<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(key): Query<MultiplierKeyQuery>,
) -> CatalogResult<ApiResponse<()>> {
    multipliers(&state)
        .delete(key.organization_pair_id, &key.title)
        .await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/currency/multiplier/get?organization_pair_id=
pub async fn multiplier_group<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<PairQuery>,
) -> CatalogResult<ApiResponse<MultiplierGroup>> {
    Ok(ApiResponse::ok(
        multipliers(&state).group(query.organization_pair_id).await?,
    ))
}

/// GET /api/currency/multiplier/search?provider_id=&integrator_id=
pub async fn search_multipliers<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<MultiplierSearchQuery>,
) -> CatalogResult<ApiResponse<MultiplierGroup>> {
    Ok(ApiResponse::ok(
        multipliers(&state)
            .search(query.provider_id, query.integrator_id)
            .await?,
    ))
}

/// GET /api/currency/multiplier/download?organization_pair_id=
pub async fn download_multipliers<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<PairQuery>,
) -> CatalogResult<Response> {
    let body = multipliers(&state)
        .download(query.organization_pair_id)
        .await?;
    let disposition = format!(
        "attachment; filename=\"multipliers-{}.csv\"",
        query.organization_pair_id
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/currency/multiplier/upload?organization_pair_id=
///
/// Body is the CSV text.
pub async fn upload_multipliers<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<PairQuery>,
    body: String,
) -> CatalogResult<ApiResponse<UploadResponse>> {
    let rows = multipliers(&state)
        .upload(query.organization_pair_id, &body)
        .await?;
    Ok(ApiResponse::ok(UploadResponse { rows }))
}

// ============================================================================
// Currency sets
// ============================================================================

/// GET /api/currency_set
pub async fn list_currency_sets<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<ApiResponse<Vec<CurrencySet>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(
        CurrencySetUseCase::new(state.repo.clone())
            .list(&request)
            .await?,
    ))
}

/// POST /api/currency_set
pub async fn create_currency_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(input): Json<CurrencySetInput>,
) -> CatalogResult<ApiResponse<CurrencySet>> {
    Ok(ApiResponse::ok(
        CurrencySetUseCase::new(state.repo.clone())
            .create(input)
            .await?,
    ))
}

/// GET /api/currency_set/{id}
pub async fn get_currency_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<CurrencySetId>,
) -> CatalogResult<ApiResponse<CurrencySet>> {
    Ok(ApiResponse::ok(
        CurrencySetUseCase::new(state.repo.clone()).get(id).await?,
    ))
}

/// PUT /api/currency_set/{id}
pub async fn update_currency_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<CurrencySetId>,
    Json(input): Json<CurrencySetInput>,
) -> CatalogResult<ApiResponse<CurrencySet>> {
    Ok(ApiResponse::ok(
        CurrencySetUseCase::new(state.repo.clone())
            .update(id, input)
            .await?,
    ))
}

/// DELETE /api/currency_set/{id}
pub async fn delete_currency_set<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<CurrencySetId>,
) -> CatalogResult<ApiResponse<DeletedResponse>> {
    CurrencySetUseCase::new(state.repo.clone()).delete(id).await?;
    Ok(ApiResponse::ok(DeletedResponse::new(id)))
}

// ============================================================================
// Dictionaries
// ============================================================================

/// GET /api/dictionaries/{name}
pub async fn get_dictionary<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(name): Path<String>,
) -> CatalogResult<ApiResponse<Vec<String>>> {
    let dictionary: Dictionary = name.parse()?;
    Ok(ApiResponse::ok(
        DictionaryUseCase::new(state.repo.clone())
            .values(dictionary)
            .await?,
    ))
}

/// POST /api/dictionaries/{name}
pub async fn add_dictionary_value<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(name): Path<String>,
    Json(req): Json<DictionaryValueRequest>,
) -> CatalogResult<ApiResponse<Vec<String>>> {
    let dictionary: Dictionary = name.parse()?;
    Ok(ApiResponse::ok(
        DictionaryUseCase::new(state.repo.clone())
            .add(dictionary, &req.value)
            .await?,
    ))
}

/// DELETE /api/dictionaries/{name}
pub async fn remove_dictionary_value<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Path(name): Path<String>,
    Json(req): Json<DictionaryValueRequest>,
) -> CatalogResult<ApiResponse<()>> {
    let dictionary: Dictionary = name.parse()?;
    DictionaryUseCase::new(state.repo.clone())
        .remove(dictionary, &req.value)
        .await?;
    Ok(ApiResponse::no_content())
}

// ============================================================================
// Lobby
// ============================================================================

/// POST /api/lobby/start_game
pub async fn start_game<R: CatalogRepository>(
    State(state): State<CatalogAppState<R>>,
    Json(input): Json<StartGameInput>,
) -> CatalogResult<ApiResponse<StartGameResponse>> {
    let url = LobbyUseCase::new(state.repo.clone(), state.overlord.clone(), state.lobby.clone())
        .start_game(input)
        .await?;
    Ok(ApiResponse::ok(StartGameResponse { url }))
}
