//! HTTP Handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use gateway::Mailer;
use kernel::id::{AccountId, PermissionId, RoleId};
use kernel::pagination::PageRequest;
use kernel::response::ApiResponse;

use crate::application::{
    AccountAdminUseCase, AuthConfig, CreateAccountInput, JwtManager, LoginInput, LoginUseCase,
    LogoutUseCase, PasswordUseCase, PermissionInput, PermissionUseCase, RefreshUseCase, RoleInput,
    RoleUseCase, SessionContextUseCase, SwitchInput, TotpUseCase, UpdateAccountInput,
};
use crate::domain::entity::{permission::Permission, role::Role};
use crate::domain::repository::{
    AccountLink, AccountRepository, PermissionRepository, RoleRepository, SessionRepository,
    TokenRepository,
};
use crate::error::AuthResult;
use crate::presentation::dto::{
    AccountResponse, CreateAccountRequest, DeletedResponse, LinkRequest, LoginRequest,
    PasswordChangeRequest, PasswordResetRequest, PasswordSetRequest, PermissionRequest,
    RefreshRequest, RolePermissionsRequest, RolePermissionsResponse, RoleRequest,
    SessionResponse, SwitchSessionRequest, TokenResponse, TotpCodeRequest, TotpGenerateResponse,
    UpdateAccountRequest,
};
use crate::presentation::extract::{AccessToken, CurrentSession};
use crate::presentation::middleware::AuthGuard;

/// Shared state for auth handlers
///
/// `repo` serves accounts, roles and permissions; `store` sessions and
/// tokens.
pub struct AuthAppState<R, S> {
    pub repo: Arc<R>,
    pub store: Arc<S>,
    pub jwt: Arc<JwtManager>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AuthConfig>,
}

impl<R, S> Clone for AuthAppState<R, S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            store: self.store.clone(),
            jwt: self.jwt.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, S> AuthAppState<R, S> {
    pub fn new(repo: R, store: S, mailer: Arc<dyn Mailer>, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            store: Arc::new(store),
            jwt: Arc::new(JwtManager::from_config(&config)),
            mailer,
            config: Arc::new(config),
        }
    }

    pub fn guard(&self) -> AuthGuard<S> {
        AuthGuard {
            store: self.store.clone(),
            jwt: self.jwt.clone(),
        }
    }
}

/// Bounds shared by every handler
pub trait AuthRepos: AccountRepository + RoleRepository + PermissionRepository + Send + Sync + 'static {}
impl<T> AuthRepos for T where T: AccountRepository + RoleRepository + PermissionRepository + Send + Sync + 'static {}

pub trait AuthStore: SessionRepository + TokenRepository + Send + Sync + 'static {}
impl<T> AuthStore for T where T: SessionRepository + TokenRepository + Send + Sync + 'static {}

// ============================================================================
// Login / Refresh / Logout
// ============================================================================

/// POST /api/auth/login
pub async fn login<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<ApiResponse<TokenResponse>> {
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.store.clone(),
        state.jwt.clone(),
        state.config.clone(),
    );
    let output = use_case
        .execute(LoginInput {
            auth_provider_id: req.auth_provider_id,
            password: req.password,
            totp: req.totp,
        })
        .await?;

    Ok(ApiResponse::ok(TokenResponse::new(output.tokens, output.session)))
}

/// POST /api/auth/refresh
pub async fn refresh<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<ApiResponse<TokenResponse>> {
    let use_case = RefreshUseCase::new(
        state.repo.clone(),
        state.store.clone(),
        state.jwt.clone(),
        state.config.clone(),
    );
    let output = use_case.execute(&req.refresh_token).await?;

    Ok(ApiResponse::ok(TokenResponse::new(output.tokens, output.session)))
}

/// POST /api/auth/logout
pub async fn logout<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    AccessToken(token): AccessToken,
) -> AuthResult<ApiResponse<bool>> {
    LogoutUseCase::new(state.store.clone())
        .execute(&session, &token)
        .await?;
    Ok(ApiResponse::ok(true))
}

// ============================================================================
// Session
// ============================================================================

/// GET /api/auth/session
pub async fn current_session(
    CurrentSession(session): CurrentSession,
) -> AuthResult<ApiResponse<SessionResponse>> {
    Ok(ApiResponse::ok(session.into()))
}

/// PUT /api/auth/session
pub async fn switch_session<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<SwitchSessionRequest>,
) -> AuthResult<ApiResponse<SessionResponse>> {
    let session = SessionContextUseCase::new(state.store.clone())
        .switch(
            session,
            SwitchInput {
                organization_id: req.organization_id,
                currency: req.currency,
            },
        )
        .await?;
    Ok(ApiResponse::ok(session.into()))
}

// ============================================================================
// TOTP
// ============================================================================

fn totp_use_case<R: AuthRepos, S: AuthStore>(state: &AuthAppState<R, S>) -> TotpUseCase<R, S> {
    TotpUseCase::new(state.repo.clone(), state.store.clone(), state.config.clone())
}

/// POST /api/auth/otp/generate
pub async fn otp_generate<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
) -> AuthResult<ApiResponse<TotpGenerateResponse>> {
    let output = totp_use_case(&state).generate(session.account.id).await?;
    Ok(ApiResponse::ok(TotpGenerateResponse {
        secret: output.secret,
        url: output.url,
    }))
}

/// POST /api/auth/otp/enable
pub async fn otp_enable<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<TotpCodeRequest>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    let account = totp_use_case(&state)
        .enable(session.account.id, &req.totp)
        .await?;
    Ok(ApiResponse::ok(account.into()))
}

/// POST /api/auth/otp/disable (TOTP guarded)
pub async fn otp_disable<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
) -> AuthResult<ApiResponse<AccountResponse>> {
    let account = totp_use_case(&state).disable(session.account.id).await?;
    Ok(ApiResponse::ok(account.into()))
}

// ============================================================================
// Password
// ============================================================================

fn password_use_case<R: AuthRepos, S: AuthStore>(
    state: &AuthAppState<R, S>,
) -> PasswordUseCase<R, S> {
    PasswordUseCase::new(
        state.repo.clone(),
        state.store.clone(),
        state.mailer.clone(),
        state.config.clone(),
    )
}

/// POST /api/auth/password/reset
pub async fn password_reset<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<PasswordResetRequest>,
) -> AuthResult<ApiResponse<bool>> {
    password_use_case(&state).request_reset(&req.email).await?;
    Ok(ApiResponse::ok(true))
}

/// POST /api/auth/password/reset/{token}
pub async fn password_reset_confirm<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(token): Path<String>,
    Json(req): Json<PasswordSetRequest>,
) -> AuthResult<ApiResponse<bool>> {
    password_use_case(&state).reset(&token, req.password).await?;
    Ok(ApiResponse::ok(true))
}

/// POST /api/auth/password/change
pub async fn password_change<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<PasswordChangeRequest>,
) -> AuthResult<ApiResponse<bool>> {
    password_use_case(&state)
        .change(session.account.id, req.old_password, req.new_password)
        .await?;
    Ok(ApiResponse::ok(true))
}

// ============================================================================
// Accounts
// ============================================================================

fn accounts_use_case<R: AuthRepos, S: AuthStore>(
    state: &AuthAppState<R, S>,
) -> AccountAdminUseCase<R, R, S> {
    AccountAdminUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.store.clone(),
        state.config.clone(),
    )
}

/// GET /api/accounts
pub async fn list_accounts<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Query(query): Query<HashMap<String, String>>,
) -> AuthResult<ApiResponse<Vec<AccountResponse>>> {
    let request = PageRequest::from_query(&query)?;
    let page = accounts_use_case(&state).list(&request).await?;
    Ok(ApiResponse::paged(page.map(AccountResponse::from)))
}

/// POST /api/accounts
pub async fn create_account<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<CreateAccountRequest>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    let account = accounts_use_case(&state)
        .create(CreateAccountInput {
            email: req.email,
            auth_provider_id: req.auth_provider_id,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
            status: req.status,
        })
        .await?;
    Ok(ApiResponse::ok(account.into()))
}

/// GET /api/accounts/{id}
pub async fn get_account<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<AccountId>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    let account = accounts_use_case(&state).get(id).await?;
    Ok(ApiResponse::ok(account.into()))
}

/// PUT /api/accounts/{id}
pub async fn update_account<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<AccountId>,
    Json(req): Json<UpdateAccountRequest>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    let account = accounts_use_case(&state)
        .update(
            id,
            UpdateAccountInput {
                email: req.email,
                auth_provider_id: req.auth_provider_id,
                first_name: req.first_name,
                last_name: req.last_name,
                status: req.status,
            },
        )
        .await?;
    Ok(ApiResponse::ok(account.into()))
}

/// DELETE /api/accounts/{id}
pub async fn delete_account<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<AccountId>,
) -> AuthResult<ApiResponse<DeletedResponse>> {
    accounts_use_case(&state).delete(&session, id).await?;
    Ok(ApiResponse::ok(DeletedResponse { id: id.into_uuid() }))
}

async fn attach_link<R: AuthRepos, S: AuthStore>(
    state: AuthAppState<R, S>,
    session: crate::domain::entity::session::Session,
    id: AccountId,
    link: AccountLink,
    ids: Vec<uuid::Uuid>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    let account = accounts_use_case(&state)
        .attach(&session, id, link, ids)
        .await?;
    Ok(ApiResponse::ok(account.into()))
}

async fn detach_link<R: AuthRepos, S: AuthStore>(
    state: AuthAppState<R, S>,
    session: crate::domain::entity::session::Session,
    id: AccountId,
    link: AccountLink,
    ids: Vec<uuid::Uuid>,
) -> AuthResult<ApiResponse<()>> {
    accounts_use_case(&state)
        .detach(&session, id, link, ids)
        .await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/accounts/{id}/roles
pub async fn attach_roles<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<AccountId>,
    Json(req): Json<LinkRequest>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    attach_link(state, session, id, AccountLink::Roles, req.ids).await
}

/// DELETE /api/accounts/{id}/roles
pub async fn detach_roles<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<AccountId>,
    Json(req): Json<LinkRequest>,
) -> AuthResult<ApiResponse<()>> {
    detach_link(state, session, id, AccountLink::Roles, req.ids).await
}

/// PUT /api/accounts/{id}/organizations
pub async fn attach_organizations<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<AccountId>,
    Json(req): Json<LinkRequest>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    attach_link(state, session, id, AccountLink::Organizations, req.ids).await
}

/// DELETE /api/accounts/{id}/organizations
pub async fn detach_organizations<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<AccountId>,
    Json(req): Json<LinkRequest>,
) -> AuthResult<ApiResponse<()>> {
    detach_link(state, session, id, AccountLink::Organizations, req.ids).await
}

/// PUT /api/accounts/{id}/operators
pub async fn attach_operators<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<AccountId>,
    Json(req): Json<LinkRequest>,
) -> AuthResult<ApiResponse<AccountResponse>> {
    attach_link(state, session, id, AccountLink::Operators, req.ids).await
}

/// DELETE /api/accounts/{id}/operators
pub async fn detach_operators<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<AccountId>,
    Json(req): Json<LinkRequest>,
) -> AuthResult<ApiResponse<()>> {
    detach_link(state, session, id, AccountLink::Operators, req.ids).await
}

/// PUT /api/accounts/{id}/change_password
pub async fn admin_change_password<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<AccountId>,
    Json(req): Json<PasswordSetRequest>,
) -> AuthResult<ApiResponse<bool>> {
    password_use_case(&state)
        .admin_change(id, req.password)
        .await?;
    Ok(ApiResponse::ok(true))
}

// ============================================================================
// Roles
// ============================================================================

fn roles_use_case<R: AuthRepos, S: AuthStore>(
    state: &AuthAppState<R, S>,
) -> RoleUseCase<R, R, R, S> {
    RoleUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.store.clone(),
        state.config.clone(),
    )
}

fn role_input(req: RoleRequest) -> RoleInput {
    RoleInput {
        organization_id: req.organization_id,
        name: req.name,
        description: req.description,
        role_type: req.role_type,
    }
}

/// GET /api/roles
pub async fn list_roles<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Query(query): Query<HashMap<String, String>>,
) -> AuthResult<ApiResponse<Vec<Role>>> {
    let request = PageRequest::from_query(&query)?;
    Ok(ApiResponse::paged(roles_use_case(&state).list(&request).await?))
}

/// POST /api/roles
pub async fn create_role<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<RoleRequest>,
) -> AuthResult<ApiResponse<Role>> {
    let role = roles_use_case(&state)
        .create(&session, role_input(req))
        .await?;
    Ok(ApiResponse::ok(role))
}

/// GET /api/roles/{id}
pub async fn get_role<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<RoleId>,
) -> AuthResult<ApiResponse<Role>> {
    Ok(ApiResponse::ok(roles_use_case(&state).get(id).await?))
}

/// PUT /api/roles/{id}
pub async fn update_role<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<RoleId>,
    Json(req): Json<RoleRequest>,
) -> AuthResult<ApiResponse<Role>> {
    let role = roles_use_case(&state)
        .update(&session, id, role_input(req))
        .await?;
    Ok(ApiResponse::ok(role))
}

/// DELETE /api/roles/{id}
pub async fn delete_role<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<RoleId>,
) -> AuthResult<ApiResponse<DeletedResponse>> {
    roles_use_case(&state).delete(id).await?;
    Ok(ApiResponse::ok(DeletedResponse { id: id.into_uuid() }))
}

/// PUT /api/roles/{id}/permissions
pub async fn set_role_permissions<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<RoleId>,
    Json(req): Json<RolePermissionsRequest>,
) -> AuthResult<ApiResponse<RolePermissionsResponse>> {
    let output = roles_use_case(&state)
        .set_permissions(&session, id, req.permissions)
        .await?;
    Ok(ApiResponse::ok(RolePermissionsResponse {
        role: output.role,
        logout_failures: output.logout_failures,
    }))
}

// ============================================================================
// Permissions
// ============================================================================

fn permission_input(req: PermissionRequest) -> PermissionInput {
    PermissionInput {
        name: req.name,
        description: req.description,
        subject: req.subject,
        endpoint: req.endpoint,
        action: req.action,
    }
}

/// GET /api/permissions
pub async fn list_permissions<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Query(query): Query<HashMap<String, String>>,
) -> AuthResult<ApiResponse<Vec<Permission>>> {
    let request = PageRequest::from_query(&query)?;
    let page = PermissionUseCase::new(state.repo.clone())
        .list(&request)
        .await?;
    Ok(ApiResponse::paged(page))
}

/// POST /api/permissions
pub async fn create_permission<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<PermissionRequest>,
) -> AuthResult<ApiResponse<Permission>> {
    let permission = PermissionUseCase::new(state.repo.clone())
        .create(permission_input(req))
        .await?;
    Ok(ApiResponse::ok(permission))
}

/// GET /api/permissions/{id}
pub async fn get_permission<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<PermissionId>,
) -> AuthResult<ApiResponse<Permission>> {
    Ok(ApiResponse::ok(
        PermissionUseCase::new(state.repo.clone()).get(id).await?,
    ))
}

/// PUT /api/permissions/{id}
pub async fn update_permission<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<PermissionId>,
    Json(req): Json<PermissionRequest>,
) -> AuthResult<ApiResponse<Permission>> {
    let permission = PermissionUseCase::new(state.repo.clone())
        .update(id, permission_input(req))
        .await?;
    Ok(ApiResponse::ok(permission))
}

/// DELETE /api/permissions/{id}
pub async fn delete_permission<R: AuthRepos, S: AuthStore>(
    State(state): State<AuthAppState<R, S>>,
    Path(id): Path<PermissionId>,
) -> AuthResult<ApiResponse<DeletedResponse>> {
    PermissionUseCase::new(state.repo.clone())
        .delete(id)
        .await?;
    Ok(ApiResponse::ok(DeletedResponse { id: id.into_uuid() }))
}
