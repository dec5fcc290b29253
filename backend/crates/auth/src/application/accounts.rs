//! Account administration
//!
//! CRUD over accounts plus their role/organization/operator links.
//! Role links are guarded: root roles are never handed out or taken away
//! through the API, admin roles only by callers holding root.

use std::sync::Arc;

use kernel::error::app_error::FieldError;
use kernel::id::{AccountId, RoleId};
use kernel::pagination::{Page, PageRequest};
use platform::password::ClearTextPassword;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::sessions::SessionManager;
use crate::domain::entity::{account::Account, session::Session};
use crate::domain::repository::{
    AccountLink, AccountRepository, RoleRepository, SessionRepository, TokenRepository,
};
use crate::domain::value_object::{account_status::AccountStatus, email::Email, role_type::RoleType};
use crate::error::{AuthError, AuthResult};

pub struct CreateAccountInput {
    pub email: String,
    pub auth_provider_id: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub status: Option<AccountStatus>,
}

#[derive(Default)]
pub struct UpdateAccountInput {
    pub email: Option<String>,
    pub auth_provider_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<AccountStatus>,
}

pub struct AccountAdminUseCase<A, R, S>
where
    A: AccountRepository,
    R: RoleRepository,
    S: SessionRepository + TokenRepository,
{
    account_repo: Arc<A>,
    role_repo: Arc<R>,
    sessions: SessionManager<S>,
    config: Arc<AuthConfig>,
}

impl<A, R, S> AccountAdminUseCase<A, R, S>
where
    A: AccountRepository,
    R: RoleRepository,
    S: SessionRepository + TokenRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        role_repo: Arc<R>,
        store: Arc<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            role_repo,
            sessions: SessionManager::new(store, config.clone()),
            config,
        }
    }

    pub async fn list(&self, request: &PageRequest) -> AuthResult<Page<Account>> {
        self.account_repo.list(request).await
    }

    pub async fn get(&self, id: AccountId) -> AuthResult<Account> {
        self.account_repo
            .find_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    pub async fn create(&self, input: CreateAccountInput) -> AuthResult<Account> {
        let mut errors = Vec::new();
        let email = Email::new(&input.email)
            .map_err(|e| errors.push(FieldError::new("email", e.message())))
            .ok();
        let auth_provider_id = input.auth_provider_id.trim().to_string();
        if auth_provider_id.is_empty() {
            errors.push(FieldError::new("auth_provider_id", "must not be empty"));
        }
        let password = ClearTextPassword::new(input.password)
            .map_err(|e| errors.push(FieldError::new("password", e.to_string())))
            .ok();
        let (Some(email), Some(password), true) = (email, password, errors.is_empty()) else {
            return Err(AuthError::Validation(errors));
        };

        if self
            .account_repo
            .find_by_auth_provider_id(&auth_provider_id)
            .await?
            .is_some()
        {
            return Err(AuthError::AuthProviderIdTaken);
        }

        let mut account = Account::new(
            email,
            auth_provider_id,
            input.first_name.trim(),
            input.last_name.trim(),
            password.hash_with_cost(self.config.bcrypt_cost)?,
        );
        if let Some(status) = input.status {
            account.status = status;
        }
        self.account_repo.create(&account).await?;

        tracing::info!(account_id = %account.id, "Account created");
        self.get(account.id).await
    }

    pub async fn update(&self, id: AccountId, input: UpdateAccountInput) -> AuthResult<Account> {
        let mut account = self.get(id).await?;

        if let Some(email) = input.email {
            account.email = Email::new(&email)
                .map_err(|e| AuthError::validation("email", e.message()))?;
        }
        if let Some(auth_provider_id) = input.auth_provider_id {
            let auth_provider_id = auth_provider_id.trim().to_string();
            if auth_provider_id.is_empty() {
                return Err(AuthError::validation("auth_provider_id", "must not be empty"));
            }
            if auth_provider_id != account.auth_provider_id
                && self
                    .account_repo
                    .find_by_auth_provider_id(&auth_provider_id)
                    .await?
                    .is_some()
            {
                return Err(AuthError::AuthProviderIdTaken);
            }
            account.auth_provider_id = auth_provider_id;
        }
        if let Some(first_name) = input.first_name {
            account.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = input.last_name {
            account.last_name = last_name.trim().to_string();
        }
        if let Some(status) = input.status {
            account.status = status;
        }
        account.updated_at = chrono::Utc::now();
        self.account_repo.update(&account).await?;

        if account.can_login() {
            self.sessions.refresh_snapshots(&account).await?;
        } else {
            self.revoke(account.id).await;
        }

        tracing::info!(account_id = %id, "Account updated");
        Ok(account)
    }

    /// Soft delete; accounts holding a root role are never removed
    pub async fn delete(&self, caller: &Session, id: AccountId) -> AuthResult<()> {
        let account = self.get(id).await?;
        if account.has_root_role() {
            tracing::warn!(
                caller = %caller.account.id,
                account_id = %id,
                "Refused to remove root account"
            );
            return Err(AuthError::RootAccountRemoval);
        }

        if !self.account_repo.soft_delete(id).await? {
            return Err(AuthError::AccountNotFound);
        }
        self.revoke(id).await;

        tracing::info!(caller = %caller.account.id, account_id = %id, "Account deleted");
        Ok(())
    }

    pub async fn attach(
        &self,
        caller: &Session,
        id: AccountId,
        link: AccountLink,
        targets: Vec<Uuid>,
    ) -> AuthResult<Account> {
        self.get(id).await?;
        if link == AccountLink::Roles {
            self.check_role_change(caller, &targets).await?;
        }
        self.account_repo.attach(id, link, &targets).await?;
        self.relink(id).await
    }

    pub async fn detach(
        &self,
        caller: &Session,
        id: AccountId,
        link: AccountLink,
        targets: Vec<Uuid>,
    ) -> AuthResult<Account> {
        self.get(id).await?;
        if link == AccountLink::Roles {
            self.check_role_change(caller, &targets).await?;
        }
        self.account_repo.detach(id, link, &targets).await?;
        self.relink(id).await
    }

    async fn check_role_change(&self, caller: &Session, role_ids: &[Uuid]) -> AuthResult<()> {
        let mut ids: Vec<RoleId> = role_ids.iter().copied().map(RoleId::from_uuid).collect();
        ids.sort();
        ids.dedup();
        let roles = self.role_repo.find_by_ids(&ids).await?;
        if roles.len() != ids.len() {
            return Err(AuthError::RoleNotFound);
        }
        for role in &roles {
            match role.role_type {
                RoleType::Root => return Err(AuthError::ProtectedRole(role.name.clone())),
                RoleType::Admin if !caller.account.has_root_role() => {
                    return Err(AuthError::ProtectedRole(role.name.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Reload after a link change and push the result into live sessions
    async fn relink(&self, id: AccountId) -> AuthResult<Account> {
        let account = self.get(id).await?;
        self.sessions.refresh_snapshots(&account).await?;
        Ok(account)
    }

    async fn revoke(&self, id: AccountId) {
        for e in self.sessions.invalidate_account(id).await {
            tracing::warn!(account_id = %id, error = %e, "Session not revoked");
        }
    }
}
