//! TOTP Use Case
//!
//! generate → enable (with a valid code) → disable. Each step rewrites the
//! account snapshot held by live sessions.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::application::config::AuthConfig;
use crate::application::sessions::SessionManager;
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, SessionRepository, TokenRepository};
use crate::domain::value_object::totp_secret::TotpSecret;
use crate::error::{AuthError, AuthResult};

pub struct TotpGenerateOutput {
    pub secret: String,
    pub url: String,
}

pub struct TotpUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    account_repo: Arc<A>,
    sessions: SessionManager<S>,
    config: Arc<AuthConfig>,
}

impl<A, S> TotpUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    pub fn new(account_repo: Arc<A>, store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            account_repo,
            sessions: SessionManager::new(store, config.clone()),
            config,
        }
    }

    async fn load(&self, account_id: AccountId) -> AuthResult<Account> {
        self.account_repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    async fn store(&self, account: &Account) -> AuthResult<()> {
        self.account_repo.update(account).await?;
        self.sessions.refresh_snapshots(account).await?;
        Ok(())
    }

    /// New secret, not yet active
    pub async fn generate(&self, account_id: AccountId) -> AuthResult<TotpGenerateOutput> {
        let mut account = self.load(account_id).await?;
        if account.totp_enabled {
            return Err(AuthError::TotpAlreadyEnabled);
        }

        let secret = TotpSecret::generate();
        let url = secret.otpauth_url(&account.auth_provider_id, &self.config.totp)?;
        let output = TotpGenerateOutput {
            secret: secret.as_base32().to_string(),
            url: url.clone(),
        };

        account.totp_secret = Some(secret);
        account.totp_url = Some(url);
        account.updated_at = chrono::Utc::now();
        self.store(&account).await?;

        tracing::info!(account_id = %account_id, "TOTP secret generated");
        Ok(output)
    }

    pub async fn enable(&self, account_id: AccountId, code: &str) -> AuthResult<Account> {
        let mut account = self.load(account_id).await?;
        if account.totp_enabled {
            return Err(AuthError::TotpAlreadyEnabled);
        }
        let secret = account
            .totp_secret
            .as_ref()
            .ok_or(AuthError::TotpNotGenerated)?;
        if !secret.verify(code, &account.auth_provider_id, &self.config.totp)? {
            return Err(AuthError::InvalidTotp);
        }

        account.totp_enabled = true;
        account.updated_at = chrono::Utc::now();
        self.store(&account).await?;

        tracing::info!(account_id = %account_id, "TOTP enabled");
        Ok(account)
    }

    /// Secret, URL and flag are all cleared
    pub async fn disable(&self, account_id: AccountId) -> AuthResult<Account> {
        let mut account = self.load(account_id).await?;
        account.clear_totp();
        self.store(&account).await?;

        tracing::info!(account_id = %account_id, "TOTP disabled");
        Ok(account)
    }
}
