//! Password Use Cases
//!
//! Reset by mailed link, self-service change and admin change. Every
//! successful change revokes all sessions of the account.

use std::sync::Arc;

use chrono::Utc;
use gateway::{Mail, Mailer};
use kernel::id::AccountId;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::sessions::SessionManager;
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, SessionRepository, TokenRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Length in random bytes of a reset token
const RESET_TOKEN_BYTES: usize = 32;

pub struct PasswordUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    account_repo: Arc<A>,
    sessions: SessionManager<S>,
    mailer: Arc<dyn Mailer>,
    config: Arc<AuthConfig>,
}

impl<A, S> PasswordUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        store: Arc<S>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            sessions: SessionManager::new(store, config.clone()),
            mailer,
            config,
        }
    }

    /// Unknown addresses succeed silently
    pub async fn request_reset(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email)?;
        let Some(mut account) = self.account_repo.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = platform::crypto::random_token(RESET_TOKEN_BYTES);
        let ttl = chrono::Duration::from_std(self.config.reset_token_ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        account.reset_token = Some(token.clone());
        account.reset_token_expires_at = Some(Utc::now() + ttl);
        account.updated_at = Utc::now();
        self.account_repo.update(&account).await?;

        let link = format!(
            "{}/password/reset/{}",
            self.config.frontend_url.trim_end_matches('/'),
            token
        );
        let mail = Mail {
            subject: "Password reset".to_string(),
            to: account.email.to_string(),
            from: self.config.mail_sender.clone(),
            html: format!(
                "<p>Hello {},</p><p>Follow <a href=\"{}\">this link</a> to choose a new password.</p>",
                account.full_name(),
                link
            ),
        };
        self.mailer.send(&mail).await?;

        tracing::info!(account_id = %account.id, "Password reset link sent");
        Ok(())
    }

    pub async fn reset(&self, token: &str, new_password: String) -> AuthResult<()> {
        let mut account = self
            .account_repo
            .find_by_reset_token(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let expired = account
            .reset_token_expires_at
            .is_none_or(|expires_at| expires_at < Utc::now());
        if expired {
            return Err(AuthError::ResetTokenExpired);
        }

        self.apply(&mut account, new_password).await
    }

    /// Self-service change; the current password must match
    pub async fn change(
        &self,
        account_id: AccountId,
        old_password: String,
        new_password: String,
    ) -> AuthResult<()> {
        let mut account = self.load(account_id).await?;
        let old = ClearTextPassword::new_unchecked(old_password);
        let matches = account
            .password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&old));
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        self.apply(&mut account, new_password).await
    }

    /// Administrator sets a password for someone else
    pub async fn admin_change(&self, account_id: AccountId, new_password: String) -> AuthResult<()> {
        let mut account = self.load(account_id).await?;
        self.apply(&mut account, new_password).await
    }

    async fn load(&self, account_id: AccountId) -> AuthResult<Account> {
        self.account_repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    async fn apply(&self, account: &mut Account, new_password: String) -> AuthResult<()> {
        let password = ClearTextPassword::new(new_password)?;
        account.set_password(password.hash_with_cost(self.config.bcrypt_cost)?);
        self.account_repo.update(account).await?;

        for e in self.sessions.invalidate_account(account.id).await {
            tracing::warn!(account_id = %account.id, error = %e, "Session not revoked");
        }

        tracing::info!(account_id = %account.id, "Password changed");
        Ok(())
    }
}
