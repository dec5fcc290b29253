//! Login Use Case
//!
//! Verifies credentials (and TOTP when enrolled), then opens a session.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::jwt::{IssuedTokens, JwtManager};
use crate::application::sessions::SessionManager;
use crate::domain::entity::session::Session;
use crate::domain::repository::{AccountRepository, SessionRepository, TokenRepository};
use crate::error::{AuthError, AuthResult};

pub struct LoginInput {
    pub auth_provider_id: String,
    pub password: String,
    pub totp: Option<String>,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub tokens: IssuedTokens,
    pub session: Session,
}

pub struct LoginUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    account_repo: Arc<A>,
    sessions: SessionManager<S>,
    jwt: Arc<JwtManager>,
    config: Arc<AuthConfig>,
}

impl<A, S> LoginUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        store: Arc<S>,
        jwt: Arc<JwtManager>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            sessions: SessionManager::new(store, config.clone()),
            jwt,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let account = self
            .account_repo
            .find_by_auth_provider_id(input.auth_provider_id.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // bcrypt::verify compares in constant time
        let password = ClearTextPassword::new_unchecked(input.password);
        let valid = account
            .password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&password));
        if !valid {
            tracing::warn!(account_id = %account.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if !account.can_login() {
            return Err(AuthError::AccountBlocked);
        }

        if let Some(secret) = account.active_totp_secret() {
            let code = input
                .totp
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .ok_or(AuthError::TotpRequired)?;
            if !secret.verify(code, &account.auth_provider_id, &self.config.totp)? {
                return Err(AuthError::InvalidTotp);
            }
        }

        let tokens = self.jwt.issue(account.id)?;
        let session = self.sessions.open(account, &tokens, None).await?;

        tracing::info!(
            account_id = %session.account.id,
            session_id = %session.id,
            "Account logged in"
        );

        Ok(LoginOutput { tokens, session })
    }
}
