//! Refresh Use Case
//!
//! Rotates both the token pair and the session: the old Token and Session
//! are removed and a new Session is stored under the new jti.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::jwt::{IssuedTokens, JwtManager};
use crate::application::sessions::SessionManager;
use crate::domain::entity::session::Session;
use crate::domain::repository::{AccountRepository, SessionRepository, TokenRepository};
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
pub struct RefreshOutput {
    pub tokens: IssuedTokens,
    pub session: Session,
}

pub struct RefreshUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    account_repo: Arc<A>,
    store: Arc<S>,
    sessions: SessionManager<S>,
    jwt: Arc<JwtManager>,
}

impl<A, S> RefreshUseCase<A, S>
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
            sessions: SessionManager::new(store.clone(), config),
            store,
            jwt,
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<RefreshOutput> {
        let token = self
            .store
            .find_by_refresh(refresh_token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        // Losing this race means another request already consumed the token
        if !self.store.delete_token(&token).await? {
            return Err(AuthError::TokenNotFound);
        }

        let previous = self.store.find_session(token.id).await?;
        self.store.delete_session(token.id, token.account_id).await?;

        let account = self
            .account_repo
            .find_by_id(token.account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        if !account.can_login() {
            return Err(AuthError::AccountBlocked);
        }

        let tokens = self.jwt.issue(account.id)?;
        let session = self
            .sessions
            .open(account, &tokens, previous.as_ref())
            .await?;

        tracing::info!(
            account_id = %session.account.id,
            old_session_id = %token.id,
            session_id = %session.id,
            "Tokens refreshed"
        );

        Ok(RefreshOutput { tokens, session })
    }
}
