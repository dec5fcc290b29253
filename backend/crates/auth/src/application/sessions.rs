//! Session lifecycle shared by the use cases
//!
//! Opening a login (Token + Session under one jti), revoking everything an
//! account holds, and rewriting the account snapshot inside live sessions.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::application::config::AuthConfig;
use crate::application::jwt::IssuedTokens;
use crate::domain::entity::{account::Account, session::Session, token::Token};
use crate::domain::repository::{SessionRepository, TokenRepository};
use crate::error::{AuthError, AuthResult};

pub struct SessionManager<S>
where
    S: SessionRepository + TokenRepository,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SessionManager<S>
where
    S: SessionRepository + TokenRepository,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Persist the Token and a Session keyed by the same jti
    ///
    /// With `previous` the organization/currency context is carried over.
    pub async fn open(
        &self,
        account: Account,
        issued: &IssuedTokens,
        previous: Option<&Session>,
    ) -> AuthResult<Session> {
        let token = Token {
            id: issued.jti,
            account_id: account.id,
            access_token: issued.access_token.clone(),
            refresh_token: issued.refresh_token.clone(),
            expires_at: issued.access_expires_at,
            refresh_expires_at: issued.refresh_expires_at,
        };
        self.store.create_token(&token, self.config.refresh_ttl).await?;

        let session = match previous {
            Some(prev) => prev.rekey(issued.jti, account, issued.access_expires_at),
            None => Session::new(issued.jti, account, issued.access_expires_at),
        };
        self.store
            .create_session(&session, self.config.refresh_ttl)
            .await?;

        Ok(session)
    }

    /// Delete every Token, then every Session, of the account
    ///
    /// Keeps going past individual failures and hands them back.
    pub async fn invalidate_account(&self, account_id: AccountId) -> Vec<AuthError> {
        let mut errors = Vec::new();

        match self.store.tokens_for_account(account_id).await {
            Ok(tokens) => {
                for token in tokens {
                    if let Err(e) = self.store.delete_token(&token).await {
                        errors.push(e);
                    }
                }
            }
            Err(e) => errors.push(e),
        }

        match self.store.sessions_for_account(account_id).await {
            Ok(sessions) => {
                for session in sessions {
                    if let Err(e) = self.store.delete_session(session.id, account_id).await {
                        errors.push(e);
                    }
                }
            }
            Err(e) => errors.push(e),
        }

        if errors.is_empty() {
            tracing::info!(account_id = %account_id, "Account sessions invalidated");
        } else {
            tracing::warn!(
                account_id = %account_id,
                failures = errors.len(),
                "Account sessions partially invalidated"
            );
        }
        errors
    }

    /// Replace the account snapshot in every live session
    pub async fn refresh_snapshots(&self, account: &Account) -> AuthResult<usize> {
        let mut updated = 0;
        for mut session in self.store.sessions_for_account(account.id).await? {
            session.account = account.clone();
            if self.store.update_session(&session).await? {
                updated += 1;
            }
        }
        tracing::debug!(account_id = %account.id, sessions = updated, "Session snapshots refreshed");
        Ok(updated)
    }
}
