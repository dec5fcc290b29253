//! Logout Use Cases

use std::sync::Arc;

use kernel::id::RoleId;

use crate::application::config::AuthConfig;
use crate::application::sessions::SessionManager;
use crate::domain::entity::session::Session;
use crate::domain::repository::{AccountRepository, SessionRepository, TokenRepository};
use crate::error::AuthResult;

/// Invalidate the caller's own session
pub struct LogoutUseCase<S>
where
    S: SessionRepository + TokenRepository,
{
    store: Arc<S>,
}

impl<S> LogoutUseCase<S>
where
    S: SessionRepository + TokenRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, session: &Session, access_token: &str) -> AuthResult<()> {
        if let Some(token) = self.store.find_by_access(access_token).await? {
            self.store.delete_token(&token).await?;
        }
        self.store
            .delete_session(session.id, session.account.id)
            .await?;

        tracing::info!(
            account_id = %session.account.id,
            session_id = %session.id,
            "Account logged out"
        );
        Ok(())
    }
}

/// Log out every holder of a role
pub struct LogoutRoleUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    account_repo: Arc<A>,
    sessions: SessionManager<S>,
}

impl<A, S> LogoutRoleUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    pub fn new(account_repo: Arc<A>, store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            account_repo,
            sessions: SessionManager::new(store, config),
        }
    }

    /// Error messages of every item that could not be removed
    pub async fn execute(&self, role_id: RoleId) -> AuthResult<Vec<String>> {
        let accounts = self.account_repo.find_ids_by_role(role_id).await?;
        let mut failures = Vec::new();
        for account_id in &accounts {
            failures.extend(
                self.sessions
                    .invalidate_account(*account_id)
                    .await
                    .into_iter()
                    .map(|e| format!("{}: {}", account_id, e)),
            );
        }

        tracing::info!(
            role_id = %role_id,
            accounts = accounts.len(),
            failures = failures.len(),
            "Role holders logged out"
        );
        Ok(failures)
    }
}
