//! Session context switch
//!
//! Changes the organization and currency the caller acts for.

use std::sync::Arc;

use kernel::id::OrganizationId;

use crate::domain::entity::session::Session;
use crate::domain::repository::SessionRepository;
use crate::error::{AuthError, AuthResult};

pub struct SwitchInput {
    pub organization_id: Option<OrganizationId>,
    pub currency: Option<String>,
}

pub struct SessionContextUseCase<S>
where
    S: SessionRepository,
{
    store: Arc<S>,
}

impl<S> SessionContextUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn switch(&self, mut session: Session, input: SwitchInput) -> AuthResult<Session> {
        if let Some(org_id) = input.organization_id {
            let organization = session
                .account
                .organization(org_id)
                .cloned()
                .ok_or(AuthError::OrganizationNotAssigned)?;
            session.organization = Some(organization);
        }

        if let Some(currency) = input.currency {
            let currency = currency.trim().to_lowercase();
            if currency.is_empty() {
                return Err(AuthError::validation("currency", "must not be empty"));
            }
            session.currency = Some(currency);
        }

        if !self.store.update_session(&session).await? {
            return Err(AuthError::SessionNotFound);
        }

        tracing::debug!(
            session_id = %session.id,
            organization = ?session.organization.as_ref().map(|o| o.id),
            currency = ?session.currency,
            "Session context switched"
        );
        Ok(session)
    }
}
