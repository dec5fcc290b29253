//! Session Entity
//!
//! Keyed by the token's jti. Carries an account snapshot so request
//! handling does not hit the database; the snapshot is rewritten whenever
//! security-relevant account state changes.
//!
//! A refresh moves the session to a new jti but keeps its `login_id`, so
//! state scoped to the login (export files) outlives the token rotation.

use chrono::{DateTime, Utc};
use kernel::id::SessionId;
use kernel::organization::OrganizationRef;
use serde::{Deserialize, Serialize};

use crate::domain::entity::account::Account;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// jti of the login this session descends from
    pub login_id: SessionId,
    pub account: Account,
    /// Organization the caller is currently acting for
    pub organization: Option<OrganizationRef>,
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Starts in the account's first organization
    pub fn new(id: SessionId, account: Account, expires_at: DateTime<Utc>) -> Self {
        let organization = account.organizations.first().cloned();
        Self {
            id,
            login_id: id,
            account,
            organization,
            currency: None,
            created_at: Utc::now(),
            expires_at,
        }
    }

    /// Same context under a new jti
    pub fn rekey(&self, id: SessionId, account: Account, expires_at: DateTime<Utc>) -> Self {
        let organization = self
            .organization
            .as_ref()
            .and_then(|o| account.organization(o.id).cloned())
            .or_else(|| account.organizations.first().cloned());
        Self {
            id,
            login_id: self.login_id,
            account,
            organization,
            currency: self.currency.clone(),
            created_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
