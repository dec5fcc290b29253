//! Account Entity
//!
//! Back-office operator account. Credential, TOTP secret and reset token
//! never leave the process: they are skipped on serialization, which also
//! keeps them out of session snapshots in the key/value store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, OrganizationId};
use kernel::organization::OrganizationRef;
use platform::password::HashedPassword;
use serde::{Deserialize, Serialize};

use crate::domain::entity::{permission::Permission, role::Role};
use crate::domain::value_object::{
    account_status::AccountStatus, action::Action, email::Email, totp_secret::TotpSecret,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    /// Login name; unique across accounts
    pub auth_provider_id: String,
    pub first_name: String,
    pub last_name: String,
    pub status: AccountStatus,
    pub totp_enabled: bool,
    pub totp_url: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<HashedPassword>,
    #[serde(skip)]
    pub totp_secret: Option<TotpSecret>,
    #[serde(skip)]
    pub reset_token: Option<String>,
    #[serde(skip)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub organizations: Vec<OrganizationRef>,
    #[serde(default)]
    pub operators: Vec<OrganizationRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        email: Email,
        auth_provider_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password_hash: HashedPassword,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            email,
            auth_provider_id: auth_provider_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            status: AccountStatus::Active,
            totp_enabled: false,
            totp_url: None,
            password_hash: Some(password_hash),
            totp_secret: None,
            reset_token: None,
            reset_token_expires_at: None,
            roles: Vec::new(),
            organizations: Vec::new(),
            operators: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Union of all role permissions, first occurrence of each id wins
    pub fn permissions(&self) -> Vec<Permission> {
        let mut seen = HashSet::new();
        self.roles
            .iter()
            .flat_map(|r| r.permissions.iter())
            .filter(|p| seen.insert(p.id))
            .cloned()
            .collect()
    }

    pub fn has_root_role(&self) -> bool {
        self.roles.iter().any(Role::is_root)
    }

    /// Root holders pass everything; otherwise some permission must match
    /// the route pattern and the action derived from the method.
    pub fn is_authorized(&self, endpoint: &str, action: Action) -> bool {
        self.has_root_role()
            || self
                .roles
                .iter()
                .flat_map(|r| r.permissions.iter())
                .any(|p| p.matches(endpoint, action))
    }

    pub fn organization(&self, id: OrganizationId) -> Option<&OrganizationRef> {
        self.organizations.iter().find(|o| o.id == id)
    }

    #[inline]
    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    /// TOTP is checked only once the account finished enrolment
    pub fn active_totp_secret(&self) -> Option<&TotpSecret> {
        if self.totp_enabled {
            self.totp_secret.as_ref()
        } else {
            None
        }
    }

    pub fn clear_totp(&mut self) {
        self.totp_secret = None;
        self.totp_url = None;
        self.totp_enabled = false;
        self.updated_at = Utc::now();
    }

    pub fn set_password(&mut self, hash: HashedPassword) {
        self.password_hash = Some(hash);
        self.reset_token = None;
        self.reset_token_expires_at = None;
        self.updated_at = Utc::now();
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
