//! API DTOs (Data Transfer Objects)
//!
//! Mutating requests may carry a `totp` field; it is consumed by the TOTP
//! guard and ignored by the bodies below.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, OrganizationId, PermissionId, SessionId};
use kernel::organization::OrganizationRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::jwt::IssuedTokens;
use crate::domain::entity::{account::Account, permission::Permission, role::Role, session::Session};
use crate::domain::value_object::{account_status::AccountStatus, action::Action, role_type::RoleType};

// ============================================================================
// Login / Refresh
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub auth_provider_id: String,
    pub password: String,
    pub totp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub session: SessionResponse,
}

impl TokenResponse {
    pub fn new(tokens: IssuedTokens, session: Session) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
            session: session.into(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub account: AccountResponse,
    pub organization: Option<OrganizationRef>,
    pub currency: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            account: session.account.into(),
            organization: session.organization,
            currency: session.currency,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchSessionRequest {
    pub organization_id: Option<OrganizationId>,
    pub currency: Option<String>,
}

// ============================================================================
// TOTP
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TotpCodeRequest {
    pub totp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotpGenerateResponse {
    pub secret: String,
    pub url: String,
}

// ============================================================================
// Password
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordSetRequest {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub email: String,
    pub auth_provider_id: String,
    pub first_name: String,
    pub last_name: String,
    pub status: AccountStatus,
    pub totp_enabled: bool,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub organizations: Vec<OrganizationRef>,
    pub operators: Vec<OrganizationRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let permissions = account.permissions();
        Self {
            id: account.id,
            email: account.email.to_string(),
            auth_provider_id: account.auth_provider_id,
            first_name: account.first_name,
            last_name: account.last_name,
            status: account.status,
            totp_enabled: account.totp_enabled,
            roles: account.roles,
            permissions,
            organizations: account.organizations,
            operators: account.operators,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub auth_provider_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub auth_provider_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<AccountStatus>,
}

/// Body of the account link endpoints (`roles`, `organizations`, `operators`)
#[derive(Debug, Clone, Deserialize)]
pub struct LinkRequest {
    pub ids: Vec<Uuid>,
}

// ============================================================================
// Roles / Permissions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub organization_id: Option<OrganizationId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub role_type: RoleType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolePermissionsRequest {
    pub permissions: Vec<PermissionId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RolePermissionsResponse {
    pub role: Role,
    pub logout_failures: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    pub endpoint: String,
    pub action: Action,
}

/// `data` of entity deletes
#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub id: Uuid,
}
