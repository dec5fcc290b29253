//! Repository Traits
//!
//! Interfaces for data persistence. Relational implementations live in
//! `infra::postgres`, the session/token store in `infra::kv`.

use std::time::Duration;

use kernel::id::{AccountId, PermissionId, RoleId, SessionId};
use kernel::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::domain::entity::{
    account::Account, permission::Permission, role::Role, session::Session, token::Token,
};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Link tables hanging off an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountLink {
    Roles,
    Organizations,
    /// Organizations of type `operator` only
    Operators,
}

impl AccountLink {
    pub const fn table(&self) -> &'static str {
        match self {
            AccountLink::Roles => "account_roles",
            AccountLink::Organizations => "account_organizations",
            AccountLink::Operators => "account_operators",
        }
    }

    pub const fn column(&self) -> &'static str {
        match self {
            AccountLink::Roles => "role_id",
            AccountLink::Organizations => "organization_id",
            AccountLink::Operators => "operator_id",
        }
    }
}

/// Account repository trait
///
/// Every `find_*` loads roles (with permissions), organizations and
/// operators. Soft-deleted accounts are invisible.
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Scalar columns only; links go through `attach`/`detach`
    async fn update(&self, account: &Account) -> AuthResult<()>;

    async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>>;

    async fn find_by_auth_provider_id(&self, auth_provider_id: &str)
    -> AuthResult<Option<Account>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    async fn find_by_reset_token(&self, token: &str) -> AuthResult<Option<Account>>;

    async fn list(&self, request: &PageRequest) -> AuthResult<Page<Account>>;

    /// `false` if the account did not exist
    async fn soft_delete(&self, id: AccountId) -> AuthResult<bool>;

    async fn attach(&self, id: AccountId, link: AccountLink, targets: &[Uuid]) -> AuthResult<()>;

    async fn detach(&self, id: AccountId, link: AccountLink, targets: &[Uuid]) -> AuthResult<()>;

    async fn find_ids_by_role(&self, role_id: RoleId) -> AuthResult<Vec<AccountId>>;
}

/// Role repository trait
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    async fn create(&self, role: &Role) -> AuthResult<()>;

    async fn update(&self, role: &Role) -> AuthResult<()>;

    async fn find_by_id(&self, id: RoleId) -> AuthResult<Option<Role>>;

    async fn find_by_ids(&self, ids: &[RoleId]) -> AuthResult<Vec<Role>>;

    async fn list(&self, request: &PageRequest) -> AuthResult<Page<Role>>;

    async fn delete(&self, id: RoleId) -> AuthResult<bool>;

    /// Replace the role's permission set
    async fn set_permissions(&self, id: RoleId, permissions: &[PermissionId]) -> AuthResult<()>;

    async fn count_accounts(&self, id: RoleId) -> AuthResult<i64>;
}

/// Permission repository trait
#[trait_variant::make(PermissionRepository: Send)]
pub trait LocalPermissionRepository {
    async fn create(&self, permission: &Permission) -> AuthResult<()>;

    async fn update(&self, permission: &Permission) -> AuthResult<()>;

    async fn find_by_id(&self, id: PermissionId) -> AuthResult<Option<Permission>>;

    async fn find_by_ids(&self, ids: &[PermissionId]) -> AuthResult<Vec<Permission>>;

    async fn list(&self, request: &PageRequest) -> AuthResult<Page<Permission>>;

    async fn delete(&self, id: PermissionId) -> AuthResult<bool>;
}

/// Session store trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn create_session(&self, session: &Session, ttl: Duration) -> AuthResult<()>;

    async fn find_session(&self, id: SessionId) -> AuthResult<Option<Session>>;

    /// Keeps the remaining TTL; `false` if the session already expired
    async fn update_session(&self, session: &Session) -> AuthResult<bool>;

    async fn delete_session(&self, id: SessionId, account_id: AccountId) -> AuthResult<bool>;

    async fn sessions_for_account(&self, account_id: AccountId) -> AuthResult<Vec<Session>>;
}

/// Token store trait
#[trait_variant::make(TokenRepository: Send)]
pub trait LocalTokenRepository {
    async fn create_token(&self, token: &Token, ttl: Duration) -> AuthResult<()>;

    async fn find_by_refresh(&self, refresh_token: &str) -> AuthResult<Option<Token>>;

    async fn find_by_access(&self, access_token: &str) -> AuthResult<Option<Token>>;

    async fn delete_token(&self, token: &Token) -> AuthResult<bool>;

    async fn tokens_for_account(&self, account_id: AccountId) -> AuthResult<Vec<Token>>;
}
