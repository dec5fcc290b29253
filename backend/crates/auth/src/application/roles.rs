//! Role administration

use std::sync::Arc;

use kernel::id::{OrganizationId, PermissionId, RoleId};
use kernel::pagination::{Page, PageRequest};

use crate::application::config::AuthConfig;
use crate::application::logout::LogoutRoleUseCase;
use crate::domain::entity::{role::Role, session::Session};
use crate::domain::repository::{
    AccountRepository, PermissionRepository, RoleRepository, SessionRepository, TokenRepository,
};
use crate::domain::value_object::role_type::RoleType;
use crate::error::{AuthError, AuthResult};

pub struct RoleInput {
    pub organization_id: Option<OrganizationId>,
    pub name: String,
    pub description: String,
    pub role_type: RoleType,
}

pub struct RolePermissionsOutput {
    pub role: Role,
    /// Sessions of role holders that could not be revoked
    pub logout_failures: Vec<String>,
}

pub struct RoleUseCase<R, P, A, S>
where
    R: RoleRepository,
    P: PermissionRepository,
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    role_repo: Arc<R>,
    permission_repo: Arc<P>,
    logout: LogoutRoleUseCase<A, S>,
}

impl<R, P, A, S> RoleUseCase<R, P, A, S>
where
    R: RoleRepository,
    P: PermissionRepository,
    A: AccountRepository,
    S: SessionRepository + TokenRepository,
{
    pub fn new(
        role_repo: Arc<R>,
        permission_repo: Arc<P>,
        account_repo: Arc<A>,
        store: Arc<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            role_repo,
            permission_repo,
            logout: LogoutRoleUseCase::new(account_repo, store, config),
        }
    }

    pub async fn list(&self, request: &PageRequest) -> AuthResult<Page<Role>> {
        self.role_repo.list(request).await
    }

    pub async fn get(&self, id: RoleId) -> AuthResult<Role> {
        self.role_repo
            .find_by_id(id)
            .await?
            .ok_or(AuthError::RoleNotFound)
    }

    pub async fn create(&self, caller: &Session, input: RoleInput) -> AuthResult<Role> {
        let name = validate_name(&input.name)?;
        guard_role_type(caller, input.role_type, &name)?;

        let role = Role::new(input.organization_id, name, input.description, input.role_type);
        self.role_repo.create(&role).await?;

        tracing::info!(role_id = %role.id, role_type = %role.role_type, "Role created");
        Ok(role)
    }

    pub async fn update(&self, caller: &Session, id: RoleId, input: RoleInput) -> AuthResult<Role> {
        let mut role = self.get(id).await?;
        guard_role_type(caller, role.role_type, &role.name)?;
        let name = validate_name(&input.name)?;
        guard_role_type(caller, input.role_type, &name)?;

        role.organization_id = input.organization_id;
        role.name = name;
        role.description = input.description;
        role.role_type = input.role_type;
        self.role_repo.update(&role).await?;

        tracing::info!(role_id = %id, "Role updated");
        Ok(role)
    }

    pub async fn delete(&self, id: RoleId) -> AuthResult<()> {
        let role = self.get(id).await?;
        if role.is_root() {
            return Err(AuthError::ProtectedRole(role.name));
        }
        let holders = self.role_repo.count_accounts(id).await?;
        if holders > 0 {
            return Err(AuthError::RoleInUse(holders));
        }
        if !self.role_repo.delete(id).await? {
            return Err(AuthError::RoleNotFound);
        }

        tracing::info!(role_id = %id, "Role deleted");
        Ok(())
    }

    /// Replace the permission set and log every holder out so the next
    /// login picks up the new grants
    pub async fn set_permissions(
        &self,
        caller: &Session,
        id: RoleId,
        permission_ids: Vec<PermissionId>,
    ) -> AuthResult<RolePermissionsOutput> {
        let role = self.get(id).await?;
        guard_role_type(caller, role.role_type, &role.name)?;

        let mut ids = permission_ids;
        ids.sort();
        ids.dedup();
        let found = self.permission_repo.find_by_ids(&ids).await?;
        if found.len() != ids.len() {
            return Err(AuthError::PermissionNotFound);
        }

        self.role_repo.set_permissions(id, &ids).await?;
        let logout_failures = self.logout.execute(id).await?;

        tracing::info!(role_id = %id, permissions = ids.len(), "Role permissions replaced");
        Ok(RolePermissionsOutput {
            role: self.get(id).await?,
            logout_failures,
        })
    }
}

fn validate_name(name: &str) -> AuthResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::validation("name", "must not be empty"));
    }
    Ok(name.to_string())
}

/// Root roles are immutable through the API; admin roles need a root caller
fn guard_role_type(caller: &Session, role_type: RoleType, name: &str) -> AuthResult<()> {
    match role_type {
        RoleType::Root => Err(AuthError::ProtectedRole(name.to_string())),
        RoleType::Admin if !caller.account.has_root_role() => {
            Err(AuthError::ProtectedRole(name.to_string()))
        }
        _ => Ok(()),
    }
}
