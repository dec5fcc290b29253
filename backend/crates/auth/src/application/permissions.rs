//! Permission administration

use std::sync::Arc;

use kernel::error::app_error::FieldError;
use kernel::id::PermissionId;
use kernel::pagination::{Page, PageRequest};

use crate::domain::entity::permission::Permission;
use crate::domain::repository::PermissionRepository;
use crate::domain::value_object::action::Action;
use crate::error::{AuthError, AuthResult};

pub struct PermissionInput {
    pub name: String,
    pub description: String,
    pub subject: String,
    /// Route pattern as matched by the router, e.g. `/api/game/:id`
    pub endpoint: String,
    pub action: Action,
}

impl PermissionInput {
    fn validate(&self) -> AuthResult<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        if !self.endpoint.starts_with('/') {
            errors.push(FieldError::new("endpoint", "must start with '/'"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(errors))
        }
    }
}

pub struct PermissionUseCase<P>
where
    P: PermissionRepository,
{
    permission_repo: Arc<P>,
}

impl<P> PermissionUseCase<P>
where
    P: PermissionRepository,
{
    pub fn new(permission_repo: Arc<P>) -> Self {
        Self { permission_repo }
    }

    pub async fn list(&self, request: &PageRequest) -> AuthResult<Page<Permission>> {
        self.permission_repo.list(request).await
    }

    pub async fn get(&self, id: PermissionId) -> AuthResult<Permission> {
        self.permission_repo
            .find_by_id(id)
            .await?
            .ok_or(AuthError::PermissionNotFound)
    }

    pub async fn create(&self, input: PermissionInput) -> AuthResult<Permission> {
        input.validate()?;
        let permission = Permission::new(
            input.name.trim(),
            input.description,
            input.subject,
            input.endpoint.trim(),
            input.action,
        );
        self.permission_repo.create(&permission).await?;
        tracing::info!(permission_id = %permission.id, endpoint = %permission.endpoint, "Permission created");
        Ok(permission)
    }

    pub async fn update(&self, id: PermissionId, input: PermissionInput) -> AuthResult<Permission> {
        input.validate()?;
        let mut permission = self.get(id).await?;
        permission.name = input.name.trim().to_string();
        permission.description = input.description;
        permission.subject = input.subject;
        permission.endpoint = input.endpoint.trim().to_string();
        permission.action = input.action;
        self.permission_repo.update(&permission).await?;
        Ok(permission)
    }

    pub async fn delete(&self, id: PermissionId) -> AuthResult<()> {
        if !self.permission_repo.delete(id).await? {
            return Err(AuthError::PermissionNotFound);
        }
        tracing::info!(permission_id = %id, "Permission deleted");
        Ok(())
    }
}
