//! PostgreSQL Repository Implementations

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, OrganizationId, PermissionId, RoleId};
use kernel::organization::{OrganizationRef, OrganizationType};
use kernel::pagination::{Direction, Page, PageRequest};
use platform::password::HashedPassword;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{account::Account, permission::Permission, role::Role};
use crate::domain::repository::{
    AccountLink, AccountRepository, PermissionRepository, RoleRepository,
};
use crate::domain::value_object::{email::Email, totp_secret::TotpSecret};
use crate::error::{AuthError, AuthResult};

const ACCOUNT_COLUMNS: &str = r#"
    id, email, auth_provider_id, password_hash, first_name, last_name, status,
    totp_enabled, totp_secret, totp_url, reset_token, reset_token_expires_at,
    created_at, updated_at
"#;

const ACCOUNT_FILTERS: &[&str] = &["email", "auth_provider_id", "first_name", "last_name", "status"];
const ACCOUNT_ORDER: &[&str] = &["created_at", "email", "auth_provider_id", "first_name", "last_name"];

const ROLE_FILTERS: &[&str] = &["organization_id", "name", "type"];
const ROLE_ORDER: &[&str] = &["name", "type"];

const PERMISSION_FILTERS: &[&str] = &["name", "subject", "endpoint", "action"];
const PERMISSION_ORDER: &[&str] = &["name", "subject", "endpoint", "action"];

/// PostgreSQL-backed account, role and permission repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_account(&self, column: &str, value: &str) -> AuthResult<Option<Account>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ACCOUNT_COLUMNS)
            .push(" FROM accounts WHERE deleted_at IS NULL AND ")
            .push(column)
            .push("::text = ")
            .push_bind(value.to_string());

        let row = qb
            .build_query_as::<AccountRow>()
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut accounts = vec![row.into_account()?];
                self.load_account_relations(&mut accounts).await?;
                Ok(accounts.pop())
            }
            None => Ok(None),
        }
    }

    /// Fill roles (with permissions), organizations and operators in three
    /// batched queries
    async fn load_account_relations(&self, accounts: &mut [Account]) -> AuthResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = accounts.iter().map(|a| a.id.into_uuid()).collect();

        let role_rows = sqlx::query_as::<_, LinkedRoleRow>(
            r#"
            SELECT ar.account_id AS owner_id, r.id, r.organization_id, r.name, r.description, r.type
            FROM account_roles ar
            JOIN roles r ON r.id = ar.role_id
            WHERE ar.account_id = ANY($1)
            ORDER BY r.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let role_ids: Vec<RoleId> = role_rows.iter().map(|r| r.role.id).collect();
        let permissions = self.permissions_by_role(&role_ids).await?;

        let mut roles: HashMap<Uuid, Vec<Role>> = HashMap::new();
        for row in role_rows {
            let mut role = row.role.into_role()?;
            role.permissions = permissions.get(&role.id).cloned().unwrap_or_default();
            roles.entry(row.owner_id).or_default().push(role);
        }

        let org_rows = sqlx::query_as::<_, LinkedOrganizationRow>(
            r#"
            SELECT ao.account_id AS owner_id, o.id, o.name, o.type, FALSE AS operator_link
            FROM account_organizations ao
            JOIN organizations o ON o.id = ao.organization_id AND o.deleted_at IS NULL
            WHERE ao.account_id = ANY($1)
            UNION ALL
            SELECT ap.account_id AS owner_id, o.id, o.name, o.type, TRUE AS operator_link
            FROM account_operators ap
            JOIN organizations o ON o.id = ap.operator_id AND o.deleted_at IS NULL
            WHERE ap.account_id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut organizations: HashMap<Uuid, Vec<OrganizationRef>> = HashMap::new();
        let mut operators: HashMap<Uuid, Vec<OrganizationRef>> = HashMap::new();
        for row in org_rows {
            let target = if row.operator_link {
                &mut operators
            } else {
                &mut organizations
            };
            target
                .entry(row.owner_id)
                .or_default()
                .push(row.into_ref()?);
        }

        for account in accounts.iter_mut() {
            let key = account.id.into_uuid();
            account.roles = roles.remove(&key).unwrap_or_default();
            account.organizations = organizations.remove(&key).unwrap_or_default();
            account.operators = operators.remove(&key).unwrap_or_default();
        }
        Ok(())
    }

    async fn permissions_by_role(
        &self,
        role_ids: &[RoleId],
    ) -> AuthResult<HashMap<RoleId, Vec<Permission>>> {
        if role_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<Uuid> = role_ids.iter().map(|id| id.into_uuid()).collect();
        let rows = sqlx::query_as::<_, LinkedPermissionRow>(
            r#"
            SELECT rp.role_id, p.id, p.name, p.description, p.subject, p.endpoint, p.action
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            ORDER BY p.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_role: HashMap<RoleId, Vec<Permission>> = HashMap::new();
        for row in rows {
            by_role
                .entry(row.role_id)
                .or_default()
                .push(row.permission.into_permission()?);
        }
        Ok(by_role)
    }

    async fn attach_roles_permissions(&self, roles: &mut [Role]) -> AuthResult<()> {
        let ids: Vec<RoleId> = roles.iter().map(|r| r.id).collect();
        let mut permissions = self.permissions_by_role(&ids).await?;
        for role in roles.iter_mut() {
            role.permissions = permissions.remove(&role.id).unwrap_or_default();
        }
        Ok(())
    }
}

/// `SELECT COUNT(*)` with the same whitelisted filters as the page query
async fn count_with_filters(
    pool: &PgPool,
    base: &str,
    request: &PageRequest,
    allowed: &[&str],
) -> AuthResult<i64> {
    let mut qb = QueryBuilder::<Postgres>::new(base);
    request.push_filters(&mut qb, allowed)?;
    Ok(qb.build_query_scalar::<i64>().fetch_one(pool).await?)
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, auth_provider_id, password_hash, first_name, last_name, status,
                totp_enabled, totp_secret, totp_url, reset_token, reset_token_expires_at,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(account.id)
        .bind(account.email.as_str())
        .bind(&account.auth_provider_id)
        .bind(account.password_hash.as_ref().map(|h| h.as_str()))
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.status.code())
        .bind(account.totp_enabled)
        .bind(account.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(&account.totp_url)
        .bind(&account.reset_token)
        .bind(account.reset_token_expires_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = matches!(
                &e,
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
            );
            if duplicate {
                AuthError::AuthProviderIdTaken
            } else {
                AuthError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                email = $2,
                auth_provider_id = $3,
                password_hash = $4,
                first_name = $5,
                last_name = $6,
                status = $7,
                totp_enabled = $8,
                totp_secret = $9,
                totp_url = $10,
                reset_token = $11,
                reset_token_expires_at = $12,
                updated_at = $13
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(account.id)
        .bind(account.email.as_str())
        .bind(&account.auth_provider_id)
        .bind(account.password_hash.as_ref().map(|h| h.as_str()))
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.status.code())
        .bind(account.totp_enabled)
        .bind(account.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(&account.totp_url)
        .bind(&account.reset_token)
        .bind(account.reset_token_expires_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>> {
        self.fetch_account("id", &id.to_string()).await
    }

    async fn find_by_auth_provider_id(
        &self,
        auth_provider_id: &str,
    ) -> AuthResult<Option<Account>> {
        self.fetch_account("auth_provider_id", auth_provider_id).await
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        self.fetch_account("email", email.as_str()).await
    }

    async fn find_by_reset_token(&self, token: &str) -> AuthResult<Option<Account>> {
        self.fetch_account("reset_token", token).await
    }

    async fn list(&self, request: &PageRequest) -> AuthResult<Page<Account>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ACCOUNT_COLUMNS)
            .push(" FROM accounts WHERE deleted_at IS NULL");
        request.push_filters(&mut qb, ACCOUNT_FILTERS)?;
        request.push_page(&mut qb, ACCOUNT_ORDER, ("created_at", Direction::Asc), "id")?;

        let rows = qb
            .build_query_as::<AccountRow>()
            .fetch_all(&self.pool)
            .await?;
        let mut accounts = rows
            .into_iter()
            .map(AccountRow::into_account)
            .collect::<AuthResult<Vec<_>>>()?;
        self.load_account_relations(&mut accounts).await?;

        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM accounts WHERE deleted_at IS NULL",
            request,
            ACCOUNT_FILTERS,
        )
        .await?;

        Ok(Page::new(accounts, total, request))
    }

    async fn soft_delete(&self, id: AccountId) -> AuthResult<bool> {
        let affected = sqlx::query(
            "UPDATE accounts SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn attach(&self, id: AccountId, link: AccountLink, targets: &[Uuid]) -> AuthResult<()> {
        let source = match link {
            AccountLink::Roles => "SELECT $1, r.id FROM roles r WHERE r.id = ANY($2)",
            AccountLink::Organizations => {
                "SELECT $1, o.id FROM organizations o WHERE o.id = ANY($2) AND o.deleted_at IS NULL"
            }
            AccountLink::Operators => {
                "SELECT $1, o.id FROM organizations o \
                 WHERE o.id = ANY($2) AND o.type = 'operator' AND o.deleted_at IS NULL"
            }
        };
        let sql = format!(
            "INSERT INTO {} (account_id, {}) {} ON CONFLICT DO NOTHING",
            link.table(),
            link.column(),
            source
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(targets)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn detach(&self, id: AccountId, link: AccountLink, targets: &[Uuid]) -> AuthResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE account_id = $1 AND {} = ANY($2)",
            link.table(),
            link.column()
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(targets)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_ids_by_role(&self, role_id: RoleId) -> AuthResult<Vec<AccountId>> {
        let ids = sqlx::query_scalar::<_, AccountId>(
            r#"
            SELECT a.id FROM account_roles ar
            JOIN accounts a ON a.id = ar.account_id AND a.deleted_at IS NULL
            WHERE ar.role_id = $1
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for PgAuthRepository {
    async fn create(&self, role: &Role) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, organization_id, name, description, type)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(role.id)
        .bind(role.organization_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.role_type.code())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, role: &Role) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE roles SET organization_id = $2, name = $3, description = $4, type = $5
            WHERE id = $1
            "#,
        )
        .bind(role.id)
        .bind(role.organization_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.role_type.code())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: RoleId) -> AuthResult<Option<Role>> {
        let mut roles = RoleRepository::find_by_ids(self, &[id]).await?;
        Ok(roles.pop())
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> AuthResult<Vec<Role>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, organization_id, name, description, type FROM roles WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut roles = rows
            .into_iter()
            .map(RoleRow::into_role)
            .collect::<AuthResult<Vec<_>>>()?;
        self.attach_roles_permissions(&mut roles).await?;
        Ok(roles)
    }

    async fn list(&self, request: &PageRequest) -> AuthResult<Page<Role>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, organization_id, name, description, type FROM roles WHERE TRUE",
        );
        request.push_filters(&mut qb, ROLE_FILTERS)?;
        request.push_page(&mut qb, ROLE_ORDER, ("name", Direction::Asc), "id")?;

        let rows = qb.build_query_as::<RoleRow>().fetch_all(&self.pool).await?;
        let mut roles = rows
            .into_iter()
            .map(RoleRow::into_role)
            .collect::<AuthResult<Vec<_>>>()?;
        self.attach_roles_permissions(&mut roles).await?;

        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM roles WHERE TRUE",
            request,
            ROLE_FILTERS,
        )
        .await?;

        Ok(Page::new(roles, total, request))
    }

    async fn delete(&self, id: RoleId) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;
        for sql in [
            "DELETE FROM account_roles WHERE role_id = $1",
            "DELETE FROM role_permissions WHERE role_id = $1",
        ] {
            sqlx::query(sql).bind(id).execute(&mut *tx).await?;
        }
        let affected = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        Ok(affected > 0)
    }

    async fn set_permissions(&self, id: RoleId, permissions: &[PermissionId]) -> AuthResult<()> {
        let ids: Vec<Uuid> = permissions.iter().map(|p| p.into_uuid()).collect();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, p.id FROM permissions p WHERE p.id = ANY($2)
            "#,
        )
        .bind(id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(())
    }

    async fn count_accounts(&self, id: RoleId) -> AuthResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM account_roles ar
            JOIN accounts a ON a.id = ar.account_id AND a.deleted_at IS NULL
            WHERE ar.role_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// ============================================================================
// Permission Repository Implementation
// ============================================================================

impl PermissionRepository for PgAuthRepository {
    async fn create(&self, permission: &Permission) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, description, subject, endpoint, action)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(permission.id)
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(&permission.subject)
        .bind(&permission.endpoint)
        .bind(permission.action.code())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, permission: &Permission) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE permissions SET name = $2, description = $3, subject = $4, endpoint = $5, action = $6
            WHERE id = $1
            "#,
        )
        .bind(permission.id)
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(&permission.subject)
        .bind(&permission.endpoint)
        .bind(permission.action.code())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: PermissionId) -> AuthResult<Option<Permission>> {
        let mut found = PermissionRepository::find_by_ids(self, &[id]).await?;
        Ok(found.pop())
    }

    async fn find_by_ids(&self, ids: &[PermissionId]) -> AuthResult<Vec<Permission>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, description, subject, endpoint, action
            FROM permissions WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PermissionRow::into_permission).collect()
    }

    async fn list(&self, request: &PageRequest) -> AuthResult<Page<Permission>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, name, description, subject, endpoint, action FROM permissions WHERE TRUE",
        );
        request.push_filters(&mut qb, PERMISSION_FILTERS)?;
        request.push_page(&mut qb, PERMISSION_ORDER, ("name", Direction::Asc), "id")?;

        let rows = qb
            .build_query_as::<PermissionRow>()
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(PermissionRow::into_permission)
            .collect::<AuthResult<Vec<_>>>()?;

        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM permissions WHERE TRUE",
            request,
            PERMISSION_FILTERS,
        )
        .await?;

        Ok(Page::new(items, total, request))
    }

    async fn delete(&self, id: PermissionId) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM role_permissions WHERE permission_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let affected = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        Ok(affected > 0)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    email: String,
    auth_provider_id: String,
    password_hash: Option<String>,
    first_name: String,
    last_name: String,
    status: String,
    totp_enabled: bool,
    totp_secret: Option<String>,
    totp_url: Option<String>,
    reset_token: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let password_hash = self
            .password_hash
            .map(HashedPassword::from_hash_string)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;
        let totp_secret = self.totp_secret.map(TotpSecret::from_base32).transpose()?;

        Ok(Account {
            id: self.id,
            email: Email::from_db(self.email),
            auth_provider_id: self.auth_provider_id,
            first_name: self.first_name,
            last_name: self.last_name,
            status: self.status.parse()?,
            totp_enabled: self.totp_enabled,
            totp_url: self.totp_url,
            password_hash,
            totp_secret,
            reset_token: self.reset_token,
            reset_token_expires_at: self.reset_token_expires_at,
            roles: Vec::new(),
            organizations: Vec::new(),
            operators: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: RoleId,
    organization_id: Option<OrganizationId>,
    name: String,
    description: String,
    #[sqlx(rename = "type")]
    role_type: String,
}

impl RoleRow {
    fn into_role(self) -> AuthResult<Role> {
        Ok(Role {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            description: self.description,
            role_type: self.role_type.parse()?,
            permissions: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct LinkedRoleRow {
    owner_id: Uuid,
    #[sqlx(flatten)]
    role: RoleRow,
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    id: PermissionId,
    name: String,
    description: String,
    subject: String,
    endpoint: String,
    action: String,
}

impl PermissionRow {
    fn into_permission(self) -> AuthResult<Permission> {
        Ok(Permission {
            id: self.id,
            name: self.name,
            description: self.description,
            subject: self.subject,
            endpoint: self.endpoint,
            action: self.action.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LinkedPermissionRow {
    role_id: RoleId,
    #[sqlx(flatten)]
    permission: PermissionRow,
}

#[derive(sqlx::FromRow)]
struct LinkedOrganizationRow {
    owner_id: Uuid,
    id: OrganizationId,
    name: String,
    #[sqlx(rename = "type")]
    organization_type: String,
    operator_link: bool,
}

impl LinkedOrganizationRow {
    fn into_ref(self) -> AuthResult<OrganizationRef> {
        Ok(OrganizationRef {
            id: self.id,
            name: self.name,
            organization_type: self.organization_type.parse::<OrganizationType>()?,
        })
    }
}
