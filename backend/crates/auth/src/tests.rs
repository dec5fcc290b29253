//! Use-case and router tests over in-memory stores

#[cfg(test)]
mod support {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use kernel::id::{AccountId, PermissionId, RoleId};
    use kernel::pagination::{Page, PageRequest, paginate_slice};
    use platform::kv::KvStore;
    use platform::password::ClearTextPassword;
    use uuid::Uuid;

    use crate::application::AuthConfig;
    use crate::domain::entity::{account::Account, permission::Permission, role::Role};
    use crate::domain::repository::{
        AccountLink, AccountRepository, PermissionRepository, RoleRepository,
    };
    use crate::domain::value_object::{action::Action, email::Email, role_type::RoleType};
    use crate::error::AuthResult;
    use crate::infra::KvSessionStore;

    pub const PASSWORD: &str = "correct-horse-battery";

    #[derive(Default)]
    struct Tables {
        accounts: HashMap<AccountId, Account>,
        roles: HashMap<RoleId, Role>,
        permissions: HashMap<PermissionId, Permission>,
        account_roles: HashMap<AccountId, Vec<RoleId>>,
    }

    /// Accounts, roles and permissions kept in process
    #[derive(Clone, Default)]
    pub struct MemoryRepo {
        tables: Arc<Mutex<Tables>>,
    }

    impl MemoryRepo {
        fn load(tables: &Tables, id: AccountId) -> Option<Account> {
            let mut account = tables.accounts.get(&id)?.clone();
            account.roles = tables
                .account_roles
                .get(&id)
                .into_iter()
                .flatten()
                .filter_map(|role_id| tables.roles.get(role_id).cloned())
                .collect();
            Some(account)
        }

        fn find(&self, pred: impl Fn(&Account) -> bool) -> Option<Account> {
            let tables = self.tables.lock().unwrap();
            let id = tables.accounts.values().find(|a| pred(a))?.id;
            Self::load(&tables, id)
        }

        pub fn insert_role(&self, role: Role) -> Role {
            self.tables
                .lock()
                .unwrap()
                .roles
                .insert(role.id, role.clone());
            role
        }

        pub fn insert_permission(&self, permission: Permission) -> Permission {
            self.tables
                .lock()
                .unwrap()
                .permissions
                .insert(permission.id, permission.clone());
            permission
        }

        pub fn grant(&self, account_id: AccountId, role_id: RoleId) {
            self.tables
                .lock()
                .unwrap()
                .account_roles
                .entry(account_id)
                .or_default()
                .push(role_id);
        }
    }

    impl AccountRepository for MemoryRepo {
        async fn create(&self, account: &Account) -> AuthResult<()> {
            self.tables
                .lock()
                .unwrap()
                .accounts
                .insert(account.id, account.clone());
            Ok(())
        }

        async fn update(&self, account: &Account) -> AuthResult<()> {
            let mut tables = self.tables.lock().unwrap();
            if let Some(stored) = tables.accounts.get_mut(&account.id) {
                *stored = account.clone();
            }
            Ok(())
        }

        async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>> {
            Ok(Self::load(&self.tables.lock().unwrap(), id))
        }

        async fn find_by_auth_provider_id(
            &self,
            auth_provider_id: &str,
        ) -> AuthResult<Option<Account>> {
            Ok(self.find(|a| a.auth_provider_id == auth_provider_id))
        }

        async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
            Ok(self.find(|a| a.email == *email))
        }

        async fn find_by_reset_token(&self, token: &str) -> AuthResult<Option<Account>> {
            Ok(self.find(|a| a.reset_token.as_deref() == Some(token)))
        }

        async fn list(&self, request: &PageRequest) -> AuthResult<Page<Account>> {
            let tables = self.tables.lock().unwrap();
            let all: Vec<Account> = tables
                .accounts
                .keys()
                .filter_map(|id| Self::load(&tables, *id))
                .collect();
            Ok(paginate_slice(&all, request))
        }

        async fn soft_delete(&self, id: AccountId) -> AuthResult<bool> {
            Ok(self.tables.lock().unwrap().accounts.remove(&id).is_some())
        }

        async fn attach(&self, id: AccountId, link: AccountLink, targets: &[Uuid]) -> AuthResult<()> {
            if link == AccountLink::Roles {
                let mut tables = self.tables.lock().unwrap();
                let linked = tables.account_roles.entry(id).or_default();
                for target in targets {
                    let role_id = RoleId::from_uuid(*target);
                    if !linked.contains(&role_id) {
                        linked.push(role_id);
                    }
                }
            }
            Ok(())
        }

        async fn detach(&self, id: AccountId, link: AccountLink, targets: &[Uuid]) -> AuthResult<()> {
            if link == AccountLink::Roles {
                let mut tables = self.tables.lock().unwrap();
                if let Some(linked) = tables.account_roles.get_mut(&id) {
                    linked.retain(|r| !targets.contains(r.as_uuid()));
                }
            }
            Ok(())
        }

        async fn find_ids_by_role(&self, role_id: RoleId) -> AuthResult<Vec<AccountId>> {
            Ok(self
                .tables
                .lock()
                .unwrap()
                .account_roles
                .iter()
                .filter(|(_, roles)| roles.contains(&role_id))
                .map(|(id, _)| *id)
                .collect())
        }
    }

    impl RoleRepository for MemoryRepo {
        async fn create(&self, role: &Role) -> AuthResult<()> {
            self.insert_role(role.clone());
            Ok(())
        }

        async fn update(&self, role: &Role) -> AuthResult<()> {
            self.insert_role(role.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: RoleId) -> AuthResult<Option<Role>> {
            Ok(self.tables.lock().unwrap().roles.get(&id).cloned())
        }

        async fn find_by_ids(&self, ids: &[RoleId]) -> AuthResult<Vec<Role>> {
            let tables = self.tables.lock().unwrap();
            Ok(ids.iter().filter_map(|id| tables.roles.get(id).cloned()).collect())
        }

        async fn list(&self, request: &PageRequest) -> AuthResult<Page<Role>> {
            let all: Vec<Role> = self.tables.lock().unwrap().roles.values().cloned().collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete(&self, id: RoleId) -> AuthResult<bool> {
            Ok(self.tables.lock().unwrap().roles.remove(&id).is_some())
        }

        async fn set_permissions(&self, id: RoleId, permissions: &[PermissionId]) -> AuthResult<()> {
            let mut tables = self.tables.lock().unwrap();
            let granted: Vec<Permission> = permissions
                .iter()
                .filter_map(|p| tables.permissions.get(p).cloned())
                .collect();
            if let Some(role) = tables.roles.get_mut(&id) {
                role.permissions = granted;
            }
            Ok(())
        }

        async fn count_accounts(&self, id: RoleId) -> AuthResult<i64> {
            Ok(self
                .tables
                .lock()
                .unwrap()
                .account_roles
                .values()
                .filter(|roles| roles.contains(&id))
                .count() as i64)
        }
    }

    impl PermissionRepository for MemoryRepo {
        async fn create(&self, permission: &Permission) -> AuthResult<()> {
            self.insert_permission(permission.clone());
            Ok(())
        }

        async fn update(&self, permission: &Permission) -> AuthResult<()> {
            self.insert_permission(permission.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: PermissionId) -> AuthResult<Option<Permission>> {
            Ok(self.tables.lock().unwrap().permissions.get(&id).cloned())
        }

        async fn find_by_ids(&self, ids: &[PermissionId]) -> AuthResult<Vec<Permission>> {
            let tables = self.tables.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| tables.permissions.get(id).cloned())
                .collect())
        }

        async fn list(&self, request: &PageRequest) -> AuthResult<Page<Permission>> {
            let all: Vec<Permission> = self
                .tables
                .lock()
                .unwrap()
                .permissions
                .values()
                .cloned()
                .collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete(&self, id: PermissionId) -> AuthResult<bool> {
            Ok(self.tables.lock().unwrap().permissions.remove(&id).is_some())
        }
    }

    pub struct Fixture {
        pub repo: Arc<MemoryRepo>,
        pub store: Arc<KvSessionStore>,
        pub config: Arc<AuthConfig>,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                repo: Arc::new(MemoryRepo::default()),
                store: Arc::new(KvSessionStore::new(KvStore::memory())),
                config: Arc::new(AuthConfig::development()),
            }
        }

        pub async fn account(&self, login: &str) -> Account {
            let hash = ClearTextPassword::new(PASSWORD.to_string())
                .unwrap()
                .hash_with_cost(self.config.bcrypt_cost)
                .unwrap();
            let email = Email::new(&format!("{}@casino.example", login)).unwrap();
            let account = Account::new(email, login, "Test", "Account", hash);
            AccountRepository::create(self.repo.as_ref(), &account)
                .await
                .unwrap();
            account
        }

        /// Role of `role_type` granting `perms`, assigned to `account_id`
        pub fn role_with(
            &self,
            account_id: AccountId,
            role_type: RoleType,
            perms: &[(&str, Action)],
        ) -> Role {
            let mut role = Role::new(None, format!("{:?}", role_type), "", role_type);
            role.permissions = perms
                .iter()
                .map(|(endpoint, action)| {
                    self.repo
                        .insert_permission(Permission::new("p", "", "test", *endpoint, *action))
                })
                .collect();
            let role = self.repo.insert_role(role);
            self.repo.grant(account_id, role.id);
            role
        }
    }
}

#[cfg(test)]
mod use_case_tests {
    use std::sync::Arc;

    use kernel::id::AccountId;

    use super::support::{Fixture, PASSWORD};
    use crate::application::{
        AccountAdminUseCase, JwtManager, LoginInput, LoginUseCase, RefreshUseCase, TotpUseCase,
    };
    use crate::domain::entity::{permission::Permission, role::Role};
    use crate::domain::repository::{AccountRepository, SessionRepository};
    use crate::domain::value_object::{action::Action, role_type::RoleType};
    use crate::error::AuthError;

    fn login_input(login: &str, totp: Option<String>) -> LoginInput {
        LoginInput {
            auth_provider_id: login.to_string(),
            password: PASSWORD.to_string(),
            totp,
        }
    }

    fn login_use_case(fx: &Fixture) -> LoginUseCase<super::support::MemoryRepo, crate::infra::KvSessionStore> {
        LoginUseCase::new(
            fx.repo.clone(),
            fx.store.clone(),
            Arc::new(JwtManager::from_config(&fx.config)),
            fx.config.clone(),
        )
    }

    #[tokio::test]
    async fn test_login_opens_session_with_granted_endpoints() {
        let fx = Fixture::new();
        let account = fx.account("alice").await;
        fx.role_with(account.id, RoleType::Admin, &[("/api/accounts", Action::View)]);

        let output = login_use_case(&fx)
            .execute(login_input("alice", None))
            .await
            .unwrap();

        let session = fx.store.find_session(output.session.id).await.unwrap().unwrap();
        assert_eq!(session.account.id, account.id);
        assert!(session.account.is_authorized("/api/accounts", Action::View));
        assert!(!session.account.is_authorized("/api/accounts", Action::Delete));
        assert!(!session.account.is_authorized("/api/roles", Action::View));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let fx = Fixture::new();
        fx.account("bob").await;

        let err = login_use_case(&fx)
            .execute(crate::application::LoginInput {
                auth_provider_id: "bob".into(),
                password: "not-the-password".into(),
                totp: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_token_is_consumed_once() {
        let fx = Fixture::new();
        fx.account("carol").await;
        let login = login_use_case(&fx)
            .execute(login_input("carol", None))
            .await
            .unwrap();

        let refresh = RefreshUseCase::new(
            fx.repo.clone(),
            fx.store.clone(),
            Arc::new(JwtManager::from_config(&fx.config)),
            fx.config.clone(),
        );
        let rotated = refresh.execute(&login.tokens.refresh_token).await.unwrap();
        assert_ne!(rotated.tokens.refresh_token, login.tokens.refresh_token);
        assert!(fx.store.find_session(login.session.id).await.unwrap().is_none());

        // New jti, same login scope
        let stored = fx.store.find_session(rotated.session.id).await.unwrap().unwrap();
        assert_ne!(stored.id, login.session.id);
        assert_eq!(stored.login_id, login.session.id);

        let err = refresh
            .execute(&login.tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenNotFound));
    }

    #[tokio::test]
    async fn test_enrolled_account_needs_totp_to_login() {
        let fx = Fixture::new();
        let account = fx.account("dave").await;
        let totp = TotpUseCase::new(fx.repo.clone(), fx.store.clone(), fx.config.clone());
        totp.generate(account.id).await.unwrap();

        let stored = AccountRepository::find_by_id(fx.repo.as_ref(), account.id)
            .await
            .unwrap()
            .unwrap();
        let secret = stored.totp_secret.clone().unwrap();
        let code = secret.current_code("dave", &fx.config.totp).unwrap();
        totp.enable(account.id, &code).await.unwrap();

        let err = login_use_case(&fx)
            .execute(login_input("dave", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TotpRequired));

        let code = secret.current_code("dave", &fx.config.totp).unwrap();
        assert!(
            login_use_case(&fx)
                .execute(login_input("dave", Some(code)))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_totp_disable_rewrites_live_sessions() {
        let fx = Fixture::new();
        let account = fx.account("erin").await;
        let totp = TotpUseCase::new(fx.repo.clone(), fx.store.clone(), fx.config.clone());
        totp.generate(account.id).await.unwrap();
        let secret = AccountRepository::find_by_id(fx.repo.as_ref(), account.id)
            .await
            .unwrap()
            .unwrap()
            .totp_secret
            .unwrap();
        totp.enable(account.id, &secret.current_code("erin", &fx.config.totp).unwrap())
            .await
            .unwrap();

        let code = secret.current_code("erin", &fx.config.totp).unwrap();
        let login = login_use_case(&fx)
            .execute(login_input("erin", Some(code)))
            .await
            .unwrap();
        assert!(login.session.account.totp_enabled);

        totp.disable(account.id).await.unwrap();

        let session = fx.store.find_session(login.session.id).await.unwrap().unwrap();
        assert!(!session.account.totp_enabled);
        assert!(session.account.totp_secret.is_none());
    }

    #[tokio::test]
    async fn test_root_account_cannot_be_deleted() {
        let fx = Fixture::new();
        let root = fx.account("root").await;
        fx.role_with(root.id, RoleType::Root, &[]);
        let plain = fx.account("plain").await;

        let login = login_use_case(&fx)
            .execute(login_input("root", None))
            .await
            .unwrap();
        let admin = AccountAdminUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.store.clone(),
            fx.config.clone(),
        );

        let err = admin.delete(&login.session, root.id).await.unwrap_err();
        assert!(matches!(err, AuthError::RootAccountRemoval));

        admin.delete(&login.session, plain.id).await.unwrap();
        assert!(matches!(
            admin.get(plain.id).await.unwrap_err(),
            AuthError::AccountNotFound
        ));
        assert!(matches!(
            admin.delete(&login.session, AccountId::new()).await.unwrap_err(),
            AuthError::AccountNotFound
        ));
    }

    #[tokio::test]
    async fn test_root_role_cannot_be_assigned() {
        let fx = Fixture::new();
        let root = fx.account("root").await;
        let root_role = fx.role_with(root.id, RoleType::Root, &[]);
        let target = fx.account("target").await;

        let login = login_use_case(&fx)
            .execute(login_input("root", None))
            .await
            .unwrap();
        let admin = AccountAdminUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.store.clone(),
            fx.config.clone(),
        );

        let err = admin
            .attach(
                &login.session,
                target.id,
                crate::domain::repository::AccountLink::Roles,
                vec![*root_role.id.as_uuid()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ProtectedRole(_)));
    }

    #[test]
    fn test_permissions_are_deduplicated_across_roles() {
        let shared = Permission::new("list", "", "accounts", "/api/accounts", Action::View);
        let mut first = Role::new(None, "first", "", RoleType::Default);
        first.permissions = vec![shared.clone()];
        let mut second = Role::new(None, "second", "", RoleType::Default);
        second.permissions = vec![
            shared.clone(),
            Permission::new("edit", "", "accounts", "/api/accounts/:id", Action::Edit),
        ];

        let mut account = crate::domain::entity::account::Account::new(
            "x@casino.example".parse().unwrap(),
            "x",
            "",
            "",
            platform::password::HashedPassword::from_hash_string(
                "$2b$04$abcdefghijklmnopqrstuuNS5O8ij5N4Y9W0K2g.RG1LMM9PXvYC.",
            )
            .unwrap(),
        );
        account.roles = vec![first, second];

        let permissions = account.permissions();
        assert_eq!(permissions.len(), 2);
        assert_eq!(permissions[0].id, shared.id);
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::support::{Fixture, PASSWORD};
    use crate::application::TotpUseCase;
    use crate::domain::repository::AccountRepository;
    use crate::domain::value_object::{action::Action, role_type::RoleType};
    use crate::presentation::handlers::AuthAppState;
    use crate::presentation::middleware::AUTH_HEADER;
    use crate::presentation::router::auth_router;

    fn state(fx: &Fixture) -> AuthAppState<super::support::MemoryRepo, crate::infra::KvSessionStore> {
        AuthAppState {
            repo: fx.repo.clone(),
            store: fx.store.clone(),
            jwt: Arc::new(crate::application::JwtManager::from_config(&fx.config)),
            mailer: Arc::new(gateway::LogMailer),
            config: fx.config.clone(),
        }
    }

    async fn login(app: &axum::Router, login: &str) -> String {
        let body = serde_json::json!({ "auth_provider_id": login, "password": PASSWORD });
        let resp = app
            .clone()
            .oneshot(
                Request::post("/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["data"]["access_token"].as_str().unwrap().to_string()
    }

    async fn get(app: &axum::Router, uri: &str, token: Option<&str>) -> StatusCode {
        let mut req = Request::get(uri);
        if let Some(token) = token {
            req = req.header(AUTH_HEADER, token);
        }
        app.clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_endpoint_permission_gate() {
        let fx = Fixture::new();
        let viewer = fx.account("viewer").await;
        fx.role_with(viewer.id, RoleType::Admin, &[("/api/accounts", Action::View)]);
        let app = auth_router(state(&fx));

        assert_eq!(get(&app, "/accounts", None).await, StatusCode::UNAUTHORIZED);

        let token = login(&app, "viewer").await;
        assert_eq!(get(&app, "/accounts", Some(&token)).await, StatusCode::OK);
        assert_eq!(get(&app, "/roles", Some(&token)).await, StatusCode::UNAUTHORIZED);
        assert_eq!(get(&app, "/auth/session", Some(&token)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_kills_the_session() {
        let fx = Fixture::new();
        fx.account("leaver").await;
        let app = auth_router(state(&fx));
        let token = login(&app, "leaver").await;

        let resp = app
            .clone()
            .oneshot(
                Request::post("/auth/logout")
                    .header(AUTH_HEADER, &token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            get(&app, "/auth/session", Some(&token)).await,
            StatusCode::UNAUTHORIZED
        );
    }

    async fn post_json(
        app: &axum::Router,
        uri: &str,
        token: &str,
        body: serde_json::Value,
    ) -> StatusCode {
        app.clone()
            .oneshot(
                Request::post(uri)
                    .header(AUTH_HEADER, token)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_password_change_needs_totp_once_enrolled() {
        let fx = Fixture::new();
        let account = fx.account("frank").await;
        let app = auth_router(state(&fx));
        let token = login(&app, "frank").await;

        let totp = TotpUseCase::new(fx.repo.clone(), fx.store.clone(), fx.config.clone());
        totp.generate(account.id).await.unwrap();
        let secret = AccountRepository::find_by_id(fx.repo.as_ref(), account.id)
            .await
            .unwrap()
            .unwrap()
            .totp_secret
            .unwrap();
        totp.enable(account.id, &secret.current_code("frank", &fx.config.totp).unwrap())
            .await
            .unwrap();

        let change = serde_json::json!({
            "old_password": PASSWORD,
            "new_password": "staple-battery-horse",
        });
        assert_eq!(
            post_json(&app, "/auth/password/change", &token, change.clone()).await,
            StatusCode::UNAUTHORIZED
        );

        let mut confirmed = change;
        confirmed["totp"] = secret.current_code("frank", &fx.config.totp).unwrap().into();
        assert_eq!(
            post_json(&app, "/auth/password/change", &token, confirmed).await,
            StatusCode::OK
        );
    }
}
