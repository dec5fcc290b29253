//! Report, export and router tests over in-memory fakes

#[cfg(test)]
mod support {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use auth::domain::entity::account::Account;
    use auth::domain::entity::role::Role;
    use auth::domain::entity::session::Session;
    use auth::domain::value_object::role_type::RoleType;
    use chrono::{TimeZone, Utc};
    use gateway::history::{
        AggregatedRecord, FinancialRecord, GamingSessionRecord, Listing, SpinRecord,
    };
    use gateway::{GatewayError, GatewayResult, HistoryClient, HistoryFilter};
    use kernel::id::{FileId, OrganizationId, SessionId};
    use kernel::organization::{OrganizationRef, OrganizationType};
    use platform::password::HashedPassword;
    use tokio::sync::Semaphore;

    use crate::domain::file::{ExportFile, FileStatus};
    use crate::domain::repository::{FileRepository, GameDirectory};
    use crate::error::ReportResult;

    pub fn spin(round_id: &str, game: &str, wager: i64, award: i64) -> SpinRecord {
        SpinRecord {
            round_id: round_id.into(),
            session_token: "sess-1".into(),
            game_id: format!("{}-id", game),
            game: game.into(),
            integrator: "acme".into(),
            operator: "casino".into(),
            external_user_id: "player-1".into(),
            host: "casino.example".into(),
            currency: "eur".into(),
            wager,
            award,
            is_demo: false,
            is_pfr: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    pub fn bucket(game_id: &str, round_count: i64, wager: i64, award: i64) -> AggregatedRecord {
        AggregatedRecord {
            game_id: game_id.into(),
            game: format!("Game {}", game_id),
            currency: "USD".into(),
            user_count: 4,
            round_count,
            wager,
            award,
            ..AggregatedRecord::default()
        }
    }

    /// History service double; every listing call waits on `gate`
    pub struct FakeHistory {
        pub gate: Arc<Semaphore>,
        pub fail: bool,
        pub calls: Mutex<Vec<HistoryFilter>>,
    }

    impl FakeHistory {
        pub fn open() -> Self {
            Self::gated(Semaphore::MAX_PERMITS)
        }

        pub fn gated(permits: usize) -> Self {
            Self {
                gate: Arc::new(Semaphore::new(permits)),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::open()
            }
        }

        async fn enter(&self, filter: &HistoryFilter) -> GatewayResult<()> {
            self.calls.lock().unwrap().push(filter.clone());
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| GatewayError::malformed("history", e.to_string()))?;
            if self.fail {
                return Err(GatewayError::malformed("history", "storage offline"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl HistoryClient for FakeHistory {
        async fn spins(&self, filter: &HistoryFilter) -> GatewayResult<Listing<SpinRecord>> {
            self.enter(filter).await?;
            let items = vec![
                spin("r-1", "Book", 1_500, 0),
                spin("r-2", "Fruit", 2_000, 4_000),
                spin("r-3", "Book", 500, 250),
            ];
            Ok(Listing { total: 3, items })
        }

        async fn spin(
            &self,
            round_id: &str,
            game: &str,
            _currency: &str,
        ) -> GatewayResult<Option<SpinRecord>> {
            Ok((round_id == "r-1" && game == "Book").then(|| spin("r-1", "Book", 1_500, 0)))
        }

        async fn gaming_sessions(
            &self,
            filter: &HistoryFilter,
        ) -> GatewayResult<Listing<GamingSessionRecord>> {
            self.enter(filter).await?;
            Ok(Listing {
                items: Vec::new(),
                total: 0,
            })
        }

        async fn gaming_session(
            &self,
            _session_token: &str,
            _game: &str,
            _currency: &str,
        ) -> GatewayResult<Option<GamingSessionRecord>> {
            Ok(None)
        }

        async fn aggregated_by_game(
            &self,
            filter: &HistoryFilter,
        ) -> GatewayResult<Vec<AggregatedRecord>> {
            self.enter(filter).await?;
            Ok(if filter.is_pfr {
                vec![bucket("g", 20, 300, 285)]
            } else {
                vec![bucket("g", 100, 1_000, 950)]
            })
        }

        async fn aggregated_by_country(
            &self,
            filter: &HistoryFilter,
        ) -> GatewayResult<Vec<AggregatedRecord>> {
            self.enter(filter).await?;
            Ok(Vec::new())
        }

        async fn financial(&self, filter: &HistoryFilter) -> GatewayResult<FinancialRecord> {
            self.enter(filter).await?;
            Ok(FinancialRecord {
                currency: filter.convert_currency.clone(),
                user_count: 2,
                round_count: 3,
                wager: 4_000,
                award: 4_250,
            })
        }
    }

    /// Export records in process; `drop_all` simulates expiry
    #[derive(Default)]
    pub struct MemoryFiles {
        files: Mutex<HashMap<(SessionId, FileId), ExportFile>>,
    }

    impl MemoryFiles {
        pub fn drop_all(&self) {
            self.files.lock().unwrap().clear();
        }

        pub fn status(&self, session: SessionId, id: FileId) -> Option<FileStatus> {
            self.files
                .lock()
                .unwrap()
                .get(&(session, id))
                .map(|f| f.status)
        }
    }

    impl FileRepository for MemoryFiles {
        async fn insert_file(
            &self,
            session: SessionId,
            file: &ExportFile,
            _ttl: Duration,
        ) -> ReportResult<()> {
            self.files
                .lock()
                .unwrap()
                .insert((session, file.id), file.clone());
            Ok(())
        }

        async fn update_file(&self, session: SessionId, file: &ExportFile) -> ReportResult<bool> {
            let mut files = self.files.lock().unwrap();
            match files.get_mut(&(session, file.id)) {
                Some(stored) => {
                    *stored = file.clone();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn find_file(
            &self,
            session: SessionId,
            id: FileId,
        ) -> ReportResult<Option<ExportFile>> {
            Ok(self.files.lock().unwrap().get(&(session, id)).cloned())
        }

        async fn list_files(&self, session: SessionId) -> ReportResult<Vec<ExportFile>> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .filter(|((s, _), _)| *s == session)
                .map(|(_, f)| f.clone())
                .collect())
        }
    }

    #[derive(Default)]
    pub struct StaticGames {
        pub games: HashMap<OrganizationId, Vec<String>>,
    }

    impl GameDirectory for StaticGames {
        async fn provider_games(&self, provider: OrganizationId) -> ReportResult<Vec<String>> {
            Ok(self.games.get(&provider).cloned().unwrap_or_default())
        }
    }

    pub fn session(organization: Option<OrganizationRef>, root: bool) -> Session {
        let mut account = Account::new(
            "reporter@casino.example".parse().unwrap(),
            "reporter",
            "Report",
            "Reader",
            HashedPassword::from_hash_string(
                "$2b$04$abcdefghijklmnopqrstuuNS5O8ij5N4Y9W0K2g.RG1LMM9PXvYC.",
            )
            .unwrap(),
        );
        if root {
            account.roles = vec![Role::new(None, "root", "", RoleType::Root)];
        }
        account.organizations = organization.clone().into_iter().collect();
        let expires_at = Utc::now() + chrono::Duration::hours(1);
        let mut session = Session::new(SessionId::new(), account, expires_at);
        session.organization = organization;
        session
    }

    pub fn organization(organization_type: OrganizationType) -> OrganizationRef {
        OrganizationRef {
            id: OrganizationId::new(),
            name: "acme".into(),
            organization_type,
        }
    }
}

#[cfg(test)]
mod report_tests {
    use std::sync::Arc;

    use kernel::organization::OrganizationType;

    use super::support::{FakeHistory, StaticGames, organization, session};
    use crate::application::{ReportService, resolve_scope};
    use crate::domain::filter::{ReportQuery, ReportScope};
    use crate::domain::report::Grouping;
    use crate::error::ReportError;

    fn query() -> ReportQuery {
        ReportQuery {
            currency: Some("USD".into()),
            ..ReportQuery::default()
        }
    }

    #[tokio::test]
    async fn test_aggregated_by_game_merges_pfr_call() {
        let history = Arc::new(FakeHistory::open());
        let service = ReportService::new(history.clone());
        let filter = query().to_history_filter(&ReportScope::Unrestricted).unwrap();

        let rows = service.aggregated(Grouping::Game, &filter).await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.round_count, 100);
        assert_eq!(row.wager, 1.0);
        assert_eq!(row.award, 0.95);
        assert_eq!(row.pfr_wager, 0.3);
        assert_eq!(row.pfr_award, 0.285);
        assert_eq!(row.pfr_round_count, 20);
        assert_eq!(row.revenue, 0.05);
        assert_eq!(row.pfr_revenue, 0.015);

        let calls = history.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.iter().filter(|f| f.is_pfr).count(), 1);
        assert!(calls.iter().all(|f| f.convert_currency == "usd"));
    }

    #[tokio::test]
    async fn test_spin_listing_in_display_units() {
        let service = ReportService::new(Arc::new(FakeHistory::open()));
        let filter = query().to_history_filter(&ReportScope::Unrestricted).unwrap();

        let page = service.spins(&filter).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].wager, 1.5);
        assert_eq!(page.items[1].revenue, -2.0);
    }

    #[tokio::test]
    async fn test_public_lookups_need_game_and_currency() {
        let service = ReportService::new(Arc::new(FakeHistory::open()));

        let err = service.public_spin("r-1", Some("Book"), None).await.unwrap_err();
        assert!(matches!(err, ReportError::Validation(ref f) if f[0].field == "currency"));

        let spin = service.public_spin("r-1", Some("Book"), Some("EUR")).await.unwrap();
        assert_eq!(spin.wager, 1.5);

        let err = service.public_spin("r-9", Some("Book"), Some("eur")).await.unwrap_err();
        assert!(matches!(err, ReportError::NotFound("Spin")));

        let err = service
            .public_session("sess-1", Some("Book"), Some("eur"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scope_follows_current_organization() {
        let directory = StaticGames::default();

        let root = session(None, true);
        assert_eq!(
            resolve_scope(&directory, &root).await.unwrap(),
            ReportScope::Unrestricted
        );

        let integrator = session(Some(organization(OrganizationType::Integrator)), false);
        assert_eq!(
            resolve_scope(&directory, &integrator).await.unwrap(),
            ReportScope::Integrator("acme".into())
        );

        let operator = session(Some(organization(OrganizationType::Operator)), false);
        assert_eq!(
            resolve_scope(&directory, &operator).await.unwrap(),
            ReportScope::Operator("acme".into())
        );

        let provider = organization(OrganizationType::Provider);
        let mut directory = StaticGames::default();
        directory
            .games
            .insert(provider.id, vec!["Book".into(), "Fruit".into()]);
        let scope = resolve_scope(&directory, &session(Some(provider), false))
            .await
            .unwrap();
        assert_eq!(scope, ReportScope::Provider(vec!["Book".into(), "Fruit".into()]));

        assert!(resolve_scope(&directory, &session(None, false)).await.is_err());
    }
}

#[cfg(test)]
mod export_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use auth::presentation::CurrentSession;
    use axum::extract::{Path, State};
    use axum::http::header;
    use gateway::HistoryFilter;
    use kernel::id::{FileId, SessionId};
    use kernel::response::ApiResponse;
    use tokio::sync::mpsc;

    use super::support::{FakeHistory, MemoryFiles, StaticGames, session};
    use crate::application::{ExportConfig, ExportEngine, ExportJob, ReportService};
    use crate::domain::file::{FileStatus, FileType};
    use crate::domain::filter::ReportQuery;
    use crate::domain::report::ReportKind;
    use crate::presentation::ReportAppState;
    use crate::presentation::handlers::{self, file_response};

    fn engine(history: Arc<FakeHistory>, files: Arc<MemoryFiles>) -> ExportEngine<MemoryFiles> {
        ExportEngine::new(
            files,
            ReportService::new(history),
            ExportConfig::default().with_workers(2),
        )
    }

    fn job(report: ReportKind, format: FileType) -> ExportJob {
        ExportJob {
            report,
            format,
            filter: HistoryFilter {
                convert_currency: "eur".into(),
                limit: 100,
                ..HistoryFilter::default()
            },
        }
    }

    async fn wait_terminal(files: &MemoryFiles, session: SessionId, id: FileId) -> FileStatus {
        for _ in 0..200 {
            match files.status(session, id) {
                Some(status) if status.is_terminal() => return status,
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        }
        panic!("export {id} never finished");
    }

    #[tokio::test]
    async fn test_xlsx_export_lifecycle() {
        let history = Arc::new(FakeHistory::gated(0));
        let files = Arc::new(MemoryFiles::default());
        let engine = engine(history.clone(), files.clone());
        let session = SessionId::new();

        let id = engine
            .submit(session, job(ReportKind::Financial, FileType::Xlsx))
            .await
            .unwrap();

        let pending = engine.file(session, id).await.unwrap();
        assert_eq!(pending.status, FileStatus::InProgress);
        assert!(!engine.status(session, id).await.unwrap().is_final());
        let stamp = pending
            .name
            .strip_prefix("financial_report-")
            .and_then(|rest| rest.strip_suffix(".xlsx"))
            .unwrap();
        assert_eq!(stamp.len(), 14);

        history.gate.add_permits(10);
        assert_eq!(wait_terminal(&files, session, id).await, FileStatus::Ready);

        let ready = engine.file(session, id).await.unwrap();
        let resp = file_response(&ready).unwrap();
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert_eq!(disposition, format!("attachment; filename=\"{}\"", ready.name));
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..2], b"PK");

        let export_filter = history.calls.lock().unwrap()[0].clone();
        assert_eq!(export_filter.limit, ExportConfig::default().row_limit);
        assert_eq!(export_filter.offset, 0);
    }

    #[tokio::test]
    async fn test_csv_export_renders_at_download() {
        let history = Arc::new(FakeHistory::open());
        let files = Arc::new(MemoryFiles::default());
        let engine = engine(history, files.clone());
        let session = SessionId::new();

        let id = engine
            .submit(session, job(ReportKind::Spins, FileType::Csv))
            .await
            .unwrap();
        assert_eq!(wait_terminal(&files, session, id).await, FileStatus::Ready);

        let resp = file_response(&engine.file(session, id).await.unwrap()).unwrap();
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("round_id,session_token,game_id,game,"));
        assert_eq!(lines.count(), 3);
    }

    #[tokio::test]
    async fn test_worker_error_is_stored_verbatim() {
        let files = Arc::new(MemoryFiles::default());
        let engine = engine(Arc::new(FakeHistory::failing()), files.clone());
        let session = SessionId::new();

        let id = engine
            .submit(session, job(ReportKind::Sessions, FileType::Csv))
            .await
            .unwrap();
        assert_eq!(wait_terminal(&files, session, id).await, FileStatus::Error);

        let frame = engine.status(session, id).await.unwrap();
        assert!(frame.is_final());
        assert_eq!(
            frame.error.as_deref(),
            Some("Malformed response from history: storage offline")
        );

        // not ready: the summary is served instead of an attachment
        let resp = file_response(&engine.file(session, id).await.unwrap()).unwrap();
        assert!(resp.headers().get(header::CONTENT_DISPOSITION).is_none());
    }

    #[tokio::test]
    async fn test_expired_record_discards_result() {
        let history = Arc::new(FakeHistory::gated(0));
        let files = Arc::new(MemoryFiles::default());
        let engine = engine(history.clone(), files.clone());
        let session = SessionId::new();

        let id = engine
            .submit(session, job(ReportKind::Spins, FileType::Xlsx))
            .await
            .unwrap();
        files.drop_all();
        history.gate.add_permits(10);

        for _ in 0..50 {
            let started = !history.calls.lock().unwrap().is_empty();
            if started && engine.available_workers() == engine.capacity() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(files.status(session, id).is_none());
        assert!(engine.file(session, id).await.is_err());
    }

    #[tokio::test]
    async fn test_files_are_listed_newest_first_per_session() {
        let files = Arc::new(MemoryFiles::default());
        let engine = engine(Arc::new(FakeHistory::gated(0)), files);
        let session = SessionId::new();

        let first = engine
            .submit(session, job(ReportKind::Spins, FileType::Csv))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = engine
            .submit(session, job(ReportKind::Financial, FileType::Csv))
            .await
            .unwrap();

        let listed = engine.files(session).await.unwrap();
        assert_eq!(
            listed.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![second, first]
        );
        assert!(engine.files(SessionId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_survives_session_refresh() {
        let history = Arc::new(FakeHistory::open());
        let files = Arc::new(MemoryFiles::default());
        let state = ReportAppState::new(
            engine(history.clone(), files.clone()),
            ReportService::new(history),
            StaticGames::default(),
        );
        let before = session(None, true);
        let query = ReportQuery {
            currency: Some("eur".into()),
            ..ReportQuery::default()
        };

        let ApiResponse::Ok { data, .. } = handlers::export(
            state.clone(),
            before.clone(),
            query,
            ReportKind::Spins,
            FileType::Csv,
        )
        .await
        .unwrap() else {
            panic!("export answered without a body");
        };

        // Refresh rotates the jti
        let after = before.rekey(SessionId::new(), before.account.clone(), before.expires_at);
        assert_ne!(after.id, before.id);
        assert_eq!(after.login_id, before.login_id);
        assert_eq!(wait_terminal(&files, after.login_id, data.id).await, FileStatus::Ready);

        let resp = handlers::get_file(
            State(state.clone()),
            CurrentSession(after.clone()),
            Path(data.id),
        )
        .await
        .unwrap();
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");

        let ApiResponse::Ok { data: listed, .. } =
            handlers::list_files(State(state), CurrentSession(after)).await.unwrap()
        else {
            panic!("listing answered without a body");
        };
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_status_frames_run_until_ready() {
        let history = Arc::new(FakeHistory::gated(0));
        let files = Arc::new(MemoryFiles::default());
        let engine = ExportEngine::new(
            files,
            ReportService::new(history.clone()),
            ExportConfig::default().with_poll_interval(Duration::from_millis(5)),
        );
        let session = SessionId::new();
        let id = engine
            .submit(session, job(ReportKind::Spins, FileType::Csv))
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        let watcher = engine.clone();
        tokio::spawn(async move { watcher.watch(session, id, tx).await });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.status, FileStatus::InProgress);
        assert_eq!(first.id, id);
        history.gate.add_permits(10);

        let mut frames = vec![first];
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }
        let (last, earlier) = frames.split_last().unwrap();
        assert_eq!(last.status, FileStatus::Ready);
        assert_eq!(last.error, None);
        assert!(earlier.iter().all(|f| f.status == FileStatus::InProgress));
    }

    #[tokio::test]
    async fn test_status_stream_ends_with_error_frame_when_record_vanishes() {
        let files = Arc::new(MemoryFiles::default());
        let engine = ExportEngine::new(
            files.clone(),
            ReportService::new(Arc::new(FakeHistory::gated(0))),
            ExportConfig::default().with_poll_interval(Duration::from_millis(5)),
        );
        let session = SessionId::new();
        let id = engine
            .submit(session, job(ReportKind::Spins, FileType::Csv))
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        let watcher = engine.clone();
        tokio::spawn(async move { watcher.watch(session, id, tx).await });

        assert_eq!(rx.recv().await.unwrap().status, FileStatus::InProgress);
        files.drop_all();

        let mut last = None;
        while let Some(frame) = rx.recv().await {
            last = Some(frame);
        }
        let last = last.unwrap();
        assert_eq!(last.status, FileStatus::Error);
        assert_eq!(last.error.as_deref(), Some("File not found"));
        assert!(last.is_final());
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::support::FakeHistory;
    use crate::application::ReportService;
    use crate::presentation::public_reports_router;

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = public_reports_router(ReportService::new(Arc::new(FakeHistory::open())));
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_public_spin_lookup() {
        let (status, body) = get("/public_reports/spins/r-1?game=Book&currency=eur").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["round_id"], "r-1");
        assert_eq!(body["data"]["wager"], 1.5);
    }

    #[tokio::test]
    async fn test_public_lookup_without_currency_is_422() {
        let (status, body) = get("/public_reports/spins/r-1?game=Book").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_public_session_is_404() {
        let (status, _) = get("/public_reports/sessions/nope?game=Book&currency=eur").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
