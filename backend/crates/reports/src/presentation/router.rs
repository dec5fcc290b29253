//! Report Routers
//!
//! Paths are relative to the `/api` nest done by the binary. Export routes
//! sit next to the `{segment}` routes; static segments win over the
//! parameter.

use auth::domain::repository::SessionRepository;
use auth::presentation::{AuthGuard, CurrentSession, protected};
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::{MethodRouter, get};

use crate::application::ReportService;
use crate::domain::file::FileType;
use crate::domain::filter::ReportQuery;
use crate::domain::report::ReportKind;
use crate::domain::repository::{FileRepository, GameDirectory};
use crate::presentation::handlers::{self, ReportAppState};

const EXPORTS: [(&str, ReportKind); 5] = [
    ("/reports/financial", ReportKind::Financial),
    ("/reports/spins", ReportKind::Spins),
    ("/reports/sessions", ReportKind::Sessions),
    ("/reports/aggregated/by_game", ReportKind::AggregatedByGame),
    ("/reports/aggregated/by_country", ReportKind::AggregatedByCountry),
];

fn export_route<F, D>(report: ReportKind, format: FileType) -> MethodRouter<ReportAppState<F, D>>
where
    F: FileRepository + Send + Sync + 'static,
    D: GameDirectory + Send + Sync + 'static,
{
    get(
        move |State(state): State<ReportAppState<F, D>>,
              CurrentSession(session): CurrentSession,
              Query(query): Query<ReportQuery>| async move {
            handlers::export(state, session, query, report, format).await
        },
    )
}

/// Reports, exports and files; authenticated and permission-checked
pub fn reports_router<F, D, S>(state: ReportAppState<F, D>, guard: AuthGuard<S>) -> Router
where
    F: FileRepository + Send + Sync + 'static,
    D: GameDirectory + Send + Sync + 'static,
    S: SessionRepository + Send + Sync + 'static,
{
    let mut router = Router::new()
        .route("/reports/financial", get(handlers::financial::<F, D>))
        .route("/reports/spins", get(handlers::spins::<F, D>))
        .route("/reports/sessions", get(handlers::sessions::<F, D>))
        .route(
            "/reports/aggregated/by_game",
            get(handlers::aggregated_by_game::<F, D>),
        )
        .route(
            "/reports/aggregated/by_game/{segment}",
            get(handlers::aggregated_by_game_segment::<F, D>),
        )
        .route(
            "/reports/aggregated/by_country",
            get(handlers::aggregated_by_country::<F, D>),
        )
        .route(
            "/reports/aggregated/by_country/{segment}",
            get(handlers::aggregated_by_country_segment::<F, D>),
        )
        .route("/files", get(handlers::list_files::<F, D>))
        .route("/files/{id}", get(handlers::get_file::<F, D>))
        .route("/files/ws/{id}", get(handlers::file_status_ws::<F, D>));

    for (path, report) in EXPORTS {
        for format in [FileType::Csv, FileType::Xlsx] {
            router = router.route(
                &format!("{}/{}", path, format.extension()),
                export_route::<F, D>(report, format),
            );
        }
    }

    protected(router.with_state(state), guard)
}

/// Spin and session lookup without authentication
pub fn public_reports_router(reports: ReportService) -> Router {
    Router::new()
        .route("/public_reports/spins/{id}", get(handlers::public_spin))
        .route("/public_reports/sessions/{id}", get(handlers::public_session))
        .with_state(reports)
}
