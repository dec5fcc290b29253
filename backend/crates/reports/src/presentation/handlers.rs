//! HTTP Handlers

use std::sync::Arc;

use auth::domain::entity::session::Session;
use auth::presentation::CurrentSession;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use gateway::HistoryFilter;
use kernel::id::{FileId, SessionId};
use kernel::response::ApiResponse;
use tokio::sync::mpsc;

use crate::application::{ExportEngine, ExportJob, ReportService, render_csv, resolve_scope};
use crate::domain::file::{ExportFile, FilePayload, FileStatus, FileSummary, FileType};
use crate::domain::filter::{ReportQuery, validate_segment};
use crate::domain::report::{
    AggregatedReport, FinancialReport, GamingSessionReport, Grouping, ReportKind, SpinReport,
};
use crate::domain::repository::{FileRepository, GameDirectory};
use crate::error::ReportResult;
use crate::presentation::dto::{FileIdResponse, PublicReportQuery};

/// Shared state for report handlers
pub struct ReportAppState<F, D> {
    pub engine: ExportEngine<F>,
    pub reports: ReportService,
    pub directory: Arc<D>,
}

impl<F, D> Clone for ReportAppState<F, D> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            reports: self.reports.clone(),
            directory: self.directory.clone(),
        }
    }
}

impl<F, D> ReportAppState<F, D> {
    pub fn new(engine: ExportEngine<F>, reports: ReportService, directory: D) -> Self {
        Self {
            engine,
            reports,
            directory: Arc::new(directory),
        }
    }
}

/// Scoped history filter; the session currency stands in for a missing one
async fn filter_for<F, D: GameDirectory>(
    state: &ReportAppState<F, D>,
    session: &Session,
    mut query: ReportQuery,
) -> ReportResult<HistoryFilter> {
    if query.currency.is_none() {
        query.currency = session.currency.clone();
    }
    let scope = resolve_scope(state.directory.as_ref(), session).await?;
    query.to_history_filter(&scope)
}

// ============================================================================
// Reports
// ============================================================================

/// GET /api/reports/financial
pub async fn financial<F, D: GameDirectory>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ReportQuery>,
) -> ReportResult<ApiResponse<FinancialReport>> {
    let filter = filter_for(&state, &session, query).await?;
    Ok(ApiResponse::ok(state.reports.financial(&filter).await?))
}

/// GET /api/reports/spins
pub async fn spins<F, D: GameDirectory>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ReportQuery>,
) -> ReportResult<ApiResponse<Vec<SpinReport>>> {
    let filter = filter_for(&state, &session, query).await?;
    Ok(ApiResponse::paged(state.reports.spins(&filter).await?))
}

/// GET /api/reports/sessions
pub async fn sessions<F, D: GameDirectory>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ReportQuery>,
) -> ReportResult<ApiResponse<Vec<GamingSessionReport>>> {
    let filter = filter_for(&state, &session, query).await?;
    Ok(ApiResponse::paged(state.reports.sessions(&filter).await?))
}

async fn aggregated<F, D: GameDirectory>(
    state: ReportAppState<F, D>,
    session: Session,
    query: ReportQuery,
    grouping: Grouping,
    segment: Option<String>,
) -> ReportResult<ApiResponse<Vec<AggregatedReport>>> {
    let mut filter = filter_for(&state, &session, query).await?;
    filter.segment = segment.as_deref().map(validate_segment).transpose()?;
    Ok(ApiResponse::ok(
        state.reports.aggregated(grouping, &filter).await?,
    ))
}

/// GET /api/reports/aggregated/by_game
pub async fn aggregated_by_game<F, D: GameDirectory>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ReportQuery>,
) -> ReportResult<ApiResponse<Vec<AggregatedReport>>> {
    aggregated(state, session, query, Grouping::Game, None).await
}

/// GET /api/reports/aggregated/by_game/{segment}
pub async fn aggregated_by_game_segment<F, D: GameDirectory>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Path(segment): Path<String>,
    Query(query): Query<ReportQuery>,
) -> ReportResult<ApiResponse<Vec<AggregatedReport>>> {
    aggregated(state, session, query, Grouping::Game, Some(segment)).await
}

/// GET /api/reports/aggregated/by_country
pub async fn aggregated_by_country<F, D: GameDirectory>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ReportQuery>,
) -> ReportResult<ApiResponse<Vec<AggregatedReport>>> {
    aggregated(state, session, query, Grouping::Country, None).await
}

/// GET /api/reports/aggregated/by_country/{segment}
pub async fn aggregated_by_country_segment<F, D: GameDirectory>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Path(segment): Path<String>,
    Query(query): Query<ReportQuery>,
) -> ReportResult<ApiResponse<Vec<AggregatedReport>>> {
    aggregated(state, session, query, Grouping::Country, Some(segment)).await
}

/// GET /api/reports/{report}/{csv,xlsx}
///
/// Returns the job id at once; the file shows up under `/files`.
pub async fn export<F, D>(
    state: ReportAppState<F, D>,
    session: Session,
    query: ReportQuery,
    report: ReportKind,
    format: FileType,
) -> ReportResult<ApiResponse<FileIdResponse>>
where
    F: FileRepository + Send + Sync + 'static,
    D: GameDirectory,
{
    let filter = filter_for(&state, &session, query).await?;
    let id = state
        .engine
        .submit(
            session.login_id,
            ExportJob {
                report,
                format,
                filter,
            },
        )
        .await?;
    Ok(ApiResponse::ok(FileIdResponse { id }))
}

// ============================================================================
// Files
// ============================================================================

/// GET /api/files
pub async fn list_files<F, D>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
) -> ReportResult<ApiResponse<Vec<FileSummary>>>
where
    F: FileRepository + Send + Sync + 'static,
{
    Ok(ApiResponse::ok(state.engine.files(session.login_id).await?))
}

/// GET /api/files/{id}
///
/// The artifact once ready, the status summary otherwise.
pub async fn get_file<F, D>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<FileId>,
) -> ReportResult<Response>
where
    F: FileRepository + Send + Sync + 'static,
{
    let file = state.engine.file(session.login_id, id).await?;
    file_response(&file)
}

pub fn file_response(file: &ExportFile) -> ReportResult<Response> {
    let body = match (&file.status, &file.payload) {
        (FileStatus::Ready, Some(FilePayload::Csv { rows })) => render_csv(rows)?,
        (FileStatus::Ready, Some(FilePayload::Xlsx { data })) => data.clone(),
        _ => return Ok(ApiResponse::ok(FileSummary::from(file)).into_response()),
    };
    let disposition = format!("attachment; filename=\"{}\"", file.name);
    Ok((
        [
            (
                header::CONTENT_TYPE,
                file.file_type.content_type().to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// GET /api/files/ws/{id}
///
/// Pushes `{id, status, error}` every poll interval and closes once the
/// status is terminal. A record that vanishes mid-stream ends with an
/// `error` frame. Inbound frames are ignored.
pub async fn file_status_ws<F, D>(
    State(state): State<ReportAppState<F, D>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<FileId>,
    ws: WebSocketUpgrade,
) -> ReportResult<Response>
where
    F: FileRepository + Send + Sync + 'static,
{
    // unknown jobs are a plain 404, not an upgraded socket
    state.engine.file(session.login_id, id).await?;
    let engine = state.engine.clone();
    Ok(ws.on_upgrade(move |socket| stream_status(engine, session.login_id, id, socket)))
}

async fn stream_status<F>(
    engine: ExportEngine<F>,
    session: SessionId,
    id: FileId,
    mut socket: WebSocket,
) where
    F: FileRepository + Send + Sync + 'static,
{
    let (tx, mut rx) = mpsc::channel(1);
    tokio::spawn(async move { engine.watch(session, id, tx).await });

    while let Some(frame) = rx.recv().await {
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(file_id = %id, error = %e, "Status frame encoding failed");
                break;
            }
        };
        if socket.send(Message::Text(text.into())).await.is_err() {
            tracing::debug!(file_id = %id, "Status subscriber went away");
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

// ============================================================================
// Public reports
// ============================================================================

/// GET /api/public_reports/spins/{id}?game=&currency=
pub async fn public_spin(
    State(reports): State<ReportService>,
    Path(round_id): Path<String>,
    Query(query): Query<PublicReportQuery>,
) -> ReportResult<ApiResponse<SpinReport>> {
    let spin = reports
        .public_spin(&round_id, query.game.as_deref(), query.currency.as_deref())
        .await?;
    Ok(ApiResponse::ok(spin))
}

/// GET /api/public_reports/sessions/{id}?game=&currency=
pub async fn public_session(
    State(reports): State<ReportService>,
    Path(session_token): Path<String>,
    Query(query): Query<PublicReportQuery>,
) -> ReportResult<ApiResponse<GamingSessionReport>> {
    let session = reports
        .public_session(
            &session_token,
            query.game.as_deref(),
            query.currency.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(session))
}
