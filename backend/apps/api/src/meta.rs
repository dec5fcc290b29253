//! Service Endpoints
//!
//! `/health` and `/info` are public. `/debug` needs a session holding a root
//! role.

use std::time::{Duration, Instant};

use auth::domain::repository::SessionRepository;
use auth::presentation::{AuthGuard, CurrentSession, authenticated};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use kernel::error::app_error::{AppError, AppResult};
use kernel::response::{ApiResponse, Envelope};
use platform::kv::KvStore;
use reports::{ExportEngine, KvFileStore};
use serde::Serialize;
use sqlx::PgPool;

/// Which concrete backends were wired at startup
#[derive(Debug, Clone, Serialize)]
pub struct Wiring {
    pub kv_backend: &'static str,
    pub overlord: &'static str,
    pub mailer: &'static str,
}

#[derive(Clone)]
pub struct MetaState {
    pub pool: PgPool,
    pub kv: KvStore,
    pub engine: ExportEngine<KvFileStore>,
    pub wiring: Wiring,
    pub started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub name: &'static str,
    pub status: HealthStatus,
    pub message: String,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: Vec<ComponentHealth>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ExportPool {
    pub capacity: usize,
    pub available: usize,
    pub busy: usize,
    pub file_ttl_secs: u64,
    pub row_limit: i64,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub uptime_secs: u64,
    pub export: ExportPool,
    pub wiring: Wiring,
    pub db_pool_size: u32,
    pub db_pool_idle: usize,
}

/// Upper bound on one health probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

async fn probe<F, E>(name: &'static str, check: F) -> ComponentHealth
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let result = match tokio::time::timeout(PROBE_TIMEOUT, check).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("no answer within {}s", PROBE_TIMEOUT.as_secs())),
    };
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(()) => ComponentHealth {
            name,
            status: HealthStatus::Healthy,
            message: "ok".to_string(),
            duration_ms,
        },
        Err(message) => {
            tracing::error!(component = name, error = %message, "Health check failed");
            ComponentHealth {
                name,
                status: HealthStatus::Unhealthy,
                message,
                duration_ms,
            }
        }
    }
}

/// GET /api/health
///
/// 503 with the same body when any component is down.
pub async fn health(State(state): State<MetaState>) -> Response {
    let database = probe("database", async {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&state.pool)
            .await
            .map(|_| ())
    })
    .await;
    let store = probe(state.wiring.kv_backend, state.kv.ping()).await;

    let checks = vec![database, store];
    let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };
    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        code,
        Json(Envelope {
            status: code.as_u16(),
            success: status == HealthStatus::Healthy,
            meta: None,
            data: HealthResponse { status, checks },
        }),
    )
        .into_response()
}

/// GET /api/info
pub async fn info() -> ApiResponse<InfoResponse> {
    ApiResponse::ok(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/debug
pub async fn debug(
    State(state): State<MetaState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<ApiResponse<DebugResponse>> {
    if !session.account.has_root_role() {
        tracing::warn!(account_id = %session.account.id, "Debug snapshot refused");
        return Err(AppError::unauthorized("Root role required"));
    }

    let engine = &state.engine;
    let config = engine.config();
    let available = engine.available_workers();
    Ok(ApiResponse::ok(DebugResponse {
        uptime_secs: state.started_at.elapsed().as_secs(),
        export: ExportPool {
            capacity: engine.capacity(),
            available,
            busy: engine.capacity().saturating_sub(available),
            file_ttl_secs: config.file_ttl.as_secs(),
            row_limit: config.row_limit,
        },
        wiring: state.wiring.clone(),
        db_pool_size: state.pool.size(),
        db_pool_idle: state.pool.num_idle(),
    }))
}

pub fn meta_router<S>(state: MetaState, guard: AuthGuard<S>) -> Router
where
    S: SessionRepository + Send + Sync + 'static,
{
    let public = Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .with_state(state.clone());
    let root_only = authenticated(
        Router::new()
            .route("/debug", get(debug))
            .with_state(state),
        guard,
    );
    public.merge(root_only)
}
