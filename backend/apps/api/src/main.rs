//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;
mod meta;

use std::sync::Arc;
use std::time::Instant;

use auth::presentation::AuthAppState;
use auth::{KvSessionStore, PgAuthRepository, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use catalog::{CatalogAppState, PgCatalogRepository, catalog_router};
use gateway::{
    ExchangeClient, GrpcExchangeClient, GrpcHistoryClient, GrpcOverlord, HistoryClient, LogMailer,
    Mailer, MailgunMailer, Overlord, RecordingOverlord,
};
use platform::kv::KvStore;
use reports::{
    ExportEngine, KvFileStore, PgGameDirectory, ReportAppState, ReportService,
    public_reports_router, reports_router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{GatewayConfig, ServerConfig};
use crate::meta::{MetaState, Wiring, meta_router};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,catalog=info,reports=info,gateway=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let started_at = Instant::now();
    let server = ServerConfig::from_env()?;
    let gateways = GatewayConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(server.db_max_connections)
        .connect(&server.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Sessions, tokens and export records
    let kv = match &server.redis_url {
        Some(url) => KvStore::redis(url).await?,
        None => {
            tracing::warn!("REDIS_URL not set, sessions and exports stay in process memory");
            KvStore::memory()
        }
    };
    tracing::info!(backend = kv.backend_name(), "Key/value store ready");

    // Downstream services
    let history: Arc<dyn HistoryClient> = Arc::new(GrpcHistoryClient::connect_lazy(
        &gateways.history_url,
        gateways.timeout,
    )?);
    let exchange: Arc<dyn ExchangeClient> = Arc::new(GrpcExchangeClient::connect_lazy(
        &gateways.exchange_url,
        gateways.timeout,
    )?);
    let (overlord, overlord_kind): (Arc<dyn Overlord>, _) = match &gateways.overlord_url {
        Some(url) => (
            Arc::new(GrpcOverlord::connect_lazy(url, gateways.timeout)?),
            "grpc",
        ),
        None => {
            tracing::warn!("OVERLORD_GRPC_URL not set, configuration is recorded locally");
            (Arc::new(RecordingOverlord::new()), "recording")
        }
    };
    let (mailer, mailer_kind): (Arc<dyn Mailer>, _) = match gateways.mailgun.clone() {
        Some(mailgun) => (Arc::new(MailgunMailer::new(mailgun)), "mailgun"),
        None => {
            tracing::warn!("Mailgun not configured, outbound mail is only logged");
            (Arc::new(LogMailer), "log")
        }
    };

    // Auth
    let auth_state = AuthAppState::new(
        PgAuthRepository::new(pool.clone()),
        KvSessionStore::new(kv.clone()),
        mailer,
        config::auth_config()?,
    );
    let guard = auth_state.guard();

    // Catalog
    let catalog_state = CatalogAppState::new(
        PgCatalogRepository::new(pool.clone()),
        overlord,
        exchange,
        config::lobby_config(),
    );

    // Reports
    let export_config = config::export_config()?;
    tracing::info!(
        workers = export_config.workers,
        file_ttl_secs = export_config.file_ttl.as_secs(),
        "Export pool configured"
    );
    let report_service = ReportService::new(history);
    let engine = ExportEngine::new(
        Arc::new(KvFileStore::new(kv.clone())),
        report_service.clone(),
        export_config,
    );
    let report_state = ReportAppState::new(
        engine.clone(),
        report_service.clone(),
        PgGameDirectory::new(pool.clone()),
    );

    let meta_state = MetaState {
        pool: pool.clone(),
        kv: kv.clone(),
        engine,
        wiring: Wiring {
            kv_backend: kv.backend_name(),
            overlord: overlord_kind,
            mailer: mailer_kind,
        },
        started_at,
    };

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = server
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            http::HeaderName::from_static(auth::presentation::middleware::AUTH_HEADER),
        ]))
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true);

    // Build router
    let api = Router::new()
        .merge(auth_router(auth_state))
        .merge(catalog_router(catalog_state, guard.clone()))
        .merge(reports_router(report_state, guard.clone()))
        .merge(public_reports_router(report_service))
        .merge(meta_router(meta_state, guard));

    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", server.bind_addr);

    let listener = TcpListener::bind(server.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
