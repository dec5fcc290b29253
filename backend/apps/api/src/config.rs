//! Environment Configuration
//!
//! Every setting comes from the process environment (`.env` is loaded
//! first). Missing optional services fall back to in-process stand-ins so a
//! developer machine only needs Postgres.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use catalog::LobbyConfig;
use gateway::MailgunConfig;
use reports::ExportConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_HISTORY_URL: &str = "http://127.0.0.1:50051";
const DEFAULT_EXCHANGE_URL: &str = "http://127.0.0.1:50052";

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(key)
        .map(|v| v.parse::<T>().with_context(|| format!("{key} is invalid")))
        .transpose()
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    /// In-memory store when unset
    pub redis_url: Option<String>,
    pub frontend_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = optional("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bind_addr = optional("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is invalid")?;
        let frontend_origins = optional("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            database_url,
            db_max_connections: parsed("DATABASE_MAX_CONNECTIONS")?.unwrap_or(5),
            redis_url: optional("REDIS_URL"),
            frontend_origins,
        })
    }
}

/// Downstream services
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub history_url: String,
    pub exchange_url: String,
    /// Recorded in process when unset
    pub overlord_url: Option<String>,
    /// Mail is only logged when unset
    pub mailgun: Option<MailgunConfig>,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mailgun = match (optional("MAILGUN_DOMAIN"), optional("MAILGUN_API_KEY")) {
            (Some(domain), Some(api_key)) => Some(MailgunConfig {
                api_base: optional("MAILGUN_API_BASE")
                    .unwrap_or_else(|| "https://api.mailgun.net/v3".to_string()),
                sender: optional("MAILGUN_SENDER")
                    .unwrap_or_else(|| format!("Backoffice <noreply@{}>", domain)),
                domain,
                api_key,
            }),
            (None, None) => None,
            _ => bail!("MAILGUN_DOMAIN and MAILGUN_API_KEY must be set together"),
        };

        Ok(Self {
            history_url: optional("HISTORY_GRPC_URL")
                .unwrap_or_else(|| DEFAULT_HISTORY_URL.to_string()),
            exchange_url: optional("EXCHANGE_GRPC_URL")
                .unwrap_or_else(|| DEFAULT_EXCHANGE_URL.to_string()),
            overlord_url: optional("OVERLORD_GRPC_URL"),
            mailgun,
            timeout: Duration::from_secs(parsed("GRPC_TIMEOUT_SECS")?.unwrap_or(10)),
        })
    }
}

/// JWT secret is mandatory outside debug builds
pub fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = match optional("JWT_SECRET") {
        Some(secret) => AuthConfig {
            jwt_secret: secret.into_bytes(),
            ..AuthConfig::default()
        },
        None if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set, using a random development secret");
            AuthConfig::development()
        }
        None => bail!("JWT_SECRET must be set in production"),
    };
    if let Some(url) = optional("FRONTEND_URL") {
        config.frontend_url = url;
    }
    if let Some(sender) = optional("MAILGUN_SENDER") {
        config.mail_sender = sender;
    }
    Ok(config)
}

pub fn export_config() -> anyhow::Result<ExportConfig> {
    let mut config = if cfg!(debug_assertions) {
        ExportConfig::development()
    } else {
        ExportConfig::default()
    };
    if let Some(workers) = parsed::<usize>("EXPORT_WORKERS")? {
        config = config.with_workers(workers);
    }
    if let Some(secs) = parsed::<u64>("FILE_TTL_SECS")? {
        config = config.with_file_ttl(Duration::from_secs(secs));
    }
    Ok(config)
}

pub fn lobby_config() -> LobbyConfig {
    let config = if cfg!(debug_assertions) {
        LobbyConfig::development()
    } else {
        LobbyConfig::default()
    };
    match optional("LOBBY_DEFAULT_HOST") {
        Some(host) => config.with_default_host(host),
        None => config,
    }
}
