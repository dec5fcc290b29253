//! History service client
//!
//! Spin, gaming-session and aggregated views of game play. Monetary fields
//! are raw fixed-point integers (display value × 1000) in the currency
//! requested through `convert_currency`.

mod client;
mod proto;

pub use client::GrpcHistoryClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayResult;

/// Per-call filter forwarded to every history RPC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub integrator: Option<String>,
    pub operator: Option<String>,
    pub game: Option<String>,
    pub starting_from: Option<DateTime<Utc>>,
    pub ending_at: Option<DateTime<Utc>>,
    pub session_token: Option<String>,
    pub round_id: Option<String>,
    pub host: Option<String>,
    pub external_user_id: Option<String>,
    pub is_demo: Option<bool>,
    pub rtp_from: Option<f64>,
    pub convert_currency: String,
    pub games_whitelist: Vec<String>,
    /// Restrict to play-for-real traffic
    pub is_pfr: bool,
    pub group_by: Vec<String>,
    /// Time bucket for aggregated views (`day`, `week`, `month`)
    pub segment: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl HistoryFilter {
    pub fn pfr(&self) -> Self {
        Self {
            is_pfr: true,
            ..self.clone()
        }
    }
}

/// A page of history rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub round_id: String,
    pub session_token: String,
    pub game_id: String,
    pub game: String,
    pub integrator: String,
    pub operator: String,
    pub external_user_id: String,
    pub host: String,
    pub currency: String,
    pub wager: i64,
    pub award: i64,
    pub is_demo: bool,
    pub is_pfr: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamingSessionRecord {
    pub session_token: String,
    pub game_id: String,
    pub game: String,
    pub integrator: String,
    pub operator: String,
    pub external_user_id: String,
    pub currency: String,
    pub round_count: i64,
    pub wager: i64,
    pub award: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// One aggregated bucket; `game_id`/`game` or `country` is the grouping key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub game_id: String,
    pub game: String,
    pub country: String,
    pub currency: String,
    pub segment: String,
    pub user_count: i64,
    pub round_count: i64,
    pub wager: i64,
    pub award: i64,
}

/// Totals across everything the filter selects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub currency: String,
    pub user_count: i64,
    pub round_count: i64,
    pub wager: i64,
    pub award: i64,
}

#[async_trait]
pub trait HistoryClient: Send + Sync {
    async fn spins(&self, filter: &HistoryFilter) -> GatewayResult<Listing<SpinRecord>>;

    async fn spin(
        &self,
        round_id: &str,
        game: &str,
        currency: &str,
    ) -> GatewayResult<Option<SpinRecord>>;

    async fn gaming_sessions(
        &self,
        filter: &HistoryFilter,
    ) -> GatewayResult<Listing<GamingSessionRecord>>;

    async fn gaming_session(
        &self,
        session_token: &str,
        game: &str,
        currency: &str,
    ) -> GatewayResult<Option<GamingSessionRecord>>;

    async fn aggregated_by_game(&self, filter: &HistoryFilter)
    -> GatewayResult<Vec<AggregatedRecord>>;

    async fn aggregated_by_country(
        &self,
        filter: &HistoryFilter,
    ) -> GatewayResult<Vec<AggregatedRecord>>;

    async fn financial(&self, filter: &HistoryFilter) -> GatewayResult<FinancialRecord>;
}
